// Caller-facing errors for the capture engine

/// Errors returned by `Recorder::start` / `Recorder::stop`
///
/// These are caller errors: the recorder state is never mutated when one is
/// returned. Everything that can go wrong during an active session is handled
/// locally and surfaced as a notification instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum CaptureError {
    #[error("a recording session is already in progress")]
    AlreadyRecording,

    #[error("no recording session in progress")]
    NotRecording,

    #[error("loop mode requires a loop region")]
    MissingLoopRegion,
}
