// live_capture - real-time note capture engine for a pattern-based workstation
//
// Converts a live stream of performance events into quantized, timestamped
// note records inside a musical pattern while the transport is playing.

pub mod capture;
pub mod clock;
pub mod error;
pub mod event;
pub mod feedback;
pub mod messaging;
pub mod metronome;
pub mod note;
pub mod pattern;
pub mod quantize;
pub mod session;
pub mod timeline;
pub mod transport;

// Re-export commonly used types for convenience
pub use capture::{NoteCapture, PendingNote};
pub use clock::{ClockSourceKind, StepClock, StepReading};
pub use error::CaptureError;
pub use event::{DeviceEvent, TimedDeviceEvent};
pub use feedback::FeedbackTicker;
pub use messaging::channels::{create_event_channel, create_notification_channel};
pub use messaging::notification::{Notification, NotificationCategory, NotificationLevel};
pub use metronome::{ClickType, CountInScheduler};
pub use note::{NoteId, RecordedNote, generate_note_id};
pub use pattern::{InstrumentId, Pattern, PatternBank, PatternId, PatternStore, PatternStoreError};
pub use quantize::{quantize, snap};
pub use session::{
    LoopRegion, RecordMode, Recorder, RecorderState, SessionConfig, SessionSummary, Target,
};
pub use timeline::{DEFAULT_STEPS_PER_BEAT, Tempo, TimeSignature};
pub use transport::{SharedTransport, TimeSource};
