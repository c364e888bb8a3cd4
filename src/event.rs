// Device events - decoded performance events delivered by the device layer

/// A decoded controller event
///
/// Raw message parsing happens upstream; by the time an event reaches the
/// capture engine it is already decoded. Events the engine does not care
/// about arrive as `Other` and are ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceEvent {
    NoteOn { pitch: u8, velocity: u8 },
    NoteOff { pitch: u8 },
    Other,
}

/// Device event with its delivery timestamp
///
/// `audio_time` is the audio-clock reading (in seconds) taken when the event
/// was delivered, when the device layer had one available. Events without a
/// timestamp are positioned using the engine's own clock reconciliation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimedDeviceEvent {
    pub event: DeviceEvent,
    pub audio_time: Option<f64>,
}

impl TimedDeviceEvent {
    pub fn new(event: DeviceEvent, audio_time: Option<f64>) -> Self {
        Self { event, audio_time }
    }
}
