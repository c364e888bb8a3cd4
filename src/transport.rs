// Transport collaborator - tempo, musical position, and audio clock readings
// Thread-safe via atomics for communication with the audio callback

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

/// Read access to the transport/tempo collaborator
///
/// `current_step` and `audio_clock` return `None` when the corresponding
/// source is not live (transport stopped, audio device not yet running); the
/// clock reconciler falls back accordingly. The loop-enable accessors exist
/// so loop-mode recording can temporarily override loop playback and restore
/// it at stop.
pub trait TimeSource {
    /// Current tempo in BPM
    fn current_tempo(&self) -> f64;

    /// Current musical position in steps, if the transport is running
    fn current_step(&self) -> Option<f64>;

    /// Monotonic audio-clock reading in seconds, if an audio device is live
    fn audio_clock(&self) -> Option<f64>;

    /// Whether loop playback is enabled
    fn is_loop_enabled(&self) -> bool;

    /// Enable/disable loop playback
    fn set_loop_enabled(&self, enabled: bool);
}

impl<T: TimeSource + ?Sized> TimeSource for Arc<T> {
    fn current_tempo(&self) -> f64 {
        (**self).current_tempo()
    }

    fn current_step(&self) -> Option<f64> {
        (**self).current_step()
    }

    fn audio_clock(&self) -> Option<f64> {
        (**self).audio_clock()
    }

    fn is_loop_enabled(&self) -> bool {
        (**self).is_loop_enabled()
    }

    fn set_loop_enabled(&self, enabled: bool) {
        (**self).set_loop_enabled(enabled)
    }
}

/// Shared transport state
///
/// f64 readings are stored as raw bits in `AtomicU64` so the audio callback
/// can publish them without locks and the UI thread can read them at any
/// time.
#[derive(Debug)]
pub struct SharedTransport {
    tempo_bits: AtomicU64,
    step_bits: AtomicU64,
    has_step: AtomicBool,
    audio_seconds_bits: AtomicU64,
    has_audio_clock: AtomicBool,
    loop_enabled: AtomicBool,
}

fn store_f64(cell: &AtomicU64, value: f64) {
    cell.store(value.to_bits(), Ordering::Relaxed);
}

fn load_f64(cell: &AtomicU64) -> f64 {
    f64::from_bits(cell.load(Ordering::Relaxed))
}

impl SharedTransport {
    /// Create new shared transport state at the given tempo
    pub fn new(bpm: f64) -> Arc<Self> {
        Arc::new(Self {
            tempo_bits: AtomicU64::new(bpm.to_bits()),
            step_bits: AtomicU64::new(0f64.to_bits()),
            has_step: AtomicBool::new(false),
            audio_seconds_bits: AtomicU64::new(0f64.to_bits()),
            has_audio_clock: AtomicBool::new(false),
            loop_enabled: AtomicBool::new(false),
        })
    }

    /// Set tempo in BPM
    pub fn set_tempo(&self, bpm: f64) {
        store_f64(&self.tempo_bits, bpm);
    }

    /// Publish the transport's musical position (called while playing)
    pub fn set_step(&self, step: f64) {
        store_f64(&self.step_bits, step);
        self.has_step.store(true, Ordering::Relaxed);
    }

    /// Mark the musical position as unavailable (transport stopped)
    pub fn clear_step(&self) {
        self.has_step.store(false, Ordering::Relaxed);
    }

    /// Publish the audio clock (called from the audio callback)
    pub fn set_audio_clock(&self, seconds: f64) {
        store_f64(&self.audio_seconds_bits, seconds);
        self.has_audio_clock.store(true, Ordering::Relaxed);
    }

    /// Mark the audio clock as unavailable (device torn down)
    pub fn clear_audio_clock(&self) {
        self.has_audio_clock.store(false, Ordering::Relaxed);
    }
}

impl TimeSource for SharedTransport {
    fn current_tempo(&self) -> f64 {
        load_f64(&self.tempo_bits)
    }

    fn current_step(&self) -> Option<f64> {
        if self.has_step.load(Ordering::Relaxed) {
            Some(load_f64(&self.step_bits))
        } else {
            None
        }
    }

    fn audio_clock(&self) -> Option<f64> {
        if self.has_audio_clock.load(Ordering::Relaxed) {
            Some(load_f64(&self.audio_seconds_bits))
        } else {
            None
        }
    }

    fn is_loop_enabled(&self) -> bool {
        self.loop_enabled.load(Ordering::Relaxed)
    }

    fn set_loop_enabled(&self, enabled: bool) {
        self.loop_enabled.store(enabled, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_transport_has_no_readings() {
        let transport = SharedTransport::new(120.0);

        assert_eq!(transport.current_tempo(), 120.0);
        assert_eq!(transport.current_step(), None);
        assert_eq!(transport.audio_clock(), None);
        assert!(!transport.is_loop_enabled());
    }

    #[test]
    fn test_publish_and_clear_readings() {
        let transport = SharedTransport::new(120.0);

        transport.set_step(16.5);
        assert_eq!(transport.current_step(), Some(16.5));
        transport.clear_step();
        assert_eq!(transport.current_step(), None);

        transport.set_audio_clock(1.25);
        assert_eq!(transport.audio_clock(), Some(1.25));
        transport.clear_audio_clock();
        assert_eq!(transport.audio_clock(), None);
    }

    #[test]
    fn test_tempo_update() {
        let transport = SharedTransport::new(120.0);
        transport.set_tempo(140.0);
        assert_eq!(transport.current_tempo(), 140.0);
    }

    #[test]
    fn test_loop_flag() {
        let transport = SharedTransport::new(120.0);

        transport.set_loop_enabled(true);
        assert!(transport.is_loop_enabled());
        transport.set_loop_enabled(false);
        assert!(!transport.is_loop_enabled());
    }

    #[test]
    fn test_arc_delegation() {
        let transport = SharedTransport::new(120.0);
        transport.set_audio_clock(2.0);

        // The Arc blanket impl forwards to the inner transport
        fn reads<T: TimeSource>(t: &T) -> Option<f64> {
            t.audio_clock()
        }
        assert_eq!(reads(&transport), Some(2.0));
    }
}
