// Clock reconciler - produces one authoritative step position for "now"
//
// Three time sources may be live at any moment: the monotonic audio clock,
// the transport's musical position, and the process wall clock. The audio
// clock wins because it is monotonic and free of the scheduling jitter that
// affects a transport-position readout.

use crate::timeline::Tempo;
use std::time::Instant;

/// Which time source produced a step reading
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockSourceKind {
    AudioClock,
    TransportPosition,
    WallClock,
}

/// A reconciled step position
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepReading {
    pub step: f64,
    pub source: ClockSourceKind,
    /// True when the raw value was negative or non-finite and was clamped to 0
    pub clamped: bool,
}

/// Converts elapsed real time into musical step position using the tempo
/// captured at recording start.
///
/// The tempo and start position are fixed for the clock's lifetime, so a live
/// transport tempo change never retroactively moves already-computed
/// positions.
#[derive(Debug, Clone)]
pub struct StepClock {
    start_step: f64,
    start_audio_time: Option<f64>,
    tempo: Tempo,
    steps_per_beat: u32,
    wall_start: Instant,
}

impl StepClock {
    pub fn new(
        start_step: f64,
        start_audio_time: Option<f64>,
        tempo: Tempo,
        steps_per_beat: u32,
    ) -> Self {
        assert!(steps_per_beat > 0, "steps_per_beat must be > 0");
        Self {
            start_step,
            start_audio_time,
            tempo,
            steps_per_beat,
            wall_start: Instant::now(),
        }
    }

    /// Session start step
    pub fn start_step(&self) -> f64 {
        self.start_step
    }

    /// Tempo captured at session start
    pub fn tempo(&self) -> Tempo {
        self.tempo
    }

    /// Convert an elapsed duration in seconds to steps at the captured tempo
    pub fn seconds_to_steps(&self, seconds: f64) -> f64 {
        self.tempo.seconds_to_steps(seconds, self.steps_per_beat)
    }

    /// Reconcile the available time sources into a single step position.
    ///
    /// `audio_now` and `transport_step` are the current readings of the audio
    /// clock and the transport position (either may be unavailable). Falls
    /// back to wall-clock elapsed time when neither is live. Never panics and
    /// always returns a finite, non-negative step.
    pub fn current_step(&self, audio_now: Option<f64>, transport_step: Option<f64>) -> StepReading {
        if let (Some(now), Some(start)) = (audio_now, self.start_audio_time) {
            let step = self.start_step + self.seconds_to_steps(now - start);
            return Self::sanitize(step, ClockSourceKind::AudioClock);
        }

        if let Some(step) = transport_step {
            return Self::sanitize(step, ClockSourceKind::TransportPosition);
        }

        let elapsed = self.wall_start.elapsed().as_secs_f64();
        let step = self.start_step + self.seconds_to_steps(elapsed);
        Self::sanitize(step, ClockSourceKind::WallClock)
    }

    fn sanitize(step: f64, source: ClockSourceKind) -> StepReading {
        if step.is_finite() && step >= 0.0 {
            StepReading {
                step,
                source,
                clamped: false,
            }
        } else {
            StepReading {
                step: 0.0,
                source,
                clamped: true,
            }
        }
    }
}
