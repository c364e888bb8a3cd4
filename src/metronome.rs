// Count-in metronome scheduler
// Detects beat crossings during the count-in window so the host can sound a
// click; the accent lands on each bar's downbeat

use crate::timeline::{Tempo, TimeSignature};

/// Metronome click type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickType {
    /// Click on first beat of bar (accent/downbeat)
    Accent,
    /// Click on other beats
    Regular,
}

/// Schedules count-in clicks over elapsed seconds
///
/// Created when a session with `count_in_bars > 0` starts and dropped when
/// the count-in elapses or the session is cancelled. `poll` reports at most
/// one click per call; hosts poll faster than the beat rate (the same 50 ms
/// cadence as the live feedback loop is plenty up to 999 BPM).
#[derive(Debug, Clone)]
pub struct CountInScheduler {
    beat_duration: f64,
    beats_per_bar: u32,
    total_beats: u32,
    next_beat: u32,
}

impl CountInScheduler {
    /// Create a scheduler for `bars` bars at the session tempo
    pub fn new(bars: u32, tempo: Tempo, time_signature: TimeSignature) -> Self {
        assert!(bars > 0, "count-in must cover at least one bar");

        let beats_per_bar = time_signature.numerator as u32;
        Self {
            beat_duration: tempo.beat_duration_seconds(),
            beats_per_bar,
            total_beats: bars * beats_per_bar,
            next_beat: 0,
        }
    }

    /// Total count-in duration in seconds
    pub fn total_seconds(&self) -> f64 {
        self.total_beats as f64 * self.beat_duration
    }

    /// Whether the count-in window has fully elapsed
    pub fn finished(&self, elapsed_seconds: f64) -> bool {
        elapsed_seconds >= self.total_seconds()
    }

    /// Report the next due click, if the elapsed time has crossed its beat
    pub fn poll(&mut self, elapsed_seconds: f64) -> Option<ClickType> {
        if self.next_beat >= self.total_beats {
            return None;
        }

        let due_at = self.next_beat as f64 * self.beat_duration;
        if elapsed_seconds < due_at {
            return None;
        }

        let click = if self.next_beat % self.beats_per_bar == 0 {
            ClickType::Accent
        } else {
            ClickType::Regular
        };
        self.next_beat += 1;

        Some(click)
    }
}
