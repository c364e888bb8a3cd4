// Live feedback ticker - rate limiter for the growing-note refresh
//
// Purely cosmetic: while keys are held, the session controller rewrites the
// preview notes' lengths so the UI shows them growing. This ticker just
// decides when a refresh is due; it never touches notes itself.

use std::time::{Duration, Instant};

/// Default refresh cadence: 20 Hz is smooth enough for a piano-roll preview
pub const DEFAULT_FEEDBACK_INTERVAL: Duration = Duration::from_millis(50);

/// Rate limiter driven from the cooperative poll loop
#[derive(Debug, Clone)]
pub struct FeedbackTicker {
    interval: Duration,
    last_tick: Option<Instant>,
}

impl FeedbackTicker {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_tick: None,
        }
    }

    /// Returns true when a refresh is due at `now`, and arms the next tick.
    /// The first call after creation is always due.
    pub fn due(&mut self, now: Instant) -> bool {
        match self.last_tick {
            Some(last) if now.duration_since(last) < self.interval => false,
            _ => {
                self.last_tick = Some(now);
                true
            }
        }
    }

    /// Forget the last tick so the next `due` fires immediately
    pub fn reset(&mut self) {
        self.last_tick = None;
    }
}

impl Default for FeedbackTicker {
    fn default() -> Self {
        Self::new(DEFAULT_FEEDBACK_INTERVAL)
    }
}
