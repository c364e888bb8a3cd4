// Note capture state machine
// Owns the pending-note table (keys currently held) and the finalized notes
// of the in-progress session. Pure state: the session controller performs
// all pattern-store writes.

use crate::clock::StepClock;
use crate::note::{MIN_NOTE_STEPS, NoteId, RecordedNote, generate_note_id};
use crate::quantize::quantize;
use std::collections::HashMap;

/// A note whose start has been captured but whose release has not yet arrived
///
/// `start_audio_time` is kept alongside the step position so the final length
/// can be derived from the audio clock, independent of step-based jitter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PendingNote {
    pub note_id: NoteId,
    pub pitch: u8,
    pub velocity: u8,
    pub start_step: f64,
    pub start_audio_time: Option<f64>,
}

/// Per-pitch capture state for one recording session
///
/// Invariants: at most one pending note per pitch; a pitch moves from the
/// pending table to the finalized table exactly once per hold; finalized
/// lengths are always >= 1 step.
#[derive(Debug)]
pub struct NoteCapture {
    pending: HashMap<u8, PendingNote>,
    finalized: Vec<RecordedNote>,
    quantize_strength: f64,
    grid_steps: f64,
    clock: StepClock,
}

impl NoteCapture {
    pub fn new(quantize_strength: f64, grid_steps: f64, clock: StepClock) -> Self {
        Self {
            pending: HashMap::new(),
            finalized: Vec::new(),
            quantize_strength: quantize_strength.clamp(0.0, 1.0),
            grid_steps,
            clock,
        }
    }

    /// Begin a hold for `pitch`
    ///
    /// Returns the new pending note, or `None` when a pending note for the
    /// pitch already exists (duplicate down-events from flaky controllers) or
    /// the pitch/velocity is out of MIDI range.
    pub fn begin(
        &mut self,
        pitch: u8,
        velocity: u8,
        raw_step: f64,
        audio_time: Option<f64>,
    ) -> Option<PendingNote> {
        if pitch > 127 || velocity > 127 {
            return None;
        }
        if self.pending.contains_key(&pitch) {
            return None;
        }

        let pending = PendingNote {
            note_id: generate_note_id(),
            pitch,
            velocity,
            start_step: quantize(raw_step, self.quantize_strength, self.grid_steps),
            start_audio_time: audio_time,
        };
        self.pending.insert(pitch, pending);

        Some(pending)
    }

    /// Complete the hold for `pitch`
    ///
    /// Returns `None` when no pending note exists - the expected outcome for
    /// a key that was already down before recording started. The returned
    /// note is not yet in the finalized table; the caller commits it after
    /// the pattern store accepted it.
    pub fn complete(
        &mut self,
        pitch: u8,
        raw_step: f64,
        audio_time: Option<f64>,
    ) -> Option<RecordedNote> {
        let pending = self.pending.remove(&pitch)?;
        Some(self.build_note(&pending, raw_step, audio_time))
    }

    /// Finalize every remaining pending note against the stop-time position.
    /// Guarantees no held note is lost when its release never arrives.
    pub fn finalize_hanging(
        &mut self,
        current_step: f64,
        audio_time: Option<f64>,
    ) -> Vec<RecordedNote> {
        let pending = std::mem::take(&mut self.pending);

        let mut notes: Vec<RecordedNote> = pending
            .into_values()
            .map(|p| self.build_note(&p, current_step, audio_time))
            .collect();
        notes.sort_by(|a, b| a.start_step.total_cmp(&b.start_step));

        notes
    }

    /// Record a successfully stored note into the finalized table
    pub fn commit(&mut self, note: RecordedNote) {
        self.finalized.push(note);
    }

    /// Current length a pending note should display, >= 1 step
    pub fn preview_length(
        &self,
        pending: &PendingNote,
        current_step: f64,
        audio_time: Option<f64>,
    ) -> f64 {
        self.length_steps(pending, current_step, audio_time)
    }

    /// Pending notes, read-only (UI and feedback loop go through here)
    pub fn pending(&self) -> impl Iterator<Item = &PendingNote> {
        self.pending.values()
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub fn is_pending(&self, pitch: u8) -> bool {
        self.pending.contains_key(&pitch)
    }

    /// Notes finalized so far in this session
    pub fn finalized(&self) -> &[RecordedNote] {
        &self.finalized
    }

    fn build_note(
        &self,
        pending: &PendingNote,
        end_step: f64,
        audio_time: Option<f64>,
    ) -> RecordedNote {
        RecordedNote::new(
            pending.note_id,
            pending.pitch,
            pending.velocity,
            pending.start_step,
            self.length_steps(pending, end_step, audio_time),
        )
    }

    // Authoritative length formula: audio-clock delta converted to steps.
    // The step difference is the fallback when either end of the hold had no
    // live audio clock. max() also absorbs NaN from a poisoned reading.
    fn length_steps(&self, pending: &PendingNote, end_step: f64, audio_time: Option<f64>) -> f64 {
        let raw = match (pending.start_audio_time, audio_time) {
            (Some(start), Some(end)) => self.clock.seconds_to_steps(end - start),
            _ => end_step - pending.start_step,
        };

        raw.max(MIN_NOTE_STEPS)
    }
}
