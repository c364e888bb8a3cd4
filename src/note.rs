// Note representation for the capture engine
// A recorded note is the immutable result of a completed pitch hold

use std::sync::atomic::{AtomicU64, Ordering};

/// Unique identifier for notes
pub type NoteId = u64;

/// Minimum note length: one step (a sixteenth note at the default grid)
pub const MIN_NOTE_STEPS: f64 = 1.0;

/// Global note ID generator (atomic for thread-safety)
static NEXT_NOTE_ID: AtomicU64 = AtomicU64::new(1);

/// Generate a unique note ID
pub fn generate_note_id() -> NoteId {
    NEXT_NOTE_ID.fetch_add(1, Ordering::Relaxed)
}

/// A recorded note inside a pattern
///
/// Positions and lengths are expressed in steps, the smallest grid unit of
/// the pattern store. Length is never below one step.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct RecordedNote {
    /// Unique identifier for this note
    pub id: NoteId,

    /// MIDI note number (0-127, where 60 = C4)
    pub pitch: u8,

    /// MIDI velocity (0-127, where 127 = maximum)
    pub velocity: u8,

    /// Start position in steps
    pub start_step: f64,

    /// Length in steps, always >= 1
    pub length_steps: f64,

    /// Muted notes stay in the pattern but are skipped by playback
    pub muted: bool,
}

impl RecordedNote {
    /// Creates a new note
    pub fn new(id: NoteId, pitch: u8, velocity: u8, start_step: f64, length_steps: f64) -> Self {
        assert!(pitch <= 127, "MIDI pitch must be 0-127");
        assert!(velocity <= 127, "MIDI velocity must be 0-127");
        assert!(
            length_steps >= MIN_NOTE_STEPS,
            "Note length must be at least one step"
        );

        Self {
            id,
            pitch,
            velocity,
            start_step,
            length_steps,
            muted: false,
        }
    }

    /// Get the end position of this note (exclusive, in steps)
    pub fn end_step(&self) -> f64 {
        self.start_step + self.length_steps
    }

    /// Check if this note overlaps the half-open range [start, end)
    pub fn overlaps(&self, start_step: f64, end_step: f64) -> bool {
        self.start_step < end_step && self.end_step() > start_step
    }

    /// Get the note name (e.g., "C4", "A#5")
    pub fn note_name(&self) -> String {
        const NOTE_NAMES: [&str; 12] = [
            "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
        ];

        let octave = (self.pitch / 12) as i32 - 1;
        let note_index = (self.pitch % 12) as usize;

        format!("{}{}", NOTE_NAMES[note_index], octave)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_note_creation() {
        let note = RecordedNote::new(1, 60, 100, 4.0, 2.0);

        assert_eq!(note.id, 1);
        assert_eq!(note.pitch, 60);
        assert_eq!(note.velocity, 100);
        assert_eq!(note.start_step, 4.0);
        assert_eq!(note.length_steps, 2.0);
        assert!(!note.muted);
    }

    #[test]
    fn test_note_end_step() {
        let note = RecordedNote::new(1, 60, 100, 2.0, 4.0);
        assert_eq!(note.end_step(), 6.0);
    }

    #[test]
    fn test_note_overlaps() {
        let note = RecordedNote::new(1, 60, 100, 2.0, 4.0); // [2, 6)

        assert!(note.overlaps(0.0, 3.0));
        assert!(note.overlaps(5.0, 10.0));
        assert!(note.overlaps(0.0, 16.0));
        assert!(!note.overlaps(6.0, 10.0)); // end is exclusive
        assert!(!note.overlaps(0.0, 2.0)); // start is exclusive on the far side
    }

    #[test]
    fn test_note_name() {
        // Middle C (C4) = MIDI note 60
        let note_c4 = RecordedNote::new(1, 60, 100, 0.0, 1.0);
        assert_eq!(note_c4.note_name(), "C4");

        // A4 (440 Hz) = MIDI note 69
        let note_a4 = RecordedNote::new(2, 69, 100, 0.0, 1.0);
        assert_eq!(note_a4.note_name(), "A4");
    }

    #[test]
    fn test_unique_ids() {
        let a = generate_note_id();
        let b = generate_note_id();
        assert_ne!(a, b);
    }

    #[test]
    #[should_panic(expected = "MIDI pitch must be 0-127")]
    fn test_invalid_pitch() {
        RecordedNote::new(1, 128, 100, 0.0, 1.0);
    }

    #[test]
    #[should_panic(expected = "Note length must be at least one step")]
    fn test_short_length() {
        RecordedNote::new(1, 60, 100, 0.0, 0.5);
    }
}
