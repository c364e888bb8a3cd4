// Pattern store - where finalized and preview notes land
// A pattern is like a "clip" in other DAWs, with one note lane per instrument

use crate::note::{NoteId, RecordedNote};
use std::collections::HashMap;

/// Unique identifier for patterns
pub type PatternId = u64;

/// Unique identifier for instruments within a pattern
pub type InstrumentId = u64;

/// Failures reported by a pattern store
///
/// The capture engine treats these as recoverable: the offending note is
/// dropped, a warning is surfaced, and recording continues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum PatternStoreError {
    #[error("unknown pattern {0}")]
    UnknownPattern(PatternId),

    #[error("unknown instrument {instrument} in pattern {pattern}")]
    UnknownInstrument {
        pattern: PatternId,
        instrument: InstrumentId,
    },
}

/// The capture engine's output boundary
///
/// `append_or_replace_note` keeps note identity stable: a note with an id
/// already present in the lane overwrites the stored entry (this is how a
/// live preview grows and how it is finalized), otherwise the note is
/// appended.
pub trait PatternStore {
    fn append_or_replace_note(
        &mut self,
        pattern: PatternId,
        instrument: InstrumentId,
        note: RecordedNote,
    ) -> Result<(), PatternStoreError>;

    /// Remove all notes overlapping the half-open step range [start, end).
    /// Returns the number of notes removed.
    fn remove_notes_in_range(
        &mut self,
        pattern: PatternId,
        instrument: InstrumentId,
        start_step: f64,
        end_step: f64,
    ) -> Result<usize, PatternStoreError>;
}

/// A pattern containing per-instrument note lanes
#[derive(Debug, Clone)]
pub struct Pattern {
    /// Unique identifier
    pub id: PatternId,

    /// Pattern name
    pub name: String,

    /// Pattern length in steps (determines when playback loops)
    pub length_steps: f64,

    /// Notes per instrument, kept sorted by start step
    lanes: HashMap<InstrumentId, Vec<RecordedNote>>,
}

impl Pattern {
    /// Create a new empty pattern
    pub fn new(id: PatternId, name: String, length_steps: f64) -> Self {
        assert!(length_steps > 0.0, "Pattern length must be > 0 steps");

        Self {
            id,
            name,
            length_steps,
            lanes: HashMap::new(),
        }
    }

    /// Create a pattern with the default length (4 bars of 4/4 = 64 steps)
    pub fn new_default(id: PatternId, name: String) -> Self {
        Self::new(id, name, 64.0)
    }

    /// Add an empty note lane for an instrument
    pub fn add_instrument(&mut self, instrument: InstrumentId) {
        self.lanes.entry(instrument).or_default();
    }

    /// Check whether an instrument lane exists
    pub fn has_instrument(&self, instrument: InstrumentId) -> bool {
        self.lanes.contains_key(&instrument)
    }

    /// Get an instrument's notes, sorted by start step
    pub fn notes(&self, instrument: InstrumentId) -> &[RecordedNote] {
        self.lanes.get(&instrument).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Insert a note, or overwrite the stored note with the same id
    pub fn upsert_note(&mut self, instrument: InstrumentId, note: RecordedNote) -> bool {
        let Some(lane) = self.lanes.get_mut(&instrument) else {
            return false;
        };

        if let Some(existing) = lane.iter_mut().find(|n| n.id == note.id) {
            *existing = note;
            lane.sort_by(|a, b| a.start_step.total_cmp(&b.start_step));
            return true;
        }

        // Keep notes sorted by start position for efficient playback
        let insert_pos = lane
            .binary_search_by(|n| n.start_step.total_cmp(&note.start_step))
            .unwrap_or_else(|pos| pos);
        lane.insert(insert_pos, note);
        true
    }

    /// Remove a note by ID
    pub fn remove_note(&mut self, instrument: InstrumentId, note_id: NoteId) -> Option<RecordedNote> {
        let lane = self.lanes.get_mut(&instrument)?;
        let index = lane.iter().position(|n| n.id == note_id)?;
        Some(lane.remove(index))
    }

    /// Get a note by ID
    pub fn get_note(&self, instrument: InstrumentId, note_id: NoteId) -> Option<&RecordedNote> {
        self.lanes.get(&instrument)?.iter().find(|n| n.id == note_id)
    }

    /// Remove all notes overlapping [start, end); returns how many were removed
    pub fn remove_in_range(
        &mut self,
        instrument: InstrumentId,
        start_step: f64,
        end_step: f64,
    ) -> usize {
        let Some(lane) = self.lanes.get_mut(&instrument) else {
            return 0;
        };

        let before = lane.len();
        lane.retain(|n| !n.overlaps(start_step, end_step));
        before - lane.len()
    }

    /// Number of notes across all lanes
    pub fn note_count(&self) -> usize {
        self.lanes.values().map(Vec::len).sum()
    }

    /// Check if pattern has no notes
    pub fn is_empty(&self) -> bool {
        self.note_count() == 0
    }
}

/// In-memory pattern store keyed by pattern id
#[derive(Debug, Clone, Default)]
pub struct PatternBank {
    patterns: HashMap<PatternId, Pattern>,
}

impl PatternBank {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a pattern to the bank
    pub fn insert(&mut self, pattern: Pattern) {
        self.patterns.insert(pattern.id, pattern);
    }

    /// Get a pattern by id
    pub fn get(&self, id: PatternId) -> Option<&Pattern> {
        self.patterns.get(&id)
    }

    /// Get a mutable pattern by id
    pub fn get_mut(&mut self, id: PatternId) -> Option<&mut Pattern> {
        self.patterns.get_mut(&id)
    }

    fn lane_checked(
        &mut self,
        pattern: PatternId,
        instrument: InstrumentId,
    ) -> Result<&mut Pattern, PatternStoreError> {
        let p = self
            .patterns
            .get_mut(&pattern)
            .ok_or(PatternStoreError::UnknownPattern(pattern))?;

        if !p.has_instrument(instrument) {
            return Err(PatternStoreError::UnknownInstrument {
                pattern,
                instrument,
            });
        }

        Ok(p)
    }
}

impl PatternStore for PatternBank {
    fn append_or_replace_note(
        &mut self,
        pattern: PatternId,
        instrument: InstrumentId,
        note: RecordedNote,
    ) -> Result<(), PatternStoreError> {
        let p = self.lane_checked(pattern, instrument)?;
        p.upsert_note(instrument, note);
        Ok(())
    }

    fn remove_notes_in_range(
        &mut self,
        pattern: PatternId,
        instrument: InstrumentId,
        start_step: f64,
        end_step: f64,
    ) -> Result<usize, PatternStoreError> {
        let p = self.lane_checked(pattern, instrument)?;
        Ok(p.remove_in_range(instrument, start_step, end_step))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::note::generate_note_id;

    fn note(pitch: u8, start: f64, length: f64) -> RecordedNote {
        RecordedNote::new(generate_note_id(), pitch, 100, start, length)
    }

    fn bank_with_lane() -> PatternBank {
        let mut pattern = Pattern::new_default(1, "Test".to_string());
        pattern.add_instrument(7);
        let mut bank = PatternBank::new();
        bank.insert(pattern);
        bank
    }

    #[test]
    fn test_pattern_creation() {
        let pattern = Pattern::new(1, "Test Pattern".to_string(), 16.0);

        assert_eq!(pattern.id, 1);
        assert_eq!(pattern.name, "Test Pattern");
        assert_eq!(pattern.length_steps, 16.0);
        assert!(pattern.is_empty());
    }

    #[test]
    fn test_upsert_appends_and_sorts() {
        let mut pattern = Pattern::new_default(1, "Test".to_string());
        pattern.add_instrument(7);

        pattern.upsert_note(7, note(64, 8.0, 1.0));
        pattern.upsert_note(7, note(60, 0.0, 1.0));
        pattern.upsert_note(7, note(67, 4.0, 1.0));

        let notes = pattern.notes(7);
        assert_eq!(notes.len(), 3);
        assert_eq!(notes[0].start_step, 0.0);
        assert_eq!(notes[1].start_step, 4.0);
        assert_eq!(notes[2].start_step, 8.0);
    }

    #[test]
    fn test_upsert_replaces_same_id() {
        let mut pattern = Pattern::new_default(1, "Test".to_string());
        pattern.add_instrument(7);

        let mut n = note(60, 2.0, 1.0);
        pattern.upsert_note(7, n);

        // Same id, longer note: the stored entry is overwritten, not duplicated
        n.length_steps = 3.0;
        pattern.upsert_note(7, n);

        let notes = pattern.notes(7);
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].length_steps, 3.0);
    }

    #[test]
    fn test_remove_in_range() {
        let mut pattern = Pattern::new_default(1, "Test".to_string());
        pattern.add_instrument(7);

        pattern.upsert_note(7, note(60, 0.0, 2.0)); // [0, 2)
        pattern.upsert_note(7, note(62, 3.0, 2.0)); // [3, 5)
        pattern.upsert_note(7, note(64, 8.0, 4.0)); // [8, 12)

        let removed = pattern.remove_in_range(7, 2.0, 6.0);
        assert_eq!(removed, 1);

        let notes = pattern.notes(7);
        assert_eq!(notes.len(), 2);
        assert_eq!(notes[0].pitch, 60);
        assert_eq!(notes[1].pitch, 64);
    }

    #[test]
    fn test_bank_unknown_pattern() {
        let mut bank = PatternBank::new();
        let err = bank
            .append_or_replace_note(42, 7, note(60, 0.0, 1.0))
            .unwrap_err();
        assert_eq!(err, PatternStoreError::UnknownPattern(42));
    }

    #[test]
    fn test_bank_unknown_instrument() {
        let mut bank = bank_with_lane();
        let err = bank
            .append_or_replace_note(1, 99, note(60, 0.0, 1.0))
            .unwrap_err();
        assert_eq!(
            err,
            PatternStoreError::UnknownInstrument {
                pattern: 1,
                instrument: 99
            }
        );
    }

    #[test]
    fn test_bank_roundtrip() {
        let mut bank = bank_with_lane();

        let n = note(60, 4.0, 2.0);
        bank.append_or_replace_note(1, 7, n).unwrap();
        assert_eq!(bank.get(1).unwrap().notes(7).len(), 1);

        let removed = bank.remove_notes_in_range(1, 7, 0.0, 16.0).unwrap();
        assert_eq!(removed, 1);
        assert!(bank.get(1).unwrap().is_empty());
    }
}
