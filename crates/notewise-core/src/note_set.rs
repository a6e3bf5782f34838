//! Sorted, duplicate-free set of note numbers.

use crate::types::{pitch_class, NoteNumber, PitchClass};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// Ascending set of note numbers with insert-if-absent semantics.
///
/// Sixteen notes fit inline, which covers two hands plus a held pedal
/// without touching the heap.
///
/// Serialized as a plain list; deserializing sorts and deduplicates.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "Vec<NoteNumber>", into = "Vec<NoteNumber>")]
pub struct NoteSet(SmallVec<[NoteNumber; 16]>);

impl NoteSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert keeping ascending order. Returns `false` if already present.
    pub fn insert(&mut self, note: NoteNumber) -> bool {
        match self.0.binary_search(&note) {
            Ok(_) => false,
            Err(pos) => {
                self.0.insert(pos, note);
                true
            }
        }
    }

    /// Remove if present. Returns `false` if absent.
    pub fn remove(&mut self, note: NoteNumber) -> bool {
        match self.0.binary_search(&note) {
            Ok(pos) => {
                self.0.remove(pos);
                true
            }
            Err(_) => false,
        }
    }

    #[inline]
    pub fn contains(&self, note: NoteNumber) -> bool {
        self.0.binary_search(&note).is_ok()
    }

    /// AND over membership. Vacuously true for an empty slice.
    pub fn contains_all(&self, notes: &[NoteNumber]) -> bool {
        notes.iter().all(|&note| self.contains(note))
    }

    /// Whether any octave of `pc` is in the set.
    pub fn contains_pitch_class(&self, pc: PitchClass) -> bool {
        self.0.iter().any(|&note| pitch_class(note) == pc)
    }

    pub fn as_slice(&self) -> &[NoteNumber] {
        &self.0
    }

    pub fn iter(&self) -> impl Iterator<Item = NoteNumber> + '_ {
        self.0.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    /// Whether a set is strictly ascending. Always true for values built
    /// through this API; used by tests and debug assertions.
    pub fn is_strictly_ascending(&self) -> bool {
        self.0.windows(2).all(|pair| pair[0] < pair[1])
    }

    pub fn is_subset_of(&self, other: &NoteSet) -> bool {
        self.iter().all(|note| other.contains(note))
    }
}

impl FromIterator<NoteNumber> for NoteSet {
    fn from_iter<I: IntoIterator<Item = NoteNumber>>(iter: I) -> Self {
        let mut set = Self::new();
        for note in iter {
            set.insert(note);
        }
        set
    }
}

impl From<Vec<NoteNumber>> for NoteSet {
    fn from(notes: Vec<NoteNumber>) -> Self {
        notes.into_iter().collect()
    }
}

impl From<NoteSet> for Vec<NoteNumber> {
    fn from(set: NoteSet) -> Self {
        set.0.into_vec()
    }
}
