//! Pitch-class names and major-key membership.

use crate::types::{pitch_class, NoteNumber, PitchClass, PITCH_CLASSES};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Semitone offsets of the major scale degrees from the tonic.
pub const MAJOR_SCALE: [u8; 7] = [0, 2, 4, 5, 7, 9, 11];

const SHARP_NAMES: [&str; PITCH_CLASSES] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

const FLAT_NAMES: [&str; PITCH_CLASSES] = [
    "C", "Db", "D", "Eb", "E", "F", "Gb", "G", "Ab", "A", "Bb", "B",
];

/// Spelling preference for black keys.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Accidentals {
    #[default]
    Sharps,
    Flats,
}

impl Accidentals {
    pub fn name(self, pc: PitchClass) -> &'static str {
        let pc = (pc % 12) as usize;
        match self {
            Accidentals::Sharps => SHARP_NAMES[pc],
            Accidentals::Flats => FLAT_NAMES[pc],
        }
    }
}

/// Whether the major key with tonic `key` has `pc` among its diatonic notes.
#[inline]
pub fn major_key_contains(key: PitchClass, pc: PitchClass) -> bool {
    let degree = (pc % 12 + 12 - key % 12) % 12;
    MAJOR_SCALE.contains(&degree)
}

/// Tonics of the seven major keys whose scale contains `pc`.
pub fn major_keys_containing(pc: PitchClass) -> impl Iterator<Item = PitchClass> {
    (0..PITCH_CLASSES as PitchClass).filter(move |&key| major_key_contains(key, pc))
}

/// A MIDI note spelled for display: pitch class plus scientific octave
/// (MIDI 60 = C4).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NoteName {
    pub note: NoteNumber,
    pub accidentals: Accidentals,
}

impl NoteName {
    pub fn new(note: NoteNumber, accidentals: Accidentals) -> Self {
        Self { note, accidentals }
    }

    #[inline]
    pub fn pitch_class(&self) -> PitchClass {
        pitch_class(self.note)
    }

    #[inline]
    pub fn octave(&self) -> i8 {
        (self.note / 12) as i8 - 1
    }

    /// Letter and accidental without the octave, e.g. `"Eb"`.
    pub fn pitch_name(&self) -> &'static str {
        self.accidentals.name(self.pitch_class())
    }
}

impl fmt::Display for NoteName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.pitch_name(), self.octave())
    }
}
