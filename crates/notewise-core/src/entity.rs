//! Inputs, channels and notes.
//!
//! Channel methods here are the primitive mutations; deciding *when* to call
//! them (the sustain rules) is the reconciler's job.

use crate::error::{Error, Result};
use crate::note_set::NoteSet;
use crate::theory::major_keys_containing;
use crate::types::{
    pitch_class, ChannelId, InputId, NoteId, NoteNumber, PitchClass, NOTES_PER_CHANNEL,
    PITCH_CLASSES,
};
use serde::{Deserialize, Serialize};

/// Largest octave shift accepted by [`InputSettings::validate`].
pub const MAX_OCTAVE_OFFSET: i8 = 10;

/// Logical note for a raw device note under an octave offset.
#[inline]
pub fn to_logical_note(raw: NoteNumber, octave_offset: i8) -> Option<NoteNumber> {
    let logical = raw as i32 + 12 * octave_offset as i32;
    (0..NOTES_PER_CHANNEL as i32)
        .contains(&logical)
        .then_some(logical as NoteNumber)
}

/// Raw device note for a logical note; inverse of [`to_logical_note`].
#[inline]
pub fn to_raw_note(logical: NoteNumber, octave_offset: i8) -> Option<NoteNumber> {
    let raw = logical as i32 - 12 * octave_offset as i32;
    (0..NOTES_PER_CHANNEL as i32)
        .contains(&raw)
        .then_some(raw as NoteNumber)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InputKind {
    #[default]
    Hardware,
    /// Synthesized source such as a file player.
    Virtual,
}

/// One physical or virtual MIDI source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Input {
    pub id: InputId,
    pub name: String,
    pub manufacturer: Option<String>,
    pub kind: InputKind,
    /// Octaves added to every incoming raw note number.
    pub manual_octave_offset: i8,
    /// Polarity flag for controllers that report the pedal inverted.
    pub reverse_pedal: bool,
    /// Derived sustain state.
    pub pedal_on: bool,
}

impl Input {
    pub fn new(id: impl Into<InputId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            manufacturer: None,
            kind: InputKind::Hardware,
            manual_octave_offset: 0,
            reverse_pedal: false,
            pedal_on: false,
        }
    }

    pub fn with_manufacturer(mut self, manufacturer: impl Into<String>) -> Self {
        self.manufacturer = Some(manufacturer.into());
        self
    }

    pub fn with_kind(mut self, kind: InputKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_octave_offset(mut self, offset: i8) -> Self {
        self.manual_octave_offset = offset;
        self
    }

    pub fn with_reverse_pedal(mut self, reverse: bool) -> Self {
        self.reverse_pedal = reverse;
        self
    }

    #[inline]
    pub fn logical_note(&self, raw: NoteNumber) -> Option<NoteNumber> {
        to_logical_note(raw, self.manual_octave_offset)
    }

    #[inline]
    pub fn raw_note(&self, logical: NoteNumber) -> Option<NoteNumber> {
        to_raw_note(logical, self.manual_octave_offset)
    }

    /// Sustain state for a raw pedal value under this input's polarity.
    #[inline]
    pub fn effective_pedal(&self, raw_value: bool) -> bool {
        if self.reverse_pedal {
            raw_value
        } else {
            !raw_value
        }
    }
}

/// Per-input settings a user can change after registration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InputSettings {
    pub manual_octave_offset: Option<i8>,
    pub reverse_pedal: Option<bool>,
}

impl InputSettings {
    pub fn validate(&self) -> Result<()> {
        if let Some(offset) = self.manual_octave_offset {
            if offset.unsigned_abs() > MAX_OCTAVE_OFFSET.unsigned_abs() {
                return Err(Error::InvalidSettings(format!(
                    "octave offset {offset} out of range (-{MAX_OCTAVE_OFFSET}..={MAX_OCTAVE_OFFSET})"
                )));
            }
        }
        Ok(())
    }
}

/// Aggregate flags for one pitch class across all octaves.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChromaticNote {
    pub note_on: bool,
    pub note_pressed: bool,
}

/// Note-on tally for one major key.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyCount {
    /// Tonic pitch class of the major key.
    pub key: PitchClass,
    pub note_count: u32,
}

/// One logical channel of an input and its derived aggregates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Channel {
    pub id: ChannelId,
    /// Sounding notes (held keys plus sustained ones).
    pub notes_on: NoteSet,
    /// Physically held keys. Always a subset of `notes_on`.
    pub notes_pressed: NoteSet,
    /// Score-follow tracking set; same insertion rule as `notes_pressed`.
    pub cursor_notes: NoteSet,
    pub chromatic: [ChromaticNote; PITCH_CLASSES],
    pub key_data: [KeyCount; PITCH_CLASSES],
    pub total_note_count: u32,
    /// Store version of this channel's last mutation.
    pub(crate) revision: u64,
}

impl Channel {
    pub fn new(id: ChannelId) -> Self {
        Self {
            id,
            notes_on: NoteSet::new(),
            notes_pressed: NoteSet::new(),
            cursor_notes: NoteSet::new(),
            chromatic: [ChromaticNote::default(); PITCH_CLASSES],
            key_data: std::array::from_fn(|key| KeyCount {
                key: key as PitchClass,
                note_count: 0,
            }),
            total_note_count: 0,
            revision: 0,
        }
    }

    /// Monotonic version stamp; unchanged revision means unchanged content.
    #[inline]
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Normalized key histogram. All ones when nothing has been played yet.
    pub fn key_prevalence(&self) -> [f32; PITCH_CLASSES] {
        if self.total_note_count == 0 {
            return [1.0; PITCH_CLASSES];
        }
        let total = self.total_note_count as f32;
        std::array::from_fn(|key| self.key_data[key].note_count as f32 / total)
    }

    pub(crate) fn record_note_on(&mut self, note: NoteNumber) {
        let pc = pitch_class(note);
        self.total_note_count = self.total_note_count.saturating_add(1);
        self.notes_on.insert(note);
        self.notes_pressed.insert(note);
        self.cursor_notes.insert(note);
        self.chromatic[pc as usize] = ChromaticNote {
            note_on: true,
            note_pressed: true,
        };
        for key in major_keys_containing(pc) {
            let slot = &mut self.key_data[key as usize];
            slot.note_count = slot.note_count.saturating_add(1);
        }
    }

    /// Physical key release. Leaves `notes_on` alone.
    pub(crate) fn release_key(&mut self, note: NoteNumber) {
        self.notes_pressed.remove(note);
        self.cursor_notes.remove(note);
        self.refresh_chromatic(pitch_class(note));
    }

    /// Stop a note sounding. Also releases the key to keep
    /// `notes_pressed ⊆ notes_on`.
    pub(crate) fn silence(&mut self, note: NoteNumber) {
        self.notes_on.remove(note);
        self.notes_pressed.remove(note);
        self.cursor_notes.remove(note);
        self.refresh_chromatic(pitch_class(note));
    }

    pub(crate) fn silence_all(&mut self) {
        self.notes_on.clear();
        self.notes_pressed.clear();
        self.cursor_notes.clear();
        self.chromatic = [ChromaticNote::default(); PITCH_CLASSES];
    }

    pub(crate) fn reset_key_data(&mut self) {
        for slot in &mut self.key_data {
            slot.note_count = 0;
        }
        self.total_note_count = 0;
    }

    fn refresh_chromatic(&mut self, pc: PitchClass) {
        self.chromatic[pc as usize] = ChromaticNote {
            note_on: self.notes_on.contains_pitch_class(pc),
            note_pressed: self.notes_pressed.contains_pitch_class(pc),
        };
    }
}

/// One (channel, note) pair and its most recent event metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
    pub id: NoteId,
    pub note_on: bool,
    pub note_pressed: bool,
    /// Lifetime note-on count.
    pub count: u32,
    /// 0.0..=1.0
    pub velocity: f32,
    pub attack: f32,
    pub release: f32,
    pub timestamp: f64,
}

impl Note {
    pub fn new(id: NoteId) -> Self {
        Self {
            id,
            note_on: false,
            note_pressed: false,
            count: 0,
            velocity: 0.0,
            attack: 0.0,
            release: 0.0,
            timestamp: 0.0,
        }
    }

    #[inline]
    pub fn number(&self) -> NoteNumber {
        self.id.note
    }
}
