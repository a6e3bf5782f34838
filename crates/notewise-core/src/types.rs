//! Identifiers and small value types shared by the entity model.
//!
//! Channel and note ids are composites of their owning input id, so ownership
//! is structural: removing an input can find everything derived from it without
//! string matching.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Logical channels per input (MIDI channels 1-16).
pub const CHANNELS_PER_INPUT: u8 = 16;

/// Notes per channel (MIDI notes 0-127).
pub const NOTES_PER_CHANNEL: usize = 128;

/// Pitch classes per octave.
pub const PITCH_CLASSES: usize = 12;

/// MIDI note number (0-127).
pub type NoteNumber = u8;

/// Pitch class (0 = C ... 11 = B).
pub type PitchClass = u8;

/// MIDI channel number (1-16, 1-based like the transport).
pub type ChannelNumber = u8;

#[inline]
pub fn pitch_class(note: NoteNumber) -> PitchClass {
    note % 12
}

/// Stable id of one MIDI source.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InputId(String);

impl InputId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Id of one of this input's channels.
    pub fn channel(&self, channel: ChannelNumber) -> ChannelId {
        ChannelId::new(self.clone(), channel)
    }

    /// Ids of all 16 channels of this input, in channel order.
    pub fn channels(&self) -> impl Iterator<Item = ChannelId> + '_ {
        (1..=CHANNELS_PER_INPUT).map(move |channel| self.channel(channel))
    }
}

impl fmt::Display for InputId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for InputId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for InputId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Composite id of one channel: `"{input}-{channel}"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ChannelId {
    pub input: InputId,
    pub channel: ChannelNumber,
}

impl ChannelId {
    pub fn new(input: InputId, channel: ChannelNumber) -> Self {
        Self { input, channel }
    }

    pub fn belongs_to(&self, input: &InputId) -> bool {
        &self.input == input
    }

    pub fn note(&self, note: NoteNumber) -> NoteId {
        NoteId::new(self.clone(), note)
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.input, self.channel)
    }
}

impl FromStr for ChannelId {
    type Err = Error;

    /// Parses `"{input}-{channel}"`. The input part may itself contain dashes;
    /// the channel is always the last segment.
    fn from_str(s: &str) -> Result<Self> {
        let (input, channel) = s
            .rsplit_once('-')
            .ok_or_else(|| Error::InvalidId(format!("channel id '{s}' has no channel part")))?;
        let channel: ChannelNumber = channel
            .parse()
            .map_err(|_| Error::InvalidId(format!("channel id '{s}' has a non-numeric channel")))?;
        if input.is_empty() || !(1..=CHANNELS_PER_INPUT).contains(&channel) {
            return Err(Error::InvalidId(format!("channel id '{s}' is out of range")));
        }
        Ok(Self::new(InputId::new(input), channel))
    }
}

/// Composite id of one note: `"{input}-{channel}-{note}"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NoteId {
    pub channel: ChannelId,
    pub note: NoteNumber,
}

impl NoteId {
    pub fn new(channel: ChannelId, note: NoteNumber) -> Self {
        Self { channel, note }
    }

    pub fn belongs_to(&self, input: &InputId) -> bool {
        self.channel.belongs_to(input)
    }
}

impl fmt::Display for NoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.channel, self.note)
    }
}

impl FromStr for NoteId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let (channel, note) = s
            .rsplit_once('-')
            .ok_or_else(|| Error::InvalidId(format!("note id '{s}' has no note part")))?;
        let note: NoteNumber = note
            .parse()
            .map_err(|_| Error::InvalidId(format!("note id '{s}' has a non-numeric note")))?;
        if note as usize >= NOTES_PER_CHANNEL {
            return Err(Error::InvalidId(format!("note id '{s}' is out of range")));
        }
        Ok(Self::new(channel.parse()?, note))
    }
}
