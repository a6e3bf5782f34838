//! Domain events consumed by the reconciler.
//!
//! The normalizer produces these from raw device callbacks; nothing in here
//! knows about bytes or transport records.

use crate::entity::{Channel, Input, Note};
use crate::types::{
    ChannelId, ChannelNumber, InputId, NoteNumber, CHANNELS_PER_INPUT, NOTES_PER_CHANNEL,
};
use serde::{Deserialize, Serialize};

/// Raw per-note key state reported by hardware, indexed by raw
/// (untransposed) note number.
pub type NotesOnState = [bool; NOTES_PER_CHANNEL];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NoteAction {
    NoteOn,
    NoteOff,
    /// Synthetic: release everything sounding on the channel.
    ForceOffAll,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NoteEvent {
    pub input_id: InputId,
    pub action: NoteAction,
    /// Device note number before the input's octave offset. Ignored for
    /// [`NoteAction::ForceOffAll`].
    pub raw_note: NoteNumber,
    pub channel: ChannelNumber,
    /// 0.0..=1.0
    pub velocity: f32,
    pub attack: f32,
    pub release: f32,
    pub timestamp: f64,
}

impl NoteEvent {
    pub fn note_on(
        input_id: impl Into<InputId>,
        channel: ChannelNumber,
        raw_note: NoteNumber,
        velocity: f32,
    ) -> Self {
        Self {
            input_id: input_id.into(),
            action: NoteAction::NoteOn,
            raw_note,
            channel,
            velocity,
            attack: velocity,
            release: 0.0,
            timestamp: 0.0,
        }
    }

    pub fn note_off(input_id: impl Into<InputId>, channel: ChannelNumber, raw_note: NoteNumber) -> Self {
        Self {
            input_id: input_id.into(),
            action: NoteAction::NoteOff,
            raw_note,
            channel,
            velocity: 0.0,
            attack: 0.0,
            release: 0.0,
            timestamp: 0.0,
        }
    }

    pub fn force_off_all(input_id: impl Into<InputId>, channel: ChannelNumber) -> Self {
        Self {
            input_id: input_id.into(),
            action: NoteAction::ForceOffAll,
            raw_note: 0,
            channel,
            velocity: 0.0,
            attack: 0.0,
            release: 0.0,
            timestamp: 0.0,
        }
    }

    pub fn at(mut self, timestamp: f64) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn with_attack(mut self, attack: f32) -> Self {
        self.attack = attack;
        self
    }

    pub fn with_release(mut self, release: f32) -> Self {
        self.release = release;
        self
    }

    pub fn channel_id(&self) -> ChannelId {
        self.input_id.channel(self.channel)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PedalEvent {
    pub input_id: InputId,
    pub channel: ChannelNumber,
    /// Authoritative key state, if the source reports one.
    pub notes_on_state: Option<Box<NotesOnState>>,
    /// Raw switch level as delivered by the transport. `true` is the
    /// pedal's resting position on standard controllers; the input's
    /// `reverse_pedal` flag decides how it maps to sustain.
    pub raw_value: bool,
}

impl PedalEvent {
    pub fn new(input_id: impl Into<InputId>, channel: ChannelNumber, raw_value: bool) -> Self {
        Self {
            input_id: input_id.into(),
            channel,
            notes_on_state: None,
            raw_value,
        }
    }

    /// Pedal pressed on a standard-polarity input.
    pub fn down(input_id: impl Into<InputId>, channel: ChannelNumber) -> Self {
        Self::new(input_id, channel, false)
    }

    /// Pedal released on a standard-polarity input.
    pub fn up(input_id: impl Into<InputId>, channel: ChannelNumber) -> Self {
        Self::new(input_id, channel, true)
    }

    pub fn with_notes_on_state(mut self, state: NotesOnState) -> Self {
        self.notes_on_state = Some(Box::new(state));
        self
    }

    pub fn channel_id(&self) -> ChannelId {
        self.input_id.channel(self.channel)
    }
}

/// Bulk entities for one or more newly announced inputs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InputRegistration {
    pub inputs: Vec<Input>,
    pub channels: Vec<Channel>,
    pub notes: Vec<Note>,
}

impl InputRegistration {
    /// The input plus all 16 channels and their 128 notes each.
    pub fn for_input(input: Input) -> Self {
        let channels: Vec<Channel> = input.id.channels().map(Channel::new).collect();
        let notes = channels
            .iter()
            .flat_map(|channel| {
                (0..NOTES_PER_CHANNEL as NoteNumber).map(|note| Note::new(channel.id.note(note)))
            })
            .collect();
        Self {
            inputs: vec![input],
            channels,
            notes,
        }
    }

    pub fn merge(mut self, other: InputRegistration) -> Self {
        self.inputs.extend(other.inputs);
        self.channels.extend(other.channels);
        self.notes.extend(other.notes);
        self
    }

    pub fn input_ids(&self) -> impl Iterator<Item = &InputId> {
        self.inputs.iter().map(|input| &input.id)
    }

    pub fn is_empty(&self) -> bool {
        self.inputs.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DomainEvent {
    Note(NoteEvent),
    Pedal(PedalEvent),
    InputAdded(InputRegistration),
    InputRemoved(Vec<InputId>),
}

impl DomainEvent {
    /// Short label for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            DomainEvent::Note(event) => match event.action {
                NoteAction::NoteOn => "noteon",
                NoteAction::NoteOff => "noteoff",
                NoteAction::ForceOffAll => "force-off-all",
            },
            DomainEvent::Pedal(_) => "pedal",
            DomainEvent::InputAdded(_) => "input-added",
            DomainEvent::InputRemoved(_) => "input-removed",
        }
    }
}

impl From<NoteEvent> for DomainEvent {
    fn from(event: NoteEvent) -> Self {
        DomainEvent::Note(event)
    }
}

impl From<PedalEvent> for DomainEvent {
    fn from(event: PedalEvent) -> Self {
        DomainEvent::Pedal(event)
    }
}

impl From<InputRegistration> for DomainEvent {
    fn from(registration: InputRegistration) -> Self {
        DomainEvent::InputAdded(registration)
    }
}

/// Whether `channel` is a valid 1-based MIDI channel.
#[inline]
pub fn is_valid_channel(channel: ChannelNumber) -> bool {
    (1..=CHANNELS_PER_INPUT).contains(&channel)
}
