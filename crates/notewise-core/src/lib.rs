//! Note-state core for notewise.
//!
//! Entity model, store, sustain-aware reconciler, memoized selectors and the
//! chord estimation seam. No I/O: events arrive already normalized.

pub mod error;
pub use error::{Error, Result};

pub mod types;
pub use types::{
    pitch_class, ChannelId, ChannelNumber, InputId, NoteId, NoteNumber, PitchClass,
    CHANNELS_PER_INPUT, NOTES_PER_CHANNEL, PITCH_CLASSES,
};

mod note_set;
pub use note_set::NoteSet;

pub mod theory;
pub use theory::{Accidentals, NoteName};

mod entity;
pub use entity::{
    to_logical_note, to_raw_note, Channel, ChromaticNote, Input, InputKind, InputSettings,
    KeyCount, Note, MAX_OCTAVE_OFFSET,
};

mod event;
pub use event::{
    is_valid_channel, DomainEvent, InputRegistration, NoteAction, NoteEvent, NotesOnState,
    PedalEvent,
};

mod store;
pub use store::EntityStore;

mod reconciler;
pub use reconciler::{Applied, IgnoreReason, Reconciler};

pub mod chord;
pub use chord::{ChordEstimator, TemplateChordEstimator};

mod query;
pub use query::{Queries, SelectorCache};
