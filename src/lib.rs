//! # notewise - live MIDI note-state engine
//!
//! Keeps a queryable model of which notes are sounding on each input
//! channel, with sustain-pedal semantics that separate held keys from
//! audible notes.
//!
//! ## Architecture
//!
//! notewise is an umbrella crate that coordinates:
//! - **notewise-core** - Entity store, sustain reconciler, memoized selectors, chord estimation
//! - **notewise-midi** - Byte and transport-record normalization, input registry, event queue
//!
//! ## Quick Start
//!
//! ```ignore
//! use notewise::prelude::*;
//!
//! let engine = NotewiseEngine::builder().build()?;
//! let piano = InputId::new("usb-piano");
//! engine.announce_input(InputDescriptor::new(piano.clone(), "Piano"))?;
//!
//! // transport callback
//! engine.submit_bytes(&piano, &[0x90, 60, 100], 0.0)?;
//!
//! // writer
//! engine.pump();
//!
//! // consumers
//! let chord = engine.read(|q| {
//!     q.chord_estimate(&piano.channel(1), &TemplateChordEstimator, Accidentals::Sharps)
//! });
//! ```

/// Re-export of notewise-core for direct access
pub use notewise_core as core;

/// Re-export of notewise-midi for direct access
pub use notewise_midi as midi;

pub use notewise_core::{
    Accidentals, Applied, Channel, ChannelId, ChordEstimator, ChromaticNote, DomainEvent,
    EntityStore, IgnoreReason, Input, InputId, InputKind, InputRegistration, InputSettings,
    KeyCount, Note, NoteAction, NoteEvent, NoteId, NoteName, PedalEvent, Queries, SelectorCache,
    TemplateChordEstimator,
};

pub use notewise_midi::{
    EventSender, InputDescriptor, NormalizeError, NormalizerConfig, TransportEvent,
};

mod error;
pub use error::{Error, Result};

mod config;
pub use config::{EngineConfig, MAX_QUEUE_CAPACITY};

mod builder;
mod engine;

pub use builder::NotewiseEngineBuilder;
pub use engine::{EngineStats, NotewiseEngine};

/// Convenience prelude for common imports
pub mod prelude {
    // Main engine
    pub use crate::{EngineConfig, EngineStats, NotewiseEngine, NotewiseEngineBuilder};

    // Identifiers
    pub use crate::core::{ChannelId, InputId, NoteId};

    // Events
    pub use crate::core::{Applied, DomainEvent, NoteEvent, PedalEvent};
    pub use crate::midi::{InputDescriptor, TransportEvent};

    // Queries
    pub use crate::core::{Accidentals, ChordEstimator, NoteName, Queries, TemplateChordEstimator};
}
