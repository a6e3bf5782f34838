//! MIDI ingestion for notewise.
//!
//! Turns raw MIDI bytes and transport records into domain events, tracks
//! which inputs are announced, and serializes events for the single writer.

pub mod error;
pub use error::{Error, NormalizeError, Result};

pub mod config;
pub use config::{NormalizerConfig, SUSTAIN_CC};

mod normalizer;
pub use normalizer::{scale, Normalizer};

pub mod transport;
pub use transport::{normalize_json, NoteRecord, PedalRecord, TransportEvent};

mod registry;
pub use registry::{InputDefaults, InputDescriptor, InputRegistry};

mod queue;
pub use queue::{EventQueue, EventSender, DEFAULT_QUEUE_CAPACITY};
