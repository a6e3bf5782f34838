//! Error types for the MIDI normalization layer.

use thiserror::Error;

/// Why an inbound record or byte message could not become a domain event.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NormalizeError {
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Channel {0} out of range (1-16)")]
    ChannelOutOfRange(u8),

    #[error("notesOnState has {0} entries, expected 128")]
    NotesOnStateLength(usize),

    #[error("Unknown event type: {0}")]
    UnknownEventType(String),

    #[error("Unparseable MIDI bytes: {0}")]
    Bytes(String),
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("Malformed event: {0}")]
    Normalize(#[from] NormalizeError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Event queue closed")]
    QueueClosed,

    #[error("Event queue full, {0} event dropped")]
    QueueFull(&'static str),

    #[error("Invalid config: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, Error>;
