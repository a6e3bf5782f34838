//! Centralized error type for the notewise umbrella crate.
//!
//! Wraps subsystem errors so `?` propagates naturally across crate boundaries.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Core(#[from] notewise_core::Error),

    #[error("MIDI: {0}")]
    Midi(#[from] notewise_midi::Error),

    #[error("Invalid config: {0}")]
    InvalidConfig(String),
}

impl From<notewise_midi::NormalizeError> for Error {
    fn from(e: notewise_midi::NormalizeError) -> Self {
        Error::Midi(e.into())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
