//! Engine configuration.

use crate::{Error, Result};
use notewise_core::MAX_OCTAVE_OFFSET;
use notewise_midi::{NormalizerConfig, DEFAULT_QUEUE_CAPACITY};
use serde::{Deserialize, Serialize};

/// Largest accepted event queue.
pub const MAX_QUEUE_CAPACITY: usize = 65536;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EngineConfig {
    /// Events buffered between producers and [`pump`](crate::NotewiseEngine::pump).
    pub queue_capacity: usize,
    pub normalizer: NormalizerConfig,
    /// Octave offset given to newly announced inputs.
    pub default_octave_offset: i8,
    /// Pedal polarity given to newly announced inputs.
    pub default_reverse_pedal: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            normalizer: NormalizerConfig::default(),
            default_octave_offset: 0,
            default_reverse_pedal: false,
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<()> {
        if self.queue_capacity == 0 || self.queue_capacity > MAX_QUEUE_CAPACITY {
            return Err(Error::InvalidConfig(format!(
                "queue_capacity {} out of range (1-{})",
                self.queue_capacity, MAX_QUEUE_CAPACITY
            )));
        }
        if self.default_octave_offset.unsigned_abs() > MAX_OCTAVE_OFFSET.unsigned_abs() {
            return Err(Error::InvalidConfig(format!(
                "default_octave_offset {} out of range (-{}..={})",
                self.default_octave_offset, MAX_OCTAVE_OFFSET, MAX_OCTAVE_OFFSET
            )));
        }
        self.normalizer.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = EngineConfig::default();
        assert_eq!(config.queue_capacity, 1024);
        assert_eq!(config.default_octave_offset, 0);
        assert!(!config.default_reverse_pedal);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rejects_bad_capacity() {
        for capacity in [0, MAX_QUEUE_CAPACITY + 1] {
            let config = EngineConfig {
                queue_capacity: capacity,
                ..Default::default()
            };
            assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));
        }
    }

    #[test]
    fn test_rejects_bad_offset() {
        let config = EngineConfig {
            default_octave_offset: -11,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_bad_normalizer_config_surfaces() {
        let config = EngineConfig {
            normalizer: NormalizerConfig {
                pedal_threshold: 128,
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(Error::Midi(_))));
    }
}
