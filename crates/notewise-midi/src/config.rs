//! Normalizer configuration.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// Controller number of the standard damper pedal.
pub const SUSTAIN_CC: u8 = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NormalizerConfig {
    /// Controller treated as the sustain pedal.
    pub sustain_controller: u8,
    /// Controller values below this read as "pedal at rest".
    pub pedal_threshold: u8,
    /// Map CC 120/123 to a release of every sounding note on the channel.
    pub all_notes_off: bool,
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        Self {
            sustain_controller: SUSTAIN_CC,
            pedal_threshold: 64,
            all_notes_off: true,
        }
    }
}

impl NormalizerConfig {
    pub fn validate(&self) -> Result<()> {
        if self.sustain_controller > 127 {
            return Err(Error::InvalidConfig(format!(
                "sustain_controller {} out of range (0-127)",
                self.sustain_controller
            )));
        }
        if self.pedal_threshold > 127 {
            return Err(Error::InvalidConfig(format!(
                "pedal_threshold {} out of range (0-127)",
                self.pedal_threshold
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = NormalizerConfig::default();
        assert_eq!(config.sustain_controller, 64);
        assert_eq!(config.pedal_threshold, 64);
        assert!(config.all_notes_off);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rejects_out_of_range() {
        let config = NormalizerConfig {
            sustain_controller: 200,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: NormalizerConfig = serde_json::from_str(r#"{"pedalThreshold": 10}"#).unwrap();
        assert_eq!(config.pedal_threshold, 10);
        assert_eq!(config.sustain_controller, 64);
    }
}
