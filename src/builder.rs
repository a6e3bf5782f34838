//! Builder for configuring and constructing a `NotewiseEngine`.

use crate::{EngineConfig, NotewiseEngine, Result};
use notewise_midi::NormalizerConfig;

/// Settings are validated once, in [`build`](Self::build).
///
/// # Example
///
/// ```ignore
/// use notewise::prelude::*;
///
/// let engine = NotewiseEngine::builder()
///     .queue_capacity(4096)
///     .octave_offset(-1)
///     .build()?;
/// ```
#[derive(Debug, Clone, Default)]
pub struct NotewiseEngineBuilder {
    config: EngineConfig,
}

impl NotewiseEngineBuilder {
    /// Default: 1024
    pub fn queue_capacity(mut self, capacity: usize) -> Self {
        self.config.queue_capacity = capacity;
        self
    }

    /// Octave offset for newly announced inputs. Default: 0
    pub fn octave_offset(mut self, offset: i8) -> Self {
        self.config.default_octave_offset = offset;
        self
    }

    /// Pedal polarity for newly announced inputs. Default: false
    pub fn reverse_pedal(mut self, reverse: bool) -> Self {
        self.config.default_reverse_pedal = reverse;
        self
    }

    pub fn normalizer(mut self, normalizer: NormalizerConfig) -> Self {
        self.config.normalizer = normalizer;
        self
    }

    /// Replaces every setting at once.
    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn build(self) -> Result<NotewiseEngine> {
        NotewiseEngine::from_config(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    #[test]
    fn test_builder_applies_settings() {
        let engine = NotewiseEngineBuilder::default()
            .queue_capacity(16)
            .octave_offset(2)
            .reverse_pedal(true)
            .build()
            .unwrap();
        assert_eq!(engine.config().queue_capacity, 16);
        assert_eq!(engine.config().default_octave_offset, 2);
        assert!(engine.config().default_reverse_pedal);
    }

    #[test]
    fn test_builder_validates() {
        let result = NotewiseEngineBuilder::default().queue_capacity(0).build();
        assert!(matches!(result, Err(Error::InvalidConfig(_))));

        let result = NotewiseEngineBuilder::default().octave_offset(12).build();
        assert!(result.is_err());
    }
}
