//! Topic store configuration.

use crate::error::ConfigError;

/// Default retention bound per topic.
pub const MAX_MESSAGES_PER_TOPIC: usize = 100;

/// Settings for a [`TopicStore`](crate::TopicStore).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Messages retained per topic before the oldest is evicted.
    pub max_messages_per_topic: usize,
}

impl StoreConfig {
    /// Checks that the configuration can back a store.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ZeroCapacity`] if `max_messages_per_topic` is 0.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_messages_per_topic == 0 {
            return Err(ConfigError::ZeroCapacity);
        }
        Ok(())
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            max_messages_per_topic: MAX_MESSAGES_PER_TOPIC,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_config_defaults() {
        let config = StoreConfig::default();
        assert_eq!(config.max_messages_per_topic, 100);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn zero_capacity_is_rejected() {
        let config = StoreConfig {
            max_messages_per_topic: 0,
        };
        assert_eq!(config.validate(), Err(ConfigError::ZeroCapacity));
    }
}
