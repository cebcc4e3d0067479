//! Game session configuration.

use serde::{Deserialize, Serialize};

/// Tunables shared by the game manager and its actors
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Deal as soon as the third seat fills, and re-deal after a void round
    pub auto_deal: bool,

    /// Capacity of each actor's inbox and each subscriber's event channel
    pub channel_capacity: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            auto_deal: true,
            channel_capacity: 100,
        }
    }
}

impl SessionConfig {
    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.channel_capacity == 0 {
            return Err("Channel capacity must be at least 1".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_valid() {
        let config = SessionConfig::default();
        assert!(config.auto_deal);
        assert_eq!(config.channel_capacity, 100);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_capacity_invalid() {
        let config = SessionConfig {
            channel_capacity: 0,
            ..SessionConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
