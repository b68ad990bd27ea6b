//! Observer configuration.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ObserverError;

/// Tunables for the pollers. Durations are in milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ObserverConfig {
    /// Transaction lookups before giving up on confirmation.
    pub confirm_attempts: u32,
    /// Hard upper bound for one block-advance wait.
    pub block_wait_timeout_ms: u64,
    /// Tick between height queries while waiting for a block.
    pub block_poll_interval_ms: u64,
    /// Sleep between object lifecycle queries. Should match the chain's
    /// expected block output interval.
    pub object_poll_interval_ms: u64,
}

impl Default for ObserverConfig {
    fn default() -> Self {
        Self {
            confirm_attempts: 5,
            block_wait_timeout_ms: 5_000,
            block_poll_interval_ms: 1_000,
            object_poll_interval_ms: 2_000,
        }
    }
}

impl ObserverConfig {
    pub fn block_wait_timeout(&self) -> Duration {
        Duration::from_millis(self.block_wait_timeout_ms)
    }

    pub fn block_poll_interval(&self) -> Duration {
        Duration::from_millis(self.block_poll_interval_ms)
    }

    pub fn object_poll_interval(&self) -> Duration {
        Duration::from_millis(self.object_poll_interval_ms)
    }

    /// Reject values that would make a poller spin or never tick.
    pub fn validate(&self) -> Result<(), ObserverError> {
        let invalid = |msg: &str| Err(ObserverError::InvalidArgument(msg.to_string()));
        if self.confirm_attempts == 0 {
            return invalid("confirm_attempts must be at least 1");
        }
        if self.block_wait_timeout_ms == 0 {
            return invalid("block_wait_timeout_ms must be non-zero");
        }
        if self.block_poll_interval_ms == 0 {
            return invalid("block_poll_interval_ms must be non-zero");
        }
        if self.object_poll_interval_ms == 0 {
            return invalid("object_poll_interval_ms must be non-zero");
        }
        if self.block_poll_interval_ms > self.block_wait_timeout_ms {
            return invalid("block_poll_interval_ms must not exceed block_wait_timeout_ms");
        }
        Ok(())
    }

    /// Parse a JSON document. Missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, ObserverError> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| ObserverError::InvalidArgument(format!("config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ObserverError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            ObserverError::InvalidArgument(format!("config {}: {e}", path.display()))
        })?;
        Self::from_json_str(&content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = ObserverConfig::default();
        config.validate().unwrap();
        assert_eq!(config.confirm_attempts, 5);
        assert_eq!(config.block_wait_timeout(), Duration::from_secs(5));
        assert_eq!(config.block_poll_interval(), Duration::from_secs(1));
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config = ObserverConfig::from_json_str(r#"{"object_poll_interval_ms": 500}"#).unwrap();
        assert_eq!(config.object_poll_interval(), Duration::from_millis(500));
        assert_eq!(config.confirm_attempts, 5);
    }

    #[test]
    fn zero_attempts_rejected() {
        let err = ObserverConfig::from_json_str(r#"{"confirm_attempts": 0}"#).unwrap_err();
        assert!(matches!(err, ObserverError::InvalidArgument(_)));
    }

    #[test]
    fn tick_longer_than_deadline_rejected() {
        let config = ObserverConfig {
            block_poll_interval_ms: 10_000,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn malformed_json_rejected() {
        assert!(ObserverConfig::from_json_str("{not json").is_err());
    }
}
