//! Configuration types for Arbiter.

use arbiter_monitor::DeadlockMonitorConfig;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::{error::ArbiterError, Result};

/// Configuration for the [`Arbiter`](crate::Arbiter) facade.
///
/// Every section falls back to its defaults when missing from serialized
/// input.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArbiterConfig {
    /// Ledger configuration.
    pub ledger: LedgerConfig,

    /// Request handling configuration.
    pub requests: RequestConfig,

    /// Deadlock monitor configuration.
    pub monitor: MonitorConfig,
}

impl ArbiterConfig {
    /// Checks the configuration for values the engine cannot run with.
    ///
    /// # Errors
    ///
    /// [`ArbiterError::Config`] for an empty capacity vector, a zero poll
    /// interval or a zero channel capacity.
    pub fn validate(&self) -> Result<()> {
        if self.ledger.capacities.is_empty() {
            return Err(ArbiterError::Config(
                "at least one resource type is required".to_string(),
            ));
        }
        if self.monitor.poll_interval_ms == 0 {
            return Err(ArbiterError::Config(
                "monitor poll interval must be positive".to_string(),
            ));
        }
        if self.monitor.channel_capacity == 0 {
            return Err(ArbiterError::Config(
                "monitor channel capacity must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Parses and validates a JSON configuration.
    ///
    /// Missing sections and fields take their defaults.
    ///
    /// # Errors
    ///
    /// [`ArbiterError::Config`] if the input is not valid JSON for this
    /// shape or fails [`validate`](Self::validate).
    pub fn from_json(input: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(input).map_err(|e| ArbiterError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }
}

/// Ledger configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// Units per resource type. Also the capacities a reset restores.
    pub capacities: Vec<u32>,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            capacities: vec![10, 5, 7],
        }
    }
}

/// How requests are decided.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum RequestMode {
    /// Grant only if the resulting state is safe (Banker's algorithm).
    #[default]
    Banker,
    /// Grant whenever the units are physically available.
    Immediate,
}

/// Request handling configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RequestConfig {
    /// Mode used by [`Arbiter::request`](crate::Arbiter::request).
    pub mode: RequestMode,
}

/// Deadlock monitor configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Milliseconds between polls.
    pub poll_interval_ms: u64,

    /// Alerts buffered before new ones are dropped.
    pub channel_capacity: usize,
}

impl MonitorConfig {
    /// Converts to the monitor crate's builder config.
    pub fn to_monitor_config(&self) -> DeadlockMonitorConfig {
        DeadlockMonitorConfig::new()
            .with_poll_interval(Duration::from_millis(self.poll_interval_ms))
            .with_channel_capacity(self.channel_capacity)
    }
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 1500,
            channel_capacity: 16,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ArbiterConfig::default();
        assert_eq!(config.ledger.capacities, vec![10, 5, 7]);
        assert_eq!(config.requests.mode, RequestMode::Banker);
        assert_eq!(config.monitor.poll_interval_ms, 1500);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_serialization() {
        let config = ArbiterConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let parsed: ArbiterConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let parsed: ArbiterConfig =
            serde_json::from_str(r#"{ "requests": { "mode": "Immediate" } }"#).unwrap();
        assert_eq!(parsed.requests.mode, RequestMode::Immediate);
        assert_eq!(parsed.ledger.capacities, vec![10, 5, 7]);
        assert_eq!(parsed.monitor.channel_capacity, 16);
    }

    #[test]
    fn test_from_json_validates() {
        let config = ArbiterConfig::from_json(r#"{ "ledger": { "capacities": [1, 1] } }"#).unwrap();
        assert_eq!(config.ledger.capacities, vec![1, 1]);

        assert!(ArbiterConfig::from_json(r#"{ "ledger": { "capacities": [] } }"#).is_err());
        assert!(ArbiterConfig::from_json("not json").is_err());
    }

    #[test]
    fn test_invalid_configs() {
        let mut config = ArbiterConfig::default();
        config.ledger.capacities.clear();
        assert!(matches!(config.validate(), Err(ArbiterError::Config(_))));

        let mut config = ArbiterConfig::default();
        config.monitor.poll_interval_ms = 0;
        assert!(config.validate().is_err());

        let mut config = ArbiterConfig::default();
        config.monitor.channel_capacity = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_monitor_config_conversion() {
        let config = MonitorConfig {
            poll_interval_ms: 250,
            channel_capacity: 3,
        };
        let converted = config.to_monitor_config();
        assert_eq!(converted.poll_interval, Duration::from_millis(250));
        assert_eq!(converted.channel_capacity, 3);
    }
}
