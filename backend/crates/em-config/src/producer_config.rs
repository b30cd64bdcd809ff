use crate::{ConfigError, ConfigErrorResult};

use serde::Deserialize;

pub const DEFAULT_MIN_INTERVAL_MS: u64 = 1000;
pub const DEFAULT_MAX_INTERVAL_MS: u64 = 5000;
pub const MAX_INTERVAL_MS: u64 = 3_600_000;
pub const DEFAULT_DEVICE_STATUS_PROBABILITY: f64 = 0.2;
pub const DEFAULT_ALERT_PROBABILITY: f64 = 0.1;
pub const DEFAULT_BUDGET_UPDATE_PROBABILITY: f64 = 0.1;
pub const DEFAULT_ERROR_BACKOFF_MS: u64 = 1000;

/// Simulated telemetry producer settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ProducerConfig {
    pub enabled: bool,
    pub min_interval_ms: u64,
    pub max_interval_ms: u64,
    pub device_status_probability: f64,
    pub alert_probability: f64,
    pub budget_update_probability: f64,
    /// Pause after a producer failure before pulling again
    pub error_backoff_ms: u64,
    pub devices: Vec<String>,
}

impl Default for ProducerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            min_interval_ms: DEFAULT_MIN_INTERVAL_MS,
            max_interval_ms: DEFAULT_MAX_INTERVAL_MS,
            device_status_probability: DEFAULT_DEVICE_STATUS_PROBABILITY,
            alert_probability: DEFAULT_ALERT_PROBABILITY,
            budget_update_probability: DEFAULT_BUDGET_UPDATE_PROBABILITY,
            error_backoff_ms: DEFAULT_ERROR_BACKOFF_MS,
            devices: vec![
                String::from("device1"),
                String::from("device2"),
                String::from("device3"),
            ],
        }
    }
}

impl ProducerConfig {
    pub fn validate(&self) -> ConfigErrorResult<()> {
        if self.min_interval_ms == 0 {
            return Err(ConfigError::producer(
                "producer.min_interval_ms must be at least 1",
            ));
        }

        if self.max_interval_ms > MAX_INTERVAL_MS {
            return Err(ConfigError::producer(format!(
                "producer.max_interval_ms must be at most {}, got {}",
                MAX_INTERVAL_MS, self.max_interval_ms
            )));
        }

        if self.min_interval_ms > self.max_interval_ms {
            return Err(ConfigError::producer(format!(
                "producer.min_interval_ms ({}) must not exceed max_interval_ms ({})",
                self.min_interval_ms, self.max_interval_ms
            )));
        }

        for (name, value) in [
            ("device_status_probability", self.device_status_probability),
            ("alert_probability", self.alert_probability),
            ("budget_update_probability", self.budget_update_probability),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::producer(format!(
                    "producer.{} must be within 0.0-1.0, got {}",
                    name, value
                )));
            }
        }

        if self.devices.is_empty() || self.devices.iter().any(|d| d.trim().is_empty()) {
            return Err(ConfigError::producer(
                "producer.devices must list at least one non-empty device id",
            ));
        }

        Ok(())
    }
}
