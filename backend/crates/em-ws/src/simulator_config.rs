use std::time::Duration;

/// Tuning for the simulated telemetry producer
#[derive(Debug, Clone)]
pub struct SimulatorConfig {
    /// Lower bound of the pause between ticks
    pub min_interval: Duration,
    /// Upper bound of the pause between ticks
    pub max_interval: Duration,
    pub device_status_probability: f64,
    pub alert_probability: f64,
    pub budget_update_probability: f64,
    pub devices: Vec<String>,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            min_interval: Duration::from_millis(1000),
            max_interval: Duration::from_millis(5000),
            device_status_probability: 0.2,
            alert_probability: 0.1,
            budget_update_probability: 0.1,
            devices: vec![
                "device1".to_string(),
                "device2".to_string(),
                "device3".to_string(),
            ],
        }
    }
}
