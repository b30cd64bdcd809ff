use crate::{
    AlertNotice, AlertType, BudgetUsage, DeviceStatus, DeviceStatusUpdate, Event, EventSource,
    EventStream, Result as WsErrorResult, SimulatorConfig, TelemetryReading, WsError,
};

use std::collections::VecDeque;
use std::panic::Location;
use std::time::Duration;

use chrono::Utc;
use error_location::ErrorLocation;
use futures::StreamExt;
use futures::stream;
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::{Rng, SeedableRng};

const ALERT_MESSAGES: [&str; 4] = [
    "Energy usage exceeded budget",
    "Unusual energy consumption detected",
    "Device connection lost",
    "System maintenance required",
];

const ALERT_TYPES: [AlertType; 3] = [AlertType::Budget, AlertType::Anomaly, AlertType::System];

const MIN_READING_KW: f64 = 0.5;
const MAX_READING_KW: f64 = 10.0;

/// Random energy readings in place of real meters.
///
/// Each tick waits a random pause, then always yields one telemetry reading
/// and, each with its own probability, a device status change, an alert and
/// a budget update.
pub struct SimulatedTelemetrySource {
    config: SimulatorConfig,
    rng: StdRng,
    pending: VecDeque<Event>,
}

impl SimulatedTelemetrySource {
    pub fn new(config: SimulatorConfig) -> WsErrorResult<Self> {
        Self::with_rng(config, StdRng::from_os_rng())
    }

    /// Deterministic source for tests and demos
    pub fn with_seed(config: SimulatorConfig, seed: u64) -> WsErrorResult<Self> {
        Self::with_rng(config, StdRng::seed_from_u64(seed))
    }

    fn with_rng(config: SimulatorConfig, rng: StdRng) -> WsErrorResult<Self> {
        if config.devices.is_empty() {
            return Err(WsError::InvalidConfig {
                message: "simulator needs at least one device".to_string(),
                location: ErrorLocation::from(Location::caller()),
            });
        }
        if config.min_interval > config.max_interval {
            return Err(WsError::InvalidConfig {
                message: format!(
                    "min_interval {:?} exceeds max_interval {:?}",
                    config.min_interval, config.max_interval
                ),
                location: ErrorLocation::from(Location::caller()),
            });
        }
        for (name, probability) in [
            ("device_status_probability", config.device_status_probability),
            ("alert_probability", config.alert_probability),
            ("budget_update_probability", config.budget_update_probability),
        ] {
            if !(0.0..=1.0).contains(&probability) {
                return Err(WsError::InvalidConfig {
                    message: format!("{name} must be within [0, 1], got {probability}"),
                    location: ErrorLocation::from(Location::caller()),
                });
            }
        }

        Ok(Self {
            config,
            rng,
            pending: VecDeque::new(),
        })
    }

    /// Pause before the next tick
    pub fn next_delay(&mut self) -> Duration {
        let min = self.config.min_interval.as_millis() as u64;
        let max = self.config.max_interval.as_millis() as u64;
        Duration::from_millis(self.rng.random_range(min..=max))
    }

    /// Everything one tick produces, telemetry first
    pub fn tick(&mut self) -> Vec<Event> {
        let mut events = vec![Event::telemetry(self.reading())];

        if self.chance(self.config.device_status_probability) {
            events.push(Event::device_status(self.device_status()));
        }
        if self.chance(self.config.alert_probability) {
            events.push(Event::alert(self.alert()));
        }
        if self.chance(self.config.budget_update_probability) {
            events.push(Event::budget_update(self.budget_usage()));
        }

        events
    }

    fn chance(&mut self, probability: f64) -> bool {
        self.rng.random_bool(probability)
    }

    fn device(&mut self) -> String {
        self.config
            .devices
            .choose(&mut self.rng)
            .cloned()
            .unwrap_or_default()
    }

    fn reading(&mut self) -> TelemetryReading {
        let raw: f64 = self.rng.random_range(MIN_READING_KW..=MAX_READING_KW);
        TelemetryReading {
            timestamp: Utc::now(),
            value: (raw * 100.0).round() / 100.0,
            device_id: self.device(),
        }
    }

    fn device_status(&mut self) -> DeviceStatusUpdate {
        let status = if self.rng.random_bool(0.5) {
            DeviceStatus::Online
        } else {
            DeviceStatus::Offline
        };
        DeviceStatusUpdate {
            id: self.device(),
            status,
        }
    }

    fn alert(&mut self) -> AlertNotice {
        let now = Utc::now();
        AlertNotice {
            id: format!("alert-{}", now.timestamp()),
            alert_type: ALERT_TYPES
                .choose(&mut self.rng)
                .copied()
                .unwrap_or(AlertType::System),
            message: ALERT_MESSAGES
                .choose(&mut self.rng)
                .copied()
                .unwrap_or(ALERT_MESSAGES[0])
                .to_string(),
            timestamp: now,
            read: false,
        }
    }

    fn budget_usage(&mut self) -> BudgetUsage {
        BudgetUsage {
            id: format!("budget-{}", self.rng.random_range(1..=3)),
            usage: self.rng.random_range(50.0..150.0),
        }
    }
}

impl EventSource for SimulatedTelemetrySource {
    fn into_stream(self) -> EventStream {
        stream::unfold(self, |mut source| async move {
            if source.pending.is_empty() {
                tokio::time::sleep(source.next_delay()).await;
                let batch = source.tick();
                source.pending.extend(batch);
            }
            let Some(event) = source.pending.pop_front() else {
                return None;
            };
            Some((Ok(event), source))
        })
        .boxed()
    }
}
