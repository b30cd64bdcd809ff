use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kind-specific body of an event. Lifecycle kinds carry no body.
#[derive(Debug, Clone, PartialEq)]
pub enum EventPayload {
    ConnectionEstablished { authenticated: bool },
    Heartbeat,
    Telemetry(TelemetryReading),
    DeviceStatus(DeviceStatusUpdate),
    Alert(AlertNotice),
    BudgetUpdate(BudgetUsage),
}

/// One power reading from a device
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TelemetryReading {
    pub timestamp: DateTime<Utc>,
    /// Kilowatts, two decimal places
    pub value: f64,
    pub device_id: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceStatus {
    Online,
    Offline,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceStatusUpdate {
    pub id: String,
    pub status: DeviceStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertType {
    Budget,
    Anomaly,
    System,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertNotice {
    pub id: String,
    #[serde(rename = "type")]
    pub alert_type: AlertType,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub read: bool,
}

/// Percentage of a budget consumed so far
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetUsage {
    pub id: String,
    pub usage: f64,
}
