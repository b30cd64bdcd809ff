use serde::{Deserialize, Serialize};

/// The closed set of event kinds a dashboard client can receive.
///
/// Telemetry travels on the wire as `energy_data`; `telemetry` is accepted
/// when decoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    ConnectionEstablished,
    Heartbeat,
    #[serde(rename = "energy_data", alias = "telemetry")]
    Telemetry,
    DeviceStatus,
    Alert,
    BudgetUpdate,
}

impl EventKind {
    pub const ALL: [EventKind; 6] = [
        EventKind::ConnectionEstablished,
        EventKind::Heartbeat,
        EventKind::Telemetry,
        EventKind::DeviceStatus,
        EventKind::Alert,
        EventKind::BudgetUpdate,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ConnectionEstablished => "connection_established",
            Self::Heartbeat => "heartbeat",
            Self::Telemetry => "energy_data",
            Self::DeviceStatus => "device_status",
            Self::Alert => "alert",
            Self::BudgetUpdate => "budget_update",
        }
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
