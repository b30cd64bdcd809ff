use crate::{
    AlertNotice, BudgetUsage, DeviceStatusUpdate, EventKind, EventPayload, TelemetryReading,
};

use chrono::{DateTime, Utc};

/// Immutable value pushed to clients. The kind is derived from the payload,
/// so a kind without its matching payload cannot be built.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    payload: EventPayload,
    emitted_at: DateTime<Utc>,
}

impl Event {
    pub fn new(payload: EventPayload) -> Self {
        Self::at(payload, Utc::now())
    }

    pub fn at(payload: EventPayload, emitted_at: DateTime<Utc>) -> Self {
        Self {
            payload,
            emitted_at,
        }
    }

    pub fn connection_established(authenticated: bool) -> Self {
        Self::new(EventPayload::ConnectionEstablished { authenticated })
    }

    pub fn heartbeat() -> Self {
        Self::new(EventPayload::Heartbeat)
    }

    pub fn telemetry(reading: TelemetryReading) -> Self {
        Self::new(EventPayload::Telemetry(reading))
    }

    pub fn device_status(update: DeviceStatusUpdate) -> Self {
        Self::new(EventPayload::DeviceStatus(update))
    }

    pub fn alert(notice: AlertNotice) -> Self {
        Self::new(EventPayload::Alert(notice))
    }

    pub fn budget_update(usage: BudgetUsage) -> Self {
        Self::new(EventPayload::BudgetUpdate(usage))
    }

    pub fn kind(&self) -> EventKind {
        match &self.payload {
            EventPayload::ConnectionEstablished { .. } => EventKind::ConnectionEstablished,
            EventPayload::Heartbeat => EventKind::Heartbeat,
            EventPayload::Telemetry(_) => EventKind::Telemetry,
            EventPayload::DeviceStatus(_) => EventKind::DeviceStatus,
            EventPayload::Alert(_) => EventKind::Alert,
            EventPayload::BudgetUpdate(_) => EventKind::BudgetUpdate,
        }
    }

    pub fn payload(&self) -> &EventPayload {
        &self.payload
    }

    pub fn emitted_at(&self) -> DateTime<Utc> {
        self.emitted_at
    }
}
