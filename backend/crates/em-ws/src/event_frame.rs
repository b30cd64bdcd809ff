use crate::{
    AlertNotice, BudgetUsage, DeviceStatusUpdate, Event, EventKind, EventPayload, Result,
    TelemetryReading,
};

use std::sync::Arc;

use serde::Serialize;

/// An event serialized once for the wire. Cloning shares the text.
#[derive(Debug, Clone)]
pub struct EventFrame {
    kind: EventKind,
    text: Arc<str>,
}

#[derive(Serialize)]
struct WireFrame<'a> {
    #[serde(rename = "type")]
    kind: EventKind,
    /// Seconds since the Unix epoch, fractional
    timestamp: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    authenticated: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    payload: Option<WirePayload<'a>>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum WirePayload<'a> {
    Telemetry(&'a TelemetryReading),
    DeviceStatus(&'a DeviceStatusUpdate),
    Alert(&'a AlertNotice),
    BudgetUpdate(&'a BudgetUsage),
}

impl EventFrame {
    #[track_caller]
    pub fn encode(event: &Event) -> Result<Self> {
        let (authenticated, payload) = match event.payload() {
            EventPayload::ConnectionEstablished { authenticated } => (Some(*authenticated), None),
            EventPayload::Heartbeat => (None, None),
            EventPayload::Telemetry(reading) => (None, Some(WirePayload::Telemetry(reading))),
            EventPayload::DeviceStatus(update) => {
                (None, Some(WirePayload::DeviceStatus(update)))
            }
            EventPayload::Alert(notice) => (None, Some(WirePayload::Alert(notice))),
            EventPayload::BudgetUpdate(usage) => (None, Some(WirePayload::BudgetUpdate(usage))),
        };

        let wire = WireFrame {
            kind: event.kind(),
            timestamp: event.emitted_at().timestamp_micros() as f64 / 1_000_000.0,
            authenticated,
            payload,
        };

        let text = serde_json::to_string(&wire)?;
        Ok(Self {
            kind: event.kind(),
            text: Arc::from(text),
        })
    }

    pub fn kind(&self) -> EventKind {
        self.kind
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}
