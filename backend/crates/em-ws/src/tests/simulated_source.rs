use crate::{
    EventKind, EventPayload, EventSource, SimulatedTelemetrySource, SimulatorConfig, WsError,
};

use std::time::Duration;

use futures::StreamExt;
use tokio::time::timeout;

fn config(probability: f64) -> SimulatorConfig {
    SimulatorConfig {
        min_interval: Duration::from_millis(1),
        max_interval: Duration::from_millis(3),
        device_status_probability: probability,
        alert_probability: probability,
        budget_update_probability: probability,
        ..SimulatorConfig::default()
    }
}

#[test]
fn given_zero_probabilities_when_ticked_then_only_telemetry() {
    let mut source = SimulatedTelemetrySource::with_seed(config(0.0), 7).unwrap();

    for _ in 0..20 {
        let events = source.tick();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind(), EventKind::Telemetry);
    }
}

#[test]
fn given_certain_probabilities_when_ticked_then_every_kind_in_order() {
    let mut source = SimulatedTelemetrySource::with_seed(config(1.0), 7).unwrap();

    let kinds: Vec<EventKind> = source.tick().iter().map(|e| e.kind()).collect();

    assert_eq!(
        kinds,
        vec![
            EventKind::Telemetry,
            EventKind::DeviceStatus,
            EventKind::Alert,
            EventKind::BudgetUpdate,
        ]
    );
}

#[test]
fn given_generated_events_when_inspected_then_fields_within_documented_ranges() {
    let mut source = SimulatedTelemetrySource::with_seed(config(1.0), 42).unwrap();
    let devices = SimulatorConfig::default().devices;

    for _ in 0..50 {
        for event in source.tick() {
            match event.payload() {
                EventPayload::Telemetry(reading) => {
                    assert!(devices.contains(&reading.device_id));
                }
                EventPayload::DeviceStatus(update) => {
                    assert!(devices.contains(&update.id));
                }
                EventPayload::Alert(notice) => {
                    assert!(notice.id.starts_with("alert-"));
                    assert!(!notice.read);
                }
                EventPayload::BudgetUpdate(usage) => {
                    assert!(["budget-1", "budget-2", "budget-3"].contains(&usage.id.as_str()));
                    assert!((50.0..150.0).contains(&usage.usage));
                }
                other => panic!("unexpected payload {other:?}"),
            }
        }
    }
}

#[test]
fn given_interval_bounds_when_delay_drawn_then_within_bounds() {
    let mut source = SimulatedTelemetrySource::with_seed(config(0.0), 3).unwrap();

    for _ in 0..100 {
        let delay = source.next_delay();
        assert!(delay >= Duration::from_millis(1));
        assert!(delay <= Duration::from_millis(3));
    }
}

#[test]
fn given_no_devices_when_created_then_invalid_config() {
    let result = SimulatedTelemetrySource::with_seed(
        SimulatorConfig {
            devices: vec![],
            ..SimulatorConfig::default()
        },
        1,
    );

    assert!(matches!(result, Err(WsError::InvalidConfig { .. })));
}

#[test]
fn given_nan_probability_when_created_then_invalid_config() {
    let result = SimulatedTelemetrySource::with_seed(
        SimulatorConfig {
            alert_probability: f64::NAN,
            ..SimulatorConfig::default()
        },
        7,
    );

    match result {
        Err(WsError::InvalidConfig { message, .. }) => {
            assert!(message.contains("alert_probability"))
        }
        other => panic!("expected InvalidConfig, got {:?}", other.err()),
    }
}

#[test]
fn given_probability_outside_unit_range_when_created_then_invalid_config() {
    for probability in [-0.1, 1.5, f64::INFINITY] {
        let result = SimulatedTelemetrySource::with_seed(
            SimulatorConfig {
                budget_update_probability: probability,
                ..SimulatorConfig::default()
            },
            7,
        );

        assert!(
            matches!(result, Err(WsError::InvalidConfig { .. })),
            "{probability} should be rejected"
        );
    }
}

#[test]
fn given_inverted_interval_when_created_then_invalid_config() {
    let result = SimulatedTelemetrySource::with_seed(
        SimulatorConfig {
            min_interval: Duration::from_millis(10),
            max_interval: Duration::from_millis(5),
            ..SimulatorConfig::default()
        },
        1,
    );

    assert!(matches!(result, Err(WsError::InvalidConfig { .. })));
}

#[tokio::test]
async fn given_source_when_streamed_then_yields_events_lazily() {
    let source = SimulatedTelemetrySource::with_seed(config(0.0), 11).unwrap();

    let events: Vec<_> = timeout(Duration::from_secs(1), source.into_stream().take(3).collect())
        .await
        .expect("stream should produce quickly");

    assert_eq!(events.len(), 3);
    assert!(events
        .iter()
        .all(|event| matches!(event, Ok(e) if e.kind() == EventKind::Telemetry)));
}
