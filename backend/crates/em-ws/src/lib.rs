pub mod app_state;
pub mod broadcast_config;
pub mod broadcast_coordinator;
pub mod broadcast_report;
pub mod close_reason;
pub mod connection_config;
pub mod connection_id;
pub mod connection_limits;
pub mod connection_registry;
pub mod error;
pub mod event;
pub mod event_frame;
pub mod event_kind;
pub mod event_payload;
pub mod event_source;
pub mod heartbeat_scheduler;
pub mod metrics;
pub mod metrics_timer;
pub mod session;
pub mod session_state;
pub mod shutdown_coordinator;
pub mod shutdown_guard;
pub mod simulated_telemetry_source;
pub mod simulator_config;
pub mod web_socket_connection;

pub use app_state::{AppState, handler, resolve_identity};
pub use broadcast_config::BroadcastConfig;
pub use broadcast_coordinator::BroadcastCoordinator;
pub use broadcast_report::BroadcastReport;
pub use close_reason::CloseReason;
pub use connection_config::ConnectionConfig;
pub use connection_id::ConnectionId;
pub use connection_limits::ConnectionLimits;
pub use connection_registry::ConnectionRegistry;
pub use error::{Result, WsError};
pub use event::Event;
pub use event_frame::EventFrame;
pub use event_kind::EventKind;
pub use event_payload::{
    AlertNotice, AlertType, BudgetUsage, DeviceStatus, DeviceStatusUpdate, EventPayload,
    TelemetryReading,
};
pub use event_source::{EventSource, EventStream};
pub use heartbeat_scheduler::HeartbeatScheduler;
pub use metrics::Metrics;
pub use metrics_timer::MetricsTimer;
pub use session::Session;
pub use session_state::SessionState;
pub use shutdown_coordinator::ShutdownCoordinator;
pub use shutdown_guard::ShutdownGuard;
pub use simulated_telemetry_source::SimulatedTelemetrySource;
pub use simulator_config::SimulatorConfig;
pub use web_socket_connection::WebSocketConnection;

#[cfg(test)]
mod tests;
