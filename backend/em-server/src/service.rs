use crate::error::Result as ServerErrorResult;

use em_auth::{JwtValidator, TokenVerifier};
use em_config::{Config, ProducerConfig, WebSocketConfig};
use em_ws::{
    AppState, BroadcastConfig, BroadcastCoordinator, CloseReason, ConnectionConfig,
    ConnectionLimits, ConnectionRegistry, Metrics, ShutdownCoordinator, SimulatedTelemetrySource,
    SimulatorConfig,
};

use std::sync::Arc;
use std::time::Duration;

use log::{info, warn};

/// Everything the telemetry service runs: shared handler state plus the
/// production loop feeding it
pub struct TelemetryService {
    pub app_state: AppState,
    coordinator: BroadcastCoordinator,
    producer_enabled: bool,
}

impl TelemetryService {
    pub fn from_config(config: &Config) -> ServerErrorResult<Self> {
        let token_verifier: Option<Arc<dyn TokenVerifier>> = match &config.auth.jwt_secret {
            Some(secret) if config.auth.enabled => {
                info!("JWT: HS256 authentication enabled");
                Some(Arc::new(JwtValidator::with_hs256(secret.as_bytes())) as Arc<dyn TokenVerifier>)
            }
            _ => {
                warn!("Authentication DISABLED - every session is anonymous");
                None
            }
        };

        let metrics = Metrics::new();

        let registry = ConnectionRegistry::new(
            ConnectionLimits {
                max_total: config.server.max_connections,
            },
            BroadcastConfig {
                send_timeout: Duration::from_millis(config.websocket.send_timeout_ms),
            },
            metrics.clone(),
        );

        let source = SimulatedTelemetrySource::new(simulator_config(&config.producer))?;
        let coordinator = BroadcastCoordinator::new(
            registry.clone(),
            metrics.clone(),
            Duration::from_millis(config.producer.error_backoff_ms),
            source,
        );

        let app_state = AppState {
            token_verifier,
            registry,
            metrics,
            shutdown: ShutdownCoordinator::new(),
            config: connection_config(&config.websocket),
        };

        Ok(Self {
            app_state,
            coordinator,
            producer_enabled: config.producer.enabled,
        })
    }

    /// Start the production loop unless the producer is disabled
    pub fn start(&mut self) -> ServerErrorResult<()> {
        if !self.producer_enabled {
            warn!("Telemetry producer disabled - clients will only see heartbeats");
            return Ok(());
        }
        self.coordinator.start()?;
        info!("Telemetry producer started");
        Ok(())
    }

    pub fn is_producing(&self) -> bool {
        self.coordinator.is_running()
    }

    /// Stop producing, then close every session with a normal close
    pub async fn shutdown(mut self) {
        self.app_state.shutdown.shutdown();
        self.coordinator.stop().await;
        let closed = self
            .app_state
            .registry
            .close_all(CloseReason::ServerShutdown)
            .await;
        info!("Telemetry service stopped ({closed} sessions closed)");
    }
}

pub fn connection_config(websocket: &WebSocketConfig) -> ConnectionConfig {
    ConnectionConfig {
        send_buffer_size: websocket.send_buffer_size,
        heartbeat_interval: Duration::from_secs(websocket.heartbeat_interval_secs),
        heartbeat_timeout: Duration::from_secs(websocket.heartbeat_timeout_secs),
    }
}

pub fn simulator_config(producer: &ProducerConfig) -> SimulatorConfig {
    SimulatorConfig {
        min_interval: Duration::from_millis(producer.min_interval_ms),
        max_interval: Duration::from_millis(producer.max_interval_ms),
        device_status_probability: producer.device_status_probability,
        alert_probability: producer.alert_probability,
        budget_update_probability: producer.budget_update_probability,
        devices: producer.devices.clone(),
    }
}
