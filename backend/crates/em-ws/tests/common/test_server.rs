#![allow(dead_code)]

use em_auth::{JwtValidator, TokenVerifier};
use em_ws::{
    AppState, BroadcastConfig, ConnectionConfig, ConnectionLimits, ConnectionRegistry, Metrics,
    ShutdownCoordinator,
};

use std::sync::Arc;
use std::time::Duration;

use axum::{Router, routing::get};
use axum_test::TestServer;

/// Default JWT secret for all tests (HS256 requires at least 32 bytes)
pub const TEST_JWT_SECRET: &[u8] = b"test-secret-key-for-integration-tests-min-32-bytes-long";

/// Configuration for test server instances
#[derive(Debug, Clone)]
pub struct TestServerConfig {
    pub jwt_secret: Option<Vec<u8>>,
    pub max_connections_total: usize,
    pub send_buffer_size: usize,
    pub send_timeout: Duration,
    pub heartbeat_interval: Duration,
    pub heartbeat_timeout: Duration,
}

impl Default for TestServerConfig {
    fn default() -> Self {
        Self {
            jwt_secret: Some(TEST_JWT_SECRET.to_vec()),
            max_connections_total: 100,
            send_buffer_size: 100,
            send_timeout: Duration::from_millis(250),
            heartbeat_interval: Duration::from_secs(30),
            heartbeat_timeout: Duration::from_secs(90),
        }
    }
}

impl TestServerConfig {
    /// Create config with authentication disabled
    pub fn with_auth_disabled() -> Self {
        Self {
            jwt_secret: None,
            ..Default::default()
        }
    }

    /// Create config with strict connection limits (for limit tests)
    pub fn with_strict_limits() -> Self {
        Self {
            max_connections_total: 2,
            ..Default::default()
        }
    }

    /// Create config with a fast heartbeat (for liveness tests)
    pub fn with_fast_heartbeat() -> Self {
        Self {
            heartbeat_interval: Duration::from_millis(50),
            heartbeat_timeout: Duration::from_secs(5),
            ..Default::default()
        }
    }
}

/// Test server with access to AppState for testing
pub struct TestServerWithState {
    pub server: TestServer,
    pub app_state: AppState,
}

impl TestServerWithState {
    /// Wait until the registry holds exactly `expected` sessions
    pub async fn wait_for_sessions(&self, expected: usize) {
        let registry = &self.app_state.registry;
        let reached = tokio::time::timeout(Duration::from_secs(2), async {
            while registry.snapshot_count().await != expected {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await;
        assert!(
            reached.is_ok(),
            "registry never reached {expected} sessions (has {})",
            registry.snapshot_count().await
        );
    }
}

/// Create a TestServer with default configuration
pub fn create_test_server() -> TestServerWithState {
    create_test_server_with_config(TestServerConfig::default())
}

/// Create a TestServer with custom configuration
pub fn create_test_server_with_config(config: TestServerConfig) -> TestServerWithState {
    let (app, app_state) = create_app(config);
    let server = TestServer::builder()
        .http_transport()
        .build(app)
        .expect("Failed to create test server");

    TestServerWithState { server, app_state }
}

/// Build the Axum Router with AppState
fn create_app(config: TestServerConfig) -> (Router, AppState) {
    let token_verifier: Option<Arc<dyn TokenVerifier>> = config
        .jwt_secret
        .map(|secret| Arc::new(JwtValidator::with_hs256(&secret)) as Arc<dyn TokenVerifier>);

    let metrics = Metrics::default();

    let registry = ConnectionRegistry::new(
        ConnectionLimits {
            max_total: config.max_connections_total,
        },
        BroadcastConfig {
            send_timeout: config.send_timeout,
        },
        metrics.clone(),
    );

    let connection_config = ConnectionConfig {
        send_buffer_size: config.send_buffer_size,
        heartbeat_interval: config.heartbeat_interval,
        heartbeat_timeout: config.heartbeat_timeout,
    };

    let app_state = AppState {
        token_verifier,
        registry,
        metrics,
        shutdown: ShutdownCoordinator::new(),
        config: connection_config,
    };

    let router = Router::new()
        .route("/ws", get(em_ws::handler))
        .with_state(app_state.clone());

    (router, app_state)
}
