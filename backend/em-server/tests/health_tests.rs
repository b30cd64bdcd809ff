use em_config::Config;
use em_server::{TelemetryService, build_router};

use axum_test::TestServer;
use metrics_exporter_prometheus::PrometheusBuilder;
use serde_json::Value;

fn test_server() -> (TestServer, TelemetryService) {
    let mut config = Config::default();
    config.producer.enabled = false;
    let service = TelemetryService::from_config(&config).expect("service builds");
    let handle = PrometheusBuilder::new().build_recorder().handle();
    let app = build_router(service.app_state.clone(), handle);
    let server = TestServer::builder()
        .http_transport()
        .build(app)
        .expect("Failed to create test server");
    (server, service)
}

#[tokio::test]
async fn given_running_server_when_health_requested_then_healthy_with_zero_connections() {
    let (server, _service) = test_server();

    let response = server.get("/health").await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["connections"], 0);
    assert_eq!(body["components"]["auth"], "disabled");
}

#[tokio::test]
async fn given_running_server_when_probes_requested_then_ok() {
    let (server, _service) = test_server();

    server.get("/live").await.assert_status_ok();
    server.get("/ready").await.assert_status_ok();
}

#[tokio::test]
async fn given_shutdown_triggered_when_ready_requested_then_unavailable() {
    let (server, service) = test_server();
    service.app_state.shutdown.shutdown();

    server
        .get("/ready")
        .expect_failure()
        .await
        .assert_status_service_unavailable();
}

#[tokio::test]
async fn given_running_server_when_metrics_requested_then_ok() {
    let (server, _service) = test_server();

    server.get("/metrics").await.assert_status_ok();
}

#[tokio::test]
async fn given_client_connected_when_health_requested_then_connection_counted() {
    let (server, service) = test_server();

    let mut ws = server
        .get_websocket("/ws")
        .await
        .into_websocket()
        .await;
    let greeting: Value = ws.receive_json().await;
    assert_eq!(greeting["type"], "connection_established");

    let registry = service.app_state.registry.clone();
    tokio::time::timeout(std::time::Duration::from_secs(2), async {
        while registry.snapshot_count().await != 1 {
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("session should register");

    let body: Value = server.get("/health").await.json();
    assert_eq!(body["connections"], 1);
    ws.close().await;
}
