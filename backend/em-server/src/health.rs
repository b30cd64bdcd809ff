use em_ws::AppState;

use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use metrics_exporter_prometheus::PrometheusHandle;
use serde_json::json;

/// GET /health - Service status with the live session count
pub async fn health(State(state): State<AppState>) -> Response {
    let sessions = state.registry.snapshot_count().await;
    let status = if state.shutdown.is_shutdown() {
        "shutting_down"
    } else {
        "healthy"
    };

    let health = json!({
        "status": status,
        "version": env!("CARGO_PKG_VERSION"),
        "components": {
            "websocket": "operational",
            "auth": if state.token_verifier.is_some() { "enabled" } else { "disabled" },
        },
        "connections": sessions,
        "timestamp": chrono::Utc::now().to_rfc3339(),
    });

    (StatusCode::OK, Json(health)).into_response()
}

/// GET /live - Liveness probe (is the process alive?)
pub async fn liveness() -> Response {
    (StatusCode::OK, "OK").into_response()
}

/// GET /ready - Readiness probe (accepting new sessions?)
pub async fn readiness(State(state): State<AppState>) -> Response {
    if state.shutdown.is_shutdown() {
        return (StatusCode::SERVICE_UNAVAILABLE, "Shutting down").into_response();
    }
    if !state.registry.has_capacity().await {
        return (StatusCode::SERVICE_UNAVAILABLE, "At capacity").into_response();
    }
    (StatusCode::OK, "Ready").into_response()
}

/// GET /metrics - Prometheus text exposition
pub async fn metrics(State(handle): State<PrometheusHandle>) -> Response {
    (StatusCode::OK, handle.render()).into_response()
}
