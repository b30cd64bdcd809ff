use crate::health;

use em_ws::AppState;

use axum::{Router, routing::get};
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::cors::{Any, CorsLayer};

/// Build the application router with all endpoints
pub fn build_router(state: AppState, metrics_handle: PrometheusHandle) -> Router {
    let metrics_routes = Router::new()
        .route("/metrics", get(health::metrics))
        .with_state(metrics_handle);

    Router::new()
        // WebSocket endpoint
        .route("/ws", get(em_ws::handler))
        // Health check endpoints
        .route("/health", get(health::health))
        .route("/live", get(health::liveness))
        .route("/ready", get(health::readiness))
        .with_state(state)
        .merge(metrics_routes)
        // CORS middleware (allow all origins for the dashboard)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
}
