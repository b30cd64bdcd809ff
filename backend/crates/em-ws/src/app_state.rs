use crate::{
    CloseReason, ConnectionConfig, ConnectionId, ConnectionRegistry, Metrics,
    ShutdownCoordinator, WebSocketConnection,
};
use axum::{
    extract::{
        Query, State,
        ws::{WebSocket, WebSocketUpgrade},
    },
    http::{HeaderMap, StatusCode, header::AUTHORIZATION},
    response::Response,
};
use em_auth::{Identity, TokenVerifier};

use std::collections::HashMap;
use std::sync::Arc;

use log::{debug, error, warn};

/// Shared application state for WebSocket handlers
#[derive(Clone)]
pub struct AppState {
    /// None when authentication is disabled; every session is then anonymous
    pub token_verifier: Option<Arc<dyn TokenVerifier>>,
    pub registry: ConnectionRegistry,
    pub metrics: Metrics,
    pub shutdown: ShutdownCoordinator,
    pub config: ConnectionConfig,
}

/// WebSocket upgrade handler
pub async fn handler(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
    headers: HeaderMap,
    ws: WebSocketUpgrade,
) -> Result<Response, StatusCode> {
    if state.shutdown.is_shutdown() {
        return Err(StatusCode::SERVICE_UNAVAILABLE);
    }

    if !state.registry.has_capacity().await {
        warn!("Rejecting WebSocket upgrade: connection limit reached");
        state.metrics.error_occurred("connection_limit");
        return Err(StatusCode::SERVICE_UNAVAILABLE);
    }

    let identity = resolve_identity(&params, &headers, state.token_verifier.as_deref());
    let connection_id = ConnectionId::new();
    debug!(
        "WebSocket upgrade for session {connection_id} ({})",
        identity
            .as_ref()
            .map_or("anonymous", |identity| identity.user_id.as_str())
    );

    Ok(ws.on_upgrade(move |socket| handle_socket(socket, connection_id, identity, state)))
}

/// Resolve the caller's identity from a `token` query parameter, falling
/// back to an `Authorization: Bearer` header. Missing, invalid or
/// unverifiable tokens all yield an anonymous session.
pub fn resolve_identity(
    params: &HashMap<String, String>,
    headers: &HeaderMap,
    verifier: Option<&dyn TokenVerifier>,
) -> Option<Identity> {
    let token = params
        .get("token")
        .map(String::as_str)
        .filter(|token| !token.is_empty())
        .or_else(|| bearer_token(headers))?;

    let Some(verifier) = verifier else {
        debug!("Token supplied but authentication is disabled");
        return None;
    };

    verifier.verify(token)
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .filter(|token| !token.is_empty())
}

/// Handle WebSocket connection after upgrade
async fn handle_socket(
    socket: WebSocket,
    connection_id: ConnectionId,
    identity: Option<Identity>,
    state: AppState,
) {
    let shutdown_guard = state.shutdown.subscribe_guard();
    let connection = WebSocketConnection::new(
        connection_id,
        identity,
        state.config.clone(),
        state.registry.clone(),
        state.metrics.clone(),
    );

    // A panic inside the session is contained to its own task
    match tokio::spawn(connection.handle(socket, shutdown_guard)).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => error!("Session {connection_id} ended with error: {e}"),
        Err(e) => {
            error!("Session {connection_id} aborted: {e}");
            state.metrics.error_occurred("session_panic");
            state
                .registry
                .close(connection_id, CloseReason::InternalError)
                .await;
        }
    }
}
