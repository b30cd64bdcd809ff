mod simulated_source;

use crate::{
    BroadcastConfig, ConnectionId, ConnectionLimits, ConnectionRegistry, EventFrame, Metrics,
    Session,
};

use std::sync::Arc;
use std::time::Duration;

use em_auth::Identity;
use serde_json::Value;
use tokio::sync::mpsc;

pub(crate) const TEST_SEND_TIMEOUT: Duration = Duration::from_millis(50);

pub(crate) fn test_registry(max_total: usize) -> ConnectionRegistry {
    ConnectionRegistry::new(
        ConnectionLimits { max_total },
        BroadcastConfig {
            send_timeout: TEST_SEND_TIMEOUT,
        },
        Metrics::new(),
    )
}

pub(crate) fn new_session(buffer: usize) -> (Arc<Session>, mpsc::Receiver<EventFrame>) {
    let (tx, rx) = mpsc::channel(buffer);
    (Arc::new(Session::new(ConnectionId::new(), None, tx)), rx)
}

pub(crate) fn new_authenticated_session(
    buffer: usize,
    user_id: &str,
) -> (Arc<Session>, mpsc::Receiver<EventFrame>) {
    let (tx, rx) = mpsc::channel(buffer);
    let identity = Identity::new(user_id);
    (
        Arc::new(Session::new(ConnectionId::new(), Some(identity), tx)),
        rx,
    )
}

/// Register a fresh anonymous session
pub(crate) async fn open_session(
    registry: &ConnectionRegistry,
    buffer: usize,
) -> (Arc<Session>, mpsc::Receiver<EventFrame>) {
    let (session, rx) = new_session(buffer);
    registry
        .register(Arc::clone(&session))
        .await
        .expect("register should succeed");
    (session, rx)
}

pub(crate) fn parse(frame: &EventFrame) -> Value {
    serde_json::from_str(frame.text()).expect("frame should be valid JSON")
}
