use crate::{
    BroadcastConfig, BroadcastReport, CloseReason, ConnectionId, ConnectionLimits, Event,
    EventFrame, Metrics, MetricsTimer, Result as WsErrorResult, Session, WsError,
};

use std::collections::HashMap;
use std::panic::Location;
use std::sync::Arc;
use std::time::Duration;

use error_location::ErrorLocation;
use futures::future::join_all;
use log::{debug, error, info, warn};
use tokio::sync::{Mutex, RwLock};

/// Registry of open sessions and the fan-out point for broadcasts
pub struct ConnectionRegistry {
    inner: Arc<RwLock<RegistryInner>>,
    /// Held for the whole of a broadcast so every session sees events in
    /// broadcast-call order
    delivery: Arc<Mutex<()>>,
    limits: ConnectionLimits,
    broadcast_config: BroadcastConfig,
    metrics: Metrics,
}

struct RegistryInner {
    /// All open sessions by connection_id
    sessions: HashMap<ConnectionId, Arc<Session>>,
}

impl ConnectionRegistry {
    pub fn new(
        limits: ConnectionLimits,
        broadcast_config: BroadcastConfig,
        metrics: Metrics,
    ) -> Self {
        Self {
            inner: Arc::new(RwLock::new(RegistryInner {
                sessions: HashMap::new(),
            })),
            delivery: Arc::new(Mutex::new(())),
            limits,
            broadcast_config,
            metrics,
        }
    }

    /// Add a session and mark it Open. From here on every broadcast reaches it.
    pub async fn register(&self, session: Arc<Session>) -> WsErrorResult<()> {
        let mut inner = self.inner.write().await;
        let connection_id = session.id();

        if inner.sessions.contains_key(&connection_id) {
            return Err(WsError::DuplicateSession {
                connection_id,
                location: ErrorLocation::from(Location::caller()),
            });
        }

        if inner.sessions.len() >= self.limits.max_total {
            warn!(
                "Total connection limit reached: {}/{}",
                inner.sessions.len(),
                self.limits.max_total
            );
            return Err(WsError::ConnectionLimitExceeded {
                current: inner.sessions.len(),
                max: self.limits.max_total,
                location: ErrorLocation::from(Location::caller()),
            });
        }

        if !session.mark_open() {
            return Err(WsError::ConnectionClosed {
                reason: format!("session {connection_id} closed before registration"),
                location: ErrorLocation::from(Location::caller()),
            });
        }

        let authenticated = session.is_authenticated();
        inner.sessions.insert(connection_id, session);
        let count = inner.sessions.len();
        drop(inner);

        self.metrics.session_opened(authenticated);
        self.metrics.active_sessions(count);
        info!(
            "Registered session {connection_id} ({}, {count} total)",
            if authenticated {
                "authenticated"
            } else {
                "anonymous"
            }
        );

        Ok(())
    }

    /// Remove a session by id. Unknown ids are ignored.
    pub async fn unregister(&self, connection_id: ConnectionId) {
        let mut inner = self.inner.write().await;
        if inner.sessions.remove(&connection_id).is_some() {
            let count = inner.sessions.len();
            drop(inner);
            self.metrics.active_sessions(count);
            debug!("Unregistered session {connection_id} ({count} remaining)");
        }
    }

    /// Remove exactly this session, never another one that shares its id
    async fn remove(&self, session: &Session) {
        let mut inner = self.inner.write().await;
        let same = inner
            .sessions
            .get(&session.id())
            .is_some_and(|registered| std::ptr::eq(registered.as_ref(), session));
        if same {
            inner.sessions.remove(&session.id());
            let count = inner.sessions.len();
            drop(inner);
            self.metrics.active_sessions(count);
        }
    }

    /// Start closing a session: record the reason, wake its tasks and take it
    /// out of the registry. Only the first trigger has any effect; later
    /// calls return false.
    pub async fn close_session(&self, session: &Session, reason: CloseReason) -> bool {
        if !session.begin_close(reason) {
            return false;
        }

        self.remove(session).await;
        self.metrics.session_closed(reason.as_str());
        info!("Closing session {} ({reason})", session.id());
        true
    }

    /// Close a registered session by id
    pub async fn close(&self, connection_id: ConnectionId, reason: CloseReason) -> bool {
        match self.get(connection_id).await {
            Some(session) => self.close_session(&session, reason).await,
            None => false,
        }
    }

    /// Close every registered session, returning how many were closed
    pub async fn close_all(&self, reason: CloseReason) -> usize {
        let sessions = self.sessions().await;
        let mut closed = 0;
        for session in sessions {
            if self.close_session(&session, reason).await {
                closed += 1;
            }
        }
        info!("Closed {closed} sessions ({reason})");
        closed
    }

    /// Deliver one event to every open session.
    ///
    /// Sessions already closing are skipped. The event is serialized once. Each session gets at most the configured
    /// send timeout; sessions that time out or whose channel is gone are
    /// closed with `SendFailed` and counted as dropped. A failing session
    /// never stops delivery to the others.
    pub async fn broadcast(&self, event: &Event) -> WsErrorResult<BroadcastReport> {
        let frame = EventFrame::encode(event)?;
        let _delivery = self.delivery.lock().await;
        let timer = MetricsTimer::new(self.metrics.clone());

        let sessions: Vec<Arc<Session>> = self
            .sessions()
            .await
            .into_iter()
            .filter(|session| !session.is_closing())
            .collect();
        let timeout = self.broadcast_config.send_timeout;
        let outcomes = join_all(sessions.iter().map(|session| {
            let frame = frame.clone();
            async move { session.send(frame, timeout).await }
        }))
        .await;

        let mut report = BroadcastReport::default();
        for (session, outcome) in sessions.iter().zip(outcomes) {
            match outcome {
                Ok(()) => report.delivered += 1,
                Err(e) => {
                    report.dropped += 1;
                    if e.is_peer_gone() {
                        warn!(
                            "Dropping session {} after failed {} delivery: {e}",
                            session.id(),
                            frame.kind()
                        );
                    } else {
                        error!("Unexpected delivery failure for session {}: {e}", session.id());
                    }
                    self.metrics.error_occurred(e.error_code());
                    self.close_session(session, CloseReason::SendFailed).await;
                }
            }
        }

        timer.finish();
        self.metrics
            .broadcast_completed(frame.kind().as_str(), report.delivered, report.dropped);
        debug!(
            "Broadcast {} to {} sessions ({} dropped)",
            frame.kind(),
            report.delivered,
            report.dropped
        );

        Ok(report)
    }

    pub async fn get(&self, connection_id: ConnectionId) -> Option<Arc<Session>> {
        let inner = self.inner.read().await;
        inner.sessions.get(&connection_id).cloned()
    }

    /// Snapshot of the open sessions
    pub async fn sessions(&self) -> Vec<Arc<Session>> {
        let inner = self.inner.read().await;
        inner.sessions.values().cloned().collect()
    }

    /// Number of open sessions at the instant of the call
    pub async fn snapshot_count(&self) -> usize {
        let inner = self.inner.read().await;
        inner.sessions.len()
    }

    /// Whether another session could be registered right now
    pub async fn has_capacity(&self) -> bool {
        self.snapshot_count().await < self.limits.max_total
    }

    pub fn send_timeout(&self) -> Duration {
        self.broadcast_config.send_timeout
    }
}

impl Clone for ConnectionRegistry {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            delivery: Arc::clone(&self.delivery),
            limits: self.limits.clone(),
            broadcast_config: self.broadcast_config.clone(),
            metrics: self.metrics.clone(),
        }
    }
}
