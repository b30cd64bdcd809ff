use crate::{CloseReason, ConnectionId, EventFrame, Result as WsErrorResult, SessionState, WsError};

use std::panic::Location;
use std::sync::OnceLock;
use std::sync::atomic::{AtomicU8, AtomicU64, Ordering};
use std::time::Duration;

use chrono::{DateTime, Utc};
use em_auth::Identity;
use error_location::ErrorLocation;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::SendTimeoutError;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// One connected dashboard client.
///
/// The session owns the producer half of its outbound channel; the writer
/// task that drains the channel into the transport is the only code that
/// touches the socket. Shared between the registry, the heartbeat task and
/// the connection handler through `Arc<Session>`.
pub struct Session {
    id: ConnectionId,
    identity: Option<Identity>,
    outbound: mpsc::Sender<EventFrame>,
    connected_at: DateTime<Utc>,
    started: Instant,
    /// Micros after `started` of the last successful transport write
    last_sent_offset: AtomicU64,
    state: AtomicU8,
    close_reason: OnceLock<CloseReason>,
    closing: CancellationToken,
}

impl Session {
    pub fn new(
        id: ConnectionId,
        identity: Option<Identity>,
        outbound: mpsc::Sender<EventFrame>,
    ) -> Self {
        Self {
            id,
            identity,
            outbound,
            connected_at: Utc::now(),
            started: Instant::now(),
            last_sent_offset: AtomicU64::new(0),
            state: AtomicU8::new(SessionState::Connecting as u8),
            close_reason: OnceLock::new(),
            closing: CancellationToken::new(),
        }
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.identity.is_some()
    }

    pub fn connected_at(&self) -> DateTime<Utc> {
        self.connected_at
    }

    pub fn state(&self) -> SessionState {
        SessionState::from_u8(self.state.load(Ordering::SeqCst))
    }

    pub fn is_open(&self) -> bool {
        self.state() == SessionState::Open
    }

    /// Reason recorded by the first close trigger, if any
    pub fn close_reason(&self) -> Option<CloseReason> {
        self.close_reason.get().copied()
    }

    /// Queue a frame on the outbound channel, waiting at most `timeout`
    /// for buffer space.
    pub async fn send(&self, frame: EventFrame, timeout: Duration) -> WsErrorResult<()> {
        let location = ErrorLocation::from(Location::caller());

        if !self.is_open() {
            return Err(WsError::ConnectionClosed {
                reason: format!("session {} is {:?}", self.id, self.state()),
                location,
            });
        }

        match self.outbound.send_timeout(frame, timeout).await {
            Ok(()) => Ok(()),
            Err(SendTimeoutError::Timeout(_)) => Err(WsError::SendTimeout {
                connection_id: self.id,
                timeout_ms: timeout.as_millis() as u64,
                location,
            }),
            Err(SendTimeoutError::Closed(_)) => Err(WsError::ChannelClosed {
                connection_id: self.id,
                location,
            }),
        }
    }

    /// Note a successful transport write
    pub fn record_sent(&self) {
        let offset = Instant::now().saturating_duration_since(self.started);
        self.last_sent_offset
            .fetch_max(offset.as_micros() as u64, Ordering::SeqCst);
    }

    fn last_sent_offset(&self) -> Duration {
        Duration::from_micros(self.last_sent_offset.load(Ordering::SeqCst))
    }

    /// Wall-clock time of the last successful transport write, for display
    pub fn last_sent_at(&self) -> DateTime<Utc> {
        let offset = self.last_sent_offset().as_micros() as i64;
        self.connected_at + chrono::Duration::microseconds(offset)
    }

    /// Monotonic time since the last successful transport write
    pub fn idle_for(&self) -> Duration {
        Instant::now().saturating_duration_since(self.started + self.last_sent_offset())
    }

    /// Connecting -> Open. Fails if the session already started closing.
    pub(crate) fn mark_open(&self) -> bool {
        self.state
            .compare_exchange(
                SessionState::Connecting as u8,
                SessionState::Open as u8,
                Ordering::SeqCst,
                Ordering::SeqCst,
            )
            .is_ok()
    }

    /// Record the close reason and wake every task watching this session.
    /// Returns true only for the first caller.
    pub(crate) fn begin_close(&self, reason: CloseReason) -> bool {
        if self.close_reason.set(reason).is_err() {
            return false;
        }
        self.state
            .store(SessionState::Closing as u8, Ordering::SeqCst);
        self.closing.cancel();
        true
    }

    /// Terminal state, set once the transport has been released
    pub(crate) fn mark_closed(&self) {
        self.state.store(SessionState::Closed as u8, Ordering::SeqCst);
    }

    /// Resolves once any close trigger has fired
    pub async fn closed(&self) {
        self.closing.cancelled().await
    }

    pub fn is_closing(&self) -> bool {
        self.closing.is_cancelled()
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("authenticated", &self.is_authenticated())
            .field("state", &self.state())
            .field("close_reason", &self.close_reason())
            .finish()
    }
}
