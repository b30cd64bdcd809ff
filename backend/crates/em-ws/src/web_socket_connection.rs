use crate::{
    CloseReason, ConnectionConfig, ConnectionId, ConnectionRegistry, Event, EventFrame,
    HeartbeatScheduler, Metrics, Result as WsErrorResult, Session, ShutdownGuard, WsError,
};

use std::panic::Location;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::ws::{CloseFrame, Message, Utf8Bytes, WebSocket};
use em_auth::Identity;
use error_location::ErrorLocation;
use futures::stream::{SplitSink, SplitStream};
use futures::{Sink, SinkExt, StreamExt};
use log::{debug, error, info, warn};
use tokio::sync::mpsc;

type WsSink = SplitSink<WebSocket, Message>;

/// Drives one upgraded socket through Connecting, Open, Closing and Closed
pub struct WebSocketConnection {
    connection_id: ConnectionId,
    identity: Option<Identity>,
    config: ConnectionConfig,
    registry: ConnectionRegistry,
    metrics: Metrics,
}

impl WebSocketConnection {
    pub fn new(
        connection_id: ConnectionId,
        identity: Option<Identity>,
        config: ConnectionConfig,
        registry: ConnectionRegistry,
        metrics: Metrics,
    ) -> Self {
        Self {
            connection_id,
            identity,
            config,
            registry,
            metrics,
        }
    }

    /// Run the session until any close trigger fires, then release the
    /// transport. Returns an error only for handshake and internal faults;
    /// peer disconnects are normal endings.
    pub async fn handle(self, socket: WebSocket, mut shutdown_guard: ShutdownGuard) -> WsErrorResult<()> {
        let (mut ws_sender, mut ws_receiver) = socket.split();
        let (tx, rx) = mpsc::channel::<EventFrame>(self.config.send_buffer_size);
        let session = Arc::new(Session::new(
            self.connection_id,
            self.identity.clone(),
            tx,
        ));

        // The greeting goes straight to the transport before registration,
        // so no broadcast can overtake it
        let greeting = EventFrame::encode(&Event::connection_established(
            session.is_authenticated(),
        ))?;
        let send_timeout = self.registry.send_timeout();
        if let Err(reason) = send_within(
            &mut ws_sender,
            Message::Text(greeting.text().into()),
            send_timeout,
        )
        .await
        {
            self.metrics.error_occurred("handshake");
            return Err(WsError::HandshakeFailed {
                reason,
                location: ErrorLocation::from(Location::caller()),
            });
        }
        session.record_sent();
        self.metrics.message_sent(greeting.kind().as_str());

        if let Err(e) = self.registry.register(Arc::clone(&session)).await {
            error!("Failed to register session {}: {e}", self.connection_id);
            self.metrics.error_occurred(e.error_code());
            session.begin_close(CloseReason::InternalError);
            send_close(ws_sender, CloseReason::InternalError, send_timeout).await;
            session.mark_closed();
            return Err(e);
        }

        let heartbeat_task = HeartbeatScheduler::new(
            self.config.heartbeat_interval,
            self.config.heartbeat_timeout,
            self.metrics.clone(),
        )
        .spawn(Arc::clone(&session), self.registry.clone());

        let writer_task = tokio::spawn(write_loop(
            ws_sender,
            rx,
            Arc::clone(&session),
            self.registry.clone(),
            self.metrics.clone(),
            send_timeout,
        ));

        let reason = read_loop(
            &session,
            &mut ws_receiver,
            &mut shutdown_guard,
            &self.metrics,
        )
        .await;
        self.registry.close_session(&session, reason).await;

        if let Err(e) = heartbeat_task.await {
            error!("Heartbeat task for session {} failed: {e}", self.connection_id);
        }

        let final_reason = match writer_task.await {
            Ok(()) => session.close_reason().unwrap_or(reason),
            Err(e) => {
                error!("Writer task for session {} failed: {e}", self.connection_id);
                CloseReason::InternalError
            }
        };

        session.mark_closed();
        info!("Session {} closed ({final_reason})", self.connection_id);

        if final_reason == CloseReason::InternalError {
            return Err(WsError::internal(format!(
                "session {} ended with an internal error",
                self.connection_id
            )));
        }
        Ok(())
    }
}

/// Inbound frames carry no meaning; only the end of the stream matters
async fn read_loop(
    session: &Session,
    ws_receiver: &mut SplitStream<WebSocket>,
    shutdown_guard: &mut ShutdownGuard,
    metrics: &Metrics,
) -> CloseReason {
    loop {
        tokio::select! {
            biased;
            _ = session.closed() => {
                return session.close_reason().unwrap_or(CloseReason::InternalError);
            }
            _ = shutdown_guard.wait() => {
                debug!("Shutdown signal reached session {}", session.id());
                return CloseReason::ServerShutdown;
            }
            msg = ws_receiver.next() => match msg {
                Some(Ok(Message::Close(frame))) => {
                    debug!("Session {} sent close frame: {frame:?}", session.id());
                    return CloseReason::RemoteClosed;
                }
                Some(Ok(Message::Text(text))) => {
                    debug!("Ignoring {} byte text frame from {}", text.len(), session.id());
                    metrics.message_received("text");
                }
                Some(Ok(Message::Binary(data))) => {
                    debug!("Ignoring {} byte binary frame from {}", data.len(), session.id());
                    metrics.message_received("binary");
                }
                Some(Ok(Message::Ping(_) | Message::Pong(_))) => {}
                Some(Err(e)) => {
                    warn!("Receive error on session {}: {e}", session.id());
                    return CloseReason::ReceiveFailed;
                }
                None => return CloseReason::RemoteClosed,
            }
        }
    }
}

/// Sole writer to the transport. Once the session starts closing, by any
/// trigger and even if the task that accepted the connection is gone, it
/// finishes the transport with the close frame for the recorded reason.
async fn write_loop(
    mut ws_sender: WsSink,
    mut rx: mpsc::Receiver<EventFrame>,
    session: Arc<Session>,
    registry: ConnectionRegistry,
    metrics: Metrics,
    close_timeout: Duration,
) {
    loop {
        let frame = tokio::select! {
            biased;
            _ = session.closed() => break,
            frame = rx.recv() => match frame {
                Some(frame) => frame,
                None => {
                    registry.close_session(&session, CloseReason::InternalError).await;
                    break;
                }
            },
        };

        let result = tokio::select! {
            biased;
            _ = session.closed() => break,
            result = ws_sender.send(Message::Text(frame.text().into())) => result,
        };

        match result {
            Ok(()) => {
                session.record_sent();
                metrics.message_sent(frame.kind().as_str());
            }
            Err(e) => {
                warn!("Write to session {} failed: {e}", session.id());
                registry.close_session(&session, CloseReason::SendFailed).await;
                return;
            }
        }
    }

    let reason = session.close_reason().unwrap_or(CloseReason::InternalError);
    send_close(ws_sender, reason, close_timeout).await;
}

/// Write one frame, giving up once `limit` passes without the peer
/// accepting it.
pub(crate) async fn send_within<S>(
    sink: &mut S,
    message: Message,
    limit: Duration,
) -> std::result::Result<(), String>
where
    S: Sink<Message> + Unpin,
    S::Error: std::fmt::Display,
{
    match tokio::time::timeout(limit, sink.send(message)).await {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) => Err(e.to_string()),
        Err(_) => Err(format!("frame not accepted within {}ms", limit.as_millis())),
    }
}

/// Close frame (when the reason carries a code) then close the sink, bounded
/// by `limit` so a peer that stopped reading cannot hold the teardown.
async fn send_close(mut ws_sender: WsSink, reason: CloseReason, limit: Duration) {
    let closing = async {
        if let Some(code) = reason.close_code() {
            let frame = CloseFrame {
                code,
                reason: Utf8Bytes::from_static(reason.as_str()),
            };
            if let Err(e) = ws_sender.send(Message::Close(Some(frame))).await {
                debug!("Could not send close frame ({reason}): {e}");
            }
        }
        let _ = ws_sender.close().await;
    };
    if tokio::time::timeout(limit, closing).await.is_err() {
        debug!("Close frame ({reason}) not flushed within {}ms", limit.as_millis());
    }
}
