use crate::{CloseReason, ConnectionRegistry, Event, EventFrame, Metrics, Session};

use std::sync::Arc;
use std::time::Duration;

use log::{debug, error, warn};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval_at};

/// Per-session liveness task.
///
/// Every interval it sends a heartbeat event through the session's outbound
/// channel and checks that the writer has made progress within the stall
/// timeout. Either failure closes the session through the registry. The
/// task never registers anything and ends as soon as the session starts
/// closing.
#[derive(Clone)]
pub struct HeartbeatScheduler {
    interval: Duration,
    stall_timeout: Duration,
    metrics: Metrics,
}

impl HeartbeatScheduler {
    pub fn new(interval: Duration, stall_timeout: Duration, metrics: Metrics) -> Self {
        Self {
            interval,
            stall_timeout,
            metrics,
        }
    }

    pub fn spawn(&self, session: Arc<Session>, registry: ConnectionRegistry) -> JoinHandle<()> {
        let scheduler = self.clone();
        tokio::spawn(async move { scheduler.run(session, registry).await })
    }

    async fn run(self, session: Arc<Session>, registry: ConnectionRegistry) {
        let mut ticker = interval_at(Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = session.closed() => break,
                _ = ticker.tick() => {}
            }

            if !session.is_open() {
                break;
            }

            let idle = session.idle_for();
            if idle > self.stall_timeout {
                warn!(
                    "Session {} stalled: no write for {}ms",
                    session.id(),
                    idle.as_millis()
                );
                registry.close_session(&session, CloseReason::Stalled).await;
                break;
            }

            let frame = match EventFrame::encode(&Event::heartbeat()) {
                Ok(frame) => frame,
                Err(e) => {
                    error!("Failed to encode heartbeat for session {}: {e}", session.id());
                    registry
                        .close_session(&session, CloseReason::InternalError)
                        .await;
                    break;
                }
            };

            match session.send(frame, registry.send_timeout()).await {
                Ok(()) => self.metrics.heartbeat_sent(),
                Err(e) => {
                    warn!("Heartbeat to session {} failed: {e}", session.id());
                    registry
                        .close_session(&session, CloseReason::HeartbeatFailed)
                        .await;
                    break;
                }
            }
        }

        debug!("Heartbeat task for session {} finished", session.id());
    }
}
