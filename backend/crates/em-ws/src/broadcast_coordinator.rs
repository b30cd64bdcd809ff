use crate::{
    ConnectionRegistry, EventSource, EventStream, Metrics, Result as WsErrorResult, WsError,
};

use std::panic::Location;
use std::time::Duration;

use error_location::ErrorLocation;
use futures::StreamExt;
use log::{debug, error, info, warn};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Drives one event source into the registry.
///
/// The production loop runs on its own task. Broadcasting goes through the
/// registry, so a slow client only costs the loop its bounded send timeout.
pub struct BroadcastCoordinator {
    registry: ConnectionRegistry,
    metrics: Metrics,
    error_backoff: Duration,
    source: Option<EventStream>,
    running: Option<ProductionLoop>,
}

struct ProductionLoop {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl BroadcastCoordinator {
    pub fn new(
        registry: ConnectionRegistry,
        metrics: Metrics,
        error_backoff: Duration,
        source: impl EventSource,
    ) -> Self {
        Self {
            registry,
            metrics,
            error_backoff,
            source: Some(source.into_stream()),
            running: None,
        }
    }

    /// Begin the production loop. The source is consumed, so a coordinator
    /// can only be started once.
    pub fn start(&mut self) -> WsErrorResult<()> {
        let stream = self.source.take().ok_or_else(|| WsError::AlreadyStarted {
            location: ErrorLocation::from(Location::caller()),
        })?;

        let cancel = CancellationToken::new();
        let task = tokio::spawn(run_production_loop(
            stream,
            self.registry.clone(),
            self.metrics.clone(),
            self.error_backoff,
            cancel.clone(),
        ));

        self.running = Some(ProductionLoop { cancel, task });
        Ok(())
    }

    /// Halt the production loop and wait for it to finish. Registered
    /// sessions are left alone. Calling stop again, or before start, is a
    /// no-op.
    pub async fn stop(&mut self) {
        let Some(production) = self.running.take() else {
            return;
        };

        production.cancel.cancel();
        if let Err(e) = production.task.await {
            error!("Production loop ended abnormally: {e}");
        }
        info!("Broadcast coordinator stopped");
    }

    pub fn is_running(&self) -> bool {
        self.running
            .as_ref()
            .is_some_and(|production| !production.task.is_finished())
    }
}

impl Drop for BroadcastCoordinator {
    fn drop(&mut self) {
        if let Some(production) = &self.running {
            production.cancel.cancel();
        }
    }
}

async fn run_production_loop(
    mut stream: EventStream,
    registry: ConnectionRegistry,
    metrics: Metrics,
    error_backoff: Duration,
    cancel: CancellationToken,
) {
    info!("Production loop started");

    loop {
        let next = tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            next = stream.next() => next,
        };

        match next {
            Some(Ok(event)) => {
                metrics.event_produced(event.kind().as_str());
                match registry.broadcast(&event).await {
                    Ok(report) => debug!(
                        "{} delivered to {} sessions ({} dropped)",
                        event.kind(),
                        report.delivered,
                        report.dropped
                    ),
                    Err(e) => {
                        error!("Failed to broadcast {}: {e}", event.kind());
                        metrics.error_occurred(e.error_code());
                    }
                }
            }
            Some(Err(e)) => {
                error!(
                    "Event source failed, retrying in {}ms: {e}",
                    error_backoff.as_millis()
                );
                metrics.error_occurred(e.error_code());
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => break,
                    _ = tokio::time::sleep(error_backoff) => {}
                }
            }
            None => {
                warn!("Event source exhausted");
                break;
            }
        }
    }

    info!("Production loop finished");
}
