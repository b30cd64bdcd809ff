use crate::ShutdownCoordinator;

use tokio::sync::broadcast;

/// Per-session view of the shutdown signal
pub struct ShutdownGuard {
    shutdown_rx: broadcast::Receiver<()>,
    /// Shutdown was already underway when the guard was created
    triggered: bool,
}

impl ShutdownGuard {
    pub fn new(coordinator: &ShutdownCoordinator) -> Self {
        let shutdown_rx = coordinator.subscribe();
        Self {
            shutdown_rx,
            triggered: coordinator.is_shutdown(),
        }
    }

    /// Wait for shutdown signal
    pub async fn wait(&mut self) {
        if self.triggered {
            return;
        }
        let _ = self.shutdown_rx.recv().await;
        self.triggered = true;
    }

    /// Poll for shutdown signal (non-blocking, consumes signal if present)
    pub fn poll_shutdown(&mut self) -> bool {
        if !self.triggered && self.shutdown_rx.try_recv().is_ok() {
            self.triggered = true;
        }
        self.triggered
    }
}
