use crate::Metrics;

use std::time::Instant;

/// Helper for timing a broadcast
pub struct MetricsTimer {
    start: Instant,
    metrics: Metrics,
}

impl MetricsTimer {
    pub fn new(metrics: Metrics) -> Self {
        Self {
            start: Instant::now(),
            metrics,
        }
    }

    /// Record elapsed time
    pub fn finish(self) {
        self.metrics.broadcast_latency(self.start.elapsed());
    }
}
