use metrics::{counter, gauge, histogram};

/// Metrics collector for the telemetry fan-out
#[derive(Clone)]
pub struct Metrics {
    prefix: &'static str,
}

impl Metrics {
    pub fn new() -> Self {
        Self { prefix: "em_ws" }
    }

    /// Record session registered and visible to broadcasts
    pub fn session_opened(&self, authenticated: bool) {
        counter!(format!("{}.sessions.opened", self.prefix)).increment(1);
        let flavour = if authenticated {
            "authenticated"
        } else {
            "anonymous"
        };
        counter!(format!("{}.sessions.opened.{}", self.prefix, flavour)).increment(1);
    }

    /// Record session closed
    pub fn session_closed(&self, reason: &str) {
        counter!(format!("{}.sessions.closed", self.prefix)).increment(1);
        counter!(format!("{}.sessions.closed.{}", self.prefix, reason)).increment(1);
    }

    /// Record current registry size
    pub fn active_sessions(&self, count: usize) {
        gauge!(format!("{}.sessions.active", self.prefix)).set(count as f64);
    }

    /// Record inbound frame (always discarded)
    pub fn message_received(&self, frame_type: &str) {
        counter!(format!("{}.messages.received", self.prefix)).increment(1);
        counter!(format!("{}.messages.received.{}", self.prefix, frame_type)).increment(1);
    }

    /// Record frame written to a client transport
    pub fn message_sent(&self, kind: &str) {
        counter!(format!("{}.messages.sent", self.prefix)).increment(1);
        counter!(format!("{}.messages.sent.{}", self.prefix, kind)).increment(1);
    }

    /// Record outcome of one broadcast
    pub fn broadcast_completed(&self, kind: &str, delivered: usize, dropped: usize) {
        counter!(format!("{}.broadcast.published", self.prefix)).increment(1);
        counter!(format!("{}.broadcast.published.{}", self.prefix, kind)).increment(1);
        counter!(format!("{}.broadcast.delivered", self.prefix)).increment(delivered as u64);
        counter!(format!("{}.broadcast.dropped", self.prefix)).increment(dropped as u64);
    }

    /// Record broadcast fan-out latency
    pub fn broadcast_latency(&self, duration: std::time::Duration) {
        histogram!(format!("{}.broadcast.latency_ms", self.prefix))
            .record(duration.as_secs_f64() * 1000.0);
    }

    pub fn heartbeat_sent(&self) {
        counter!(format!("{}.heartbeats.sent", self.prefix)).increment(1);
    }

    /// Record event pulled from the event source
    pub fn event_produced(&self, kind: &str) {
        counter!(format!("{}.events.produced", self.prefix)).increment(1);
        counter!(format!("{}.events.produced.{}", self.prefix, kind)).increment(1);
    }

    /// Record error occurrence
    pub fn error_occurred(&self, error_type: &str) {
        counter!(format!("{}.errors.total", self.prefix)).increment(1);
        counter!(format!("{}.errors.{}", self.prefix, error_type)).increment(1);
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}
