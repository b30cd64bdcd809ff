use std::time::Duration;

/// Configuration for WebSocket sessions
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    /// Send buffer size (bounded to handle backpressure)
    pub send_buffer_size: usize,
    /// Heartbeat event interval
    pub heartbeat_interval: Duration,
    /// No successful transport write for this long marks the session stalled
    pub heartbeat_timeout: Duration,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            send_buffer_size: 100,
            heartbeat_interval: Duration::from_secs(30),
            heartbeat_timeout: Duration::from_secs(90),
        }
    }
}
