use std::time::Duration;

/// Configuration for fan-out delivery
#[derive(Debug, Clone)]
pub struct BroadcastConfig {
    /// Longest a single session's full buffer may hold up a send before the
    /// session is treated as dead
    pub send_timeout: Duration,
}

impl Default for BroadcastConfig {
    fn default() -> Self {
        Self {
            send_timeout: Duration::from_millis(250),
        }
    }
}
