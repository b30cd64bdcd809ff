/// Outcome of one broadcast across the registry
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    /// Sessions whose outbound channel accepted the event
    pub delivered: usize,
    /// Sessions that failed delivery and were torn down
    pub dropped: usize,
}

impl BroadcastReport {
    pub fn attempted(&self) -> usize {
        self.delivered + self.dropped
    }
}
