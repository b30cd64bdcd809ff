use axum::extract::ws::{CloseCode, close_code};

/// Why a session ended. The first trigger recorded wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CloseReason {
    /// Peer sent a close frame or the stream ended
    RemoteClosed,
    ReceiveFailed,
    /// A broadcast or transport write failed
    SendFailed,
    HeartbeatFailed,
    /// No successful write within the heartbeat timeout
    Stalled,
    ServerShutdown,
    /// A session task panicked or the session could not be registered
    InternalError,
}

impl CloseReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RemoteClosed => "remote_closed",
            Self::ReceiveFailed => "receive_failed",
            Self::SendFailed => "send_failed",
            Self::HeartbeatFailed => "heartbeat_failed",
            Self::Stalled => "stalled",
            Self::ServerShutdown => "server_shutdown",
            Self::InternalError => "internal_error",
        }
    }

    /// Close code to send before releasing the transport, if any.
    /// Peer and transport failures close silently.
    pub fn close_code(&self) -> Option<CloseCode> {
        match self {
            Self::InternalError => Some(close_code::ERROR),
            Self::ServerShutdown => Some(close_code::NORMAL),
            _ => None,
        }
    }
}

impl std::fmt::Display for CloseReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
