use crate::ConnectionId;

use std::panic::Location;

use error_location::ErrorLocation;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum WsError {
    #[error("Connection closed: {reason} {location}")]
    ConnectionClosed {
        reason: String,
        location: ErrorLocation,
    },

    #[error("Outbound channel closed for session {connection_id} {location}")]
    ChannelClosed {
        connection_id: ConnectionId,
        location: ErrorLocation,
    },

    #[error("Send to session {connection_id} timed out after {timeout_ms}ms {location}")]
    SendTimeout {
        connection_id: ConnectionId,
        timeout_ms: u64,
        location: ErrorLocation,
    },

    #[error("Handshake failed: {reason} {location}")]
    HandshakeFailed {
        reason: String,
        location: ErrorLocation,
    },

    #[error("Session {connection_id} is already registered {location}")]
    DuplicateSession {
        connection_id: ConnectionId,
        location: ErrorLocation,
    },

    #[error("Connection limit exceeded: {current} connections (max: {max}) {location}")]
    ConnectionLimitExceeded {
        current: usize,
        max: usize,
        location: ErrorLocation,
    },

    #[error("Event serialization failed: {source} {location}")]
    Serialization {
        #[source]
        source: serde_json::Error,
        location: ErrorLocation,
    },

    #[error("Event source failed: {message} {location}")]
    Producer {
        message: String,
        location: ErrorLocation,
    },

    #[error("Invalid configuration: {message} {location}")]
    InvalidConfig {
        message: String,
        location: ErrorLocation,
    },

    #[error("Broadcast coordinator already started {location}")]
    AlreadyStarted { location: ErrorLocation },

    #[error("Internal error: {message} {location}")]
    Internal {
        message: String,
        location: ErrorLocation,
    },
}

impl WsError {
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::ConnectionClosed { .. } => "CONNECTION_CLOSED",
            Self::ChannelClosed { .. } => "CHANNEL_CLOSED",
            Self::SendTimeout { .. } => "SLOW_CLIENT",
            Self::HandshakeFailed { .. } => "HANDSHAKE_FAILED",
            Self::DuplicateSession { .. } => "DUPLICATE_SESSION",
            Self::ConnectionLimitExceeded { .. } => "CONNECTION_LIMIT",
            Self::Serialization { .. } => "SERIALIZATION_ERROR",
            Self::Producer { .. } => "PRODUCER_ERROR",
            Self::InvalidConfig { .. } => "INVALID_CONFIG",
            Self::AlreadyStarted { .. } => "ALREADY_STARTED",
            Self::Internal { .. } => "INTERNAL_ERROR",
        }
    }

    /// True when the failure means the peer is gone or stalled, as opposed
    /// to a fault inside the service.
    pub fn is_peer_gone(&self) -> bool {
        matches!(
            self,
            Self::ConnectionClosed { .. } | Self::ChannelClosed { .. } | Self::SendTimeout { .. }
        )
    }

    #[track_caller]
    pub fn producer<S: Into<String>>(message: S) -> Self {
        Self::Producer {
            message: message.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::Internal {
            message: message.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

impl From<serde_json::Error> for WsError {
    #[track_caller]
    fn from(source: serde_json::Error) -> Self {
        Self::Serialization {
            source,
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

pub type Result<T> = std::result::Result<T, WsError>;
