use thiserror::Error;

#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Config error: {0}")]
    Config(#[from] em_config::ConfigError),

    #[error("WebSocket service error: {0}")]
    Ws(#[from] em_ws::WsError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to install metrics exporter: {message}")]
    Metrics { message: String },

    #[error("Logger error: {message}")]
    Logger { message: String },
}

pub type Result<T> = std::result::Result<T, ServerError>;
