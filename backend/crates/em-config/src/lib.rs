mod auth_config;
mod config;
mod error;
mod log_level;
mod logging_config;
mod producer_config;
mod server_config;
mod websocket_config;

#[cfg(test)]
mod tests;

pub use auth_config::AuthConfig;
pub use config::Config;
pub use error::{ConfigError, ConfigErrorResult};
pub use log_level::LogLevel;
pub use logging_config::LoggingConfig;
pub use producer_config::ProducerConfig;
pub use server_config::ServerConfig;
pub use websocket_config::WebSocketConfig;

const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 8000;
const MIN_PORT: u16 = 1024;
const DEFAULT_MAX_CONNECTIONS: usize = 10000;
const MIN_MAX_CONNECTIONS: usize = 1;
const MAX_MAX_CONNECTIONS: usize = 100000;
const DEFAULT_AUTH_ENABLED: bool = false;
const MIN_JWT_SECRET_LENGTH: usize = 32;
const DEFAULT_LOG_LEVEL_STRING: &str = "info";
const DEFAULT_LOG_LEVEL: log::LevelFilter = log::LevelFilter::Info;
const DEFAULT_LOG_DIRECTORY: &str = "log";
const DEFAULT_LOG_COLORED: bool = true;

const CONFIG_DIR_ENV: &str = "EM_CONFIG_DIR";
const DEFAULT_CONFIG_DIR: &str = ".em";
const CONFIG_FILE_NAME: &str = "config.toml";
