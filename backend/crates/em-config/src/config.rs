use crate::{
    AuthConfig, CONFIG_DIR_ENV, CONFIG_FILE_NAME, ConfigError, ConfigErrorResult,
    DEFAULT_CONFIG_DIR, LoggingConfig, ProducerConfig, ServerConfig, WebSocketConfig,
};

use std::path::{Path, PathBuf};

use log::info;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub auth: AuthConfig,
    pub logging: LoggingConfig,
    pub websocket: WebSocketConfig,
    pub producer: ProducerConfig,
}

impl Config {
    /// Load config with full production error handling.
    ///
    /// Loading order:
    /// 1. Check for EM_CONFIG_DIR env var, else use ./.em/
    /// 2. Auto-create config directory if it doesn't exist
    /// 3. Load config.toml if it exists, else use defaults
    /// 4. Apply EM_* environment variable overrides
    ///
    /// Does NOT validate - call validate() after load().
    pub fn load() -> ConfigErrorResult<Self> {
        let config_dir = Self::config_dir()?;

        if !config_dir.exists() {
            std::fs::create_dir_all(&config_dir).map_err(|e| ConfigError::Io {
                path: config_dir.clone(),
                source: e,
            })?;
        }

        let config_path = config_dir.join(CONFIG_FILE_NAME);

        let mut config = if config_path.exists() {
            Self::load_toml(&config_path)?
        } else {
            Config::default()
        };

        config.apply_env_overrides();

        Ok(config)
    }

    /// Load and parse TOML file with detailed error context.
    fn load_toml(path: &Path) -> ConfigErrorResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&contents).map_err(|e| ConfigError::Toml {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Get the config directory.
    /// Priority: EM_CONFIG_DIR env var > ./.em/ (relative to cwd)
    pub fn config_dir() -> ConfigErrorResult<PathBuf> {
        if let Ok(dir) = std::env::var(CONFIG_DIR_ENV) {
            return Ok(PathBuf::from(dir));
        }

        let cwd = std::env::current_dir()
            .map_err(|_| ConfigError::config("Cannot determine current working directory"))?;
        Ok(cwd.join(DEFAULT_CONFIG_DIR))
    }

    /// Validate all configuration.
    /// Call after load() to catch all errors at startup.
    pub fn validate(&self) -> ConfigErrorResult<()> {
        self.server.validate()?;
        self.auth.validate()?;
        self.websocket.validate()?;
        self.producer.validate()?;

        Ok(())
    }

    /// Get bind address as string.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// Log configuration summary (NEVER logs secrets).
    pub fn log_summary(&self) {
        info!("Configuration loaded:");
        info!(
            "  server: {}:{} (max {} connections)",
            self.server.host, self.server.port, self.server.max_connections
        );

        info!(
            "  auth: {}",
            if self.auth.enabled {
                "enabled (HS256)"
            } else {
                "disabled (all sessions anonymous)"
            }
        );

        info!(
            "  logging: {} (colored: {})",
            *self.logging.level, self.logging.colored
        );

        info!(
            "  websocket: buffer={}, send_timeout={}ms, heartbeat={}s/{}s",
            self.websocket.send_buffer_size,
            self.websocket.send_timeout_ms,
            self.websocket.heartbeat_interval_secs,
            self.websocket.heartbeat_timeout_secs
        );

        info!(
            "  producer: {} interval={}-{}ms, devices={}",
            if self.producer.enabled {
                "enabled"
            } else {
                "disabled"
            },
            self.producer.min_interval_ms,
            self.producer.max_interval_ms,
            self.producer.devices.len()
        );
    }

    fn apply_env_overrides(&mut self) {
        // Server
        Self::apply_env_string("EM_SERVER_HOST", &mut self.server.host);
        Self::apply_env_parse("EM_SERVER_PORT", &mut self.server.port);
        Self::apply_env_parse(
            "EM_SERVER_MAX_CONNECTIONS",
            &mut self.server.max_connections,
        );

        // Auth
        Self::apply_env_bool("EM_AUTH_ENABLED", &mut self.auth.enabled);
        Self::apply_env_option_string("EM_AUTH_JWT_SECRET", &mut self.auth.jwt_secret);

        // Logging
        Self::apply_env_parse("EM_LOG_LEVEL", &mut self.logging.level);
        Self::apply_env_bool("EM_LOG_COLORED", &mut self.logging.colored);
        Self::apply_env_option_string("EM_LOG_FILE", &mut self.logging.file);

        // WebSocket
        Self::apply_env_parse(
            "EM_WS_SEND_BUFFER_SIZE",
            &mut self.websocket.send_buffer_size,
        );
        Self::apply_env_parse(
            "EM_WS_SEND_TIMEOUT_MS",
            &mut self.websocket.send_timeout_ms,
        );
        Self::apply_env_parse(
            "EM_WS_HEARTBEAT_INTERVAL_SECS",
            &mut self.websocket.heartbeat_interval_secs,
        );
        Self::apply_env_parse(
            "EM_WS_HEARTBEAT_TIMEOUT_SECS",
            &mut self.websocket.heartbeat_timeout_secs,
        );

        // Producer
        Self::apply_env_bool("EM_PRODUCER_ENABLED", &mut self.producer.enabled);
        Self::apply_env_parse(
            "EM_PRODUCER_MIN_INTERVAL_MS",
            &mut self.producer.min_interval_ms,
        );
        Self::apply_env_parse(
            "EM_PRODUCER_MAX_INTERVAL_MS",
            &mut self.producer.max_interval_ms,
        );
        Self::apply_env_parse(
            "EM_PRODUCER_ERROR_BACKOFF_MS",
            &mut self.producer.error_backoff_ms,
        );
        Self::apply_env_list("EM_PRODUCER_DEVICES", &mut self.producer.devices);
    }

    /// Helper: Apply environment variable override for String values
    fn apply_env_string(var_name: &str, target: &mut String) {
        if let Ok(val) = std::env::var(var_name) {
            *target = val;
        }
    }

    /// Helper: Apply environment variable override for bool values (accepts "true"/"1")
    fn apply_env_bool(var_name: &str, target: &mut bool) {
        if let Ok(val) = std::env::var(var_name) {
            *target = val == "true" || val == "1";
        }
    }

    /// Helper: Apply environment variable override for parseable values
    fn apply_env_parse<T: std::str::FromStr>(var_name: &str, target: &mut T) {
        if let Ok(val) = std::env::var(var_name)
            && let Ok(parsed) = val.parse()
        {
            *target = parsed;
        }
    }

    /// Helper: Apply environment variable override for Option<String> values
    fn apply_env_option_string(var_name: &str, target: &mut Option<String>) {
        if let Ok(val) = std::env::var(var_name) {
            *target = Some(val);
        }
    }

    /// Helper: Apply environment variable override for comma-separated lists
    fn apply_env_list(var_name: &str, target: &mut Vec<String>) {
        if let Ok(val) = std::env::var(var_name) {
            *target = val
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect();
        }
    }
}
