use crate::{ConfigError, ConfigErrorResult, DEFAULT_AUTH_ENABLED, MIN_JWT_SECRET_LENGTH};

use serde::Deserialize;

/// Bearer-token verification settings.
///
/// Authentication never gates the connection: with auth disabled every
/// session is anonymous, with auth enabled a bad token still connects
/// anonymously.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    pub enabled: bool,
    /// HS256 shared secret
    pub jwt_secret: Option<String>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            enabled: DEFAULT_AUTH_ENABLED,
            jwt_secret: None,
        }
    }
}

impl AuthConfig {
    pub fn validate(&self) -> ConfigErrorResult<()> {
        if !self.enabled {
            return Ok(());
        }

        let secret = self.jwt_secret.as_deref().ok_or_else(|| {
            ConfigError::auth("auth.enabled requires auth.jwt_secret to be set")
        })?;

        if secret.len() < MIN_JWT_SECRET_LENGTH {
            return Err(ConfigError::auth(format!(
                "auth.jwt_secret must be at least {} characters",
                MIN_JWT_SECRET_LENGTH
            )));
        }

        Ok(())
    }
}
