//! Credential issuer configuration.
//!
//! Configuration is loaded once from environment variables at startup and
//! injected into handlers as an immutable value. The signing material
//! (`LIVEKIT_API_KEY`, `LIVEKIT_API_SECRET`, `LIVEKIT_WS_URL`) is optional at
//! load time: when any of it is absent or empty the service still starts, and
//! every issuance request answers 500 "Server misconfigured".

use common::secret::SecretString;
use std::collections::HashMap;
use std::env;
use std::fmt;
use thiserror::Error;

/// Environment variable holding the signing key identifier.
pub const API_KEY_VAR: &str = "LIVEKIT_API_KEY";

/// Environment variable holding the signing secret.
pub const API_SECRET_VAR: &str = "LIVEKIT_API_SECRET";

/// Environment variable holding the real-time service endpoint URL.
pub const WS_URL_VAR: &str = "LIVEKIT_WS_URL";

/// Default bind address.
pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:3000";

/// Default room every credential is scoped to.
pub const DEFAULT_ROOM_NAME: &str = "test";

/// Default credential lifetime in seconds (6 hours).
pub const DEFAULT_TOKEN_TTL_SECONDS: i64 = 21_600;

/// Maximum credential lifetime in seconds (24 hours).
pub const MAX_TOKEN_TTL_SECONDS: i64 = 86_400;

/// Default graceful shutdown drain period in seconds.
pub const DEFAULT_DRAIN_SECONDS: u64 = 0;

/// Signing material and the endpoint the signed credentials are valid for.
#[derive(Clone)]
pub struct SigningConfig {
    /// Signing key identifier, embedded as the token issuer.
    pub api_key: String,

    /// HMAC signing secret.
    pub api_secret: SecretString,

    /// Real-time service endpoint URL returned alongside each token.
    pub ws_url: String,
}

impl fmt::Debug for SigningConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SigningConfig")
            .field("api_key", &self.api_key)
            .field("api_secret", &"[REDACTED]")
            .field("ws_url", &self.ws_url)
            .finish()
    }
}

/// Credential issuer configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server bind address (default: "0.0.0.0:3000").
    pub bind_address: String,

    /// Fixed room name every credential is scoped to.
    pub room_name: String,

    /// Credential lifetime in seconds.
    pub token_ttl_seconds: i64,

    /// Seconds to keep draining connections after a shutdown signal.
    pub drain_seconds: u64,

    /// Signing material. `None` when any of the three variables is missing.
    pub signing: Option<SigningConfig>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid token TTL configuration: {0}")]
    InvalidTokenTtl(String),

    #[error("Invalid drain period configuration: {0}")]
    InvalidDrainSeconds(String),

    #[error("Invalid room name: {0}")]
    InvalidRoomName(String),
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(&env::vars().collect())
    }

    /// Load configuration from a HashMap (for testing).
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let bind_address = vars
            .get("BIND_ADDRESS")
            .cloned()
            .unwrap_or_else(|| DEFAULT_BIND_ADDRESS.to_string());

        let room_name = match vars.get("ROOM_NAME") {
            Some(value) if value.trim().is_empty() => {
                return Err(ConfigError::InvalidRoomName(
                    "ROOM_NAME must not be empty".to_string(),
                ));
            }
            Some(value) => value.clone(),
            None => DEFAULT_ROOM_NAME.to_string(),
        };

        let token_ttl_seconds = if let Some(value_str) = vars.get("TOKEN_TTL_SECONDS") {
            let value: i64 = value_str.parse().map_err(|e| {
                ConfigError::InvalidTokenTtl(format!(
                    "TOKEN_TTL_SECONDS must be a valid integer, got '{}': {}",
                    value_str, e
                ))
            })?;

            if value <= 0 {
                return Err(ConfigError::InvalidTokenTtl(format!(
                    "TOKEN_TTL_SECONDS must be positive, got {}",
                    value
                )));
            }

            if value > MAX_TOKEN_TTL_SECONDS {
                return Err(ConfigError::InvalidTokenTtl(format!(
                    "TOKEN_TTL_SECONDS must not exceed {} seconds, got {}",
                    MAX_TOKEN_TTL_SECONDS, value
                )));
            }

            value
        } else {
            DEFAULT_TOKEN_TTL_SECONDS
        };

        let drain_seconds = if let Some(value_str) = vars.get("ISSUER_DRAIN_SECONDS") {
            value_str.parse().map_err(|e| {
                ConfigError::InvalidDrainSeconds(format!(
                    "ISSUER_DRAIN_SECONDS must be a valid non-negative integer, got '{}': {}",
                    value_str, e
                ))
            })?
        } else {
            DEFAULT_DRAIN_SECONDS
        };

        Ok(Config {
            bind_address,
            room_name,
            token_ttl_seconds,
            drain_seconds,
            signing: signing_from_vars(vars),
        })
    }

    /// Names of the signing variables that are absent or empty.
    #[must_use]
    pub fn missing_signing_vars(vars: &HashMap<String, String>) -> Vec<&'static str> {
        [API_KEY_VAR, API_SECRET_VAR, WS_URL_VAR]
            .into_iter()
            .filter(|name| non_empty(vars, name).is_none())
            .collect()
    }
}

fn signing_from_vars(vars: &HashMap<String, String>) -> Option<SigningConfig> {
    let api_key = non_empty(vars, API_KEY_VAR)?;
    let api_secret = non_empty(vars, API_SECRET_VAR)?;
    let ws_url = non_empty(vars, WS_URL_VAR)?;

    Some(SigningConfig {
        api_key,
        api_secret: SecretString::from(api_secret),
        ws_url,
    })
}

/// Empty values count as missing.
fn non_empty(vars: &HashMap<String, String>, name: &str) -> Option<String> {
    vars.get(name).filter(|v| !v.is_empty()).cloned()
}
