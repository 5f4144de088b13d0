//! Session Controller configuration.

use crate::errors::ControllerError;
use std::collections::HashMap;
use std::env;
use std::time::Duration;

/// Default issuer base URL.
pub const DEFAULT_ISSUER_URL: &str = "http://localhost:3000";

/// Default automation-control base URL.
pub const DEFAULT_AUTOMATION_URL: &str = "http://localhost:8000";

/// Default automated participant category.
pub const DEFAULT_AGENT_TYPE: &str = "kitt";

/// Default HTTP request timeout in seconds.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

/// Maximum HTTP request timeout in seconds.
pub const MAX_REQUEST_TIMEOUT_SECS: u64 = 60;

/// Session Controller configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerConfig {
    /// Credential issuer base URL.
    pub issuer_url: String,

    /// Automation-control base URL.
    pub automation_url: String,

    /// Category sent when inviting an automated participant.
    pub agent_type: String,

    /// Timeout applied to every HTTP request.
    pub request_timeout: Duration,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            issuer_url: DEFAULT_ISSUER_URL.to_string(),
            automation_url: DEFAULT_AUTOMATION_URL.to_string(),
            agent_type: DEFAULT_AGENT_TYPE.to_string(),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
        }
    }
}

impl ControllerConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ControllerError> {
        Self::from_vars(&env::vars().collect())
    }

    /// Load configuration from a HashMap (for testing).
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ControllerError> {
        let issuer_url = base_url(vars, "ISSUER_URL", DEFAULT_ISSUER_URL)?;
        let automation_url = base_url(vars, "AUTOMATION_URL", DEFAULT_AUTOMATION_URL)?;

        let agent_type = match vars.get("AGENT_TYPE") {
            Some(value) if value.trim().is_empty() => {
                return Err(ControllerError::Config(
                    "AGENT_TYPE must not be empty".to_string(),
                ));
            }
            Some(value) => value.clone(),
            None => DEFAULT_AGENT_TYPE.to_string(),
        };

        let timeout_secs = if let Some(value_str) = vars.get("CONTROLLER_REQUEST_TIMEOUT_SECS") {
            let value: u64 = value_str.parse().map_err(|e| {
                ControllerError::Config(format!(
                    "CONTROLLER_REQUEST_TIMEOUT_SECS must be a valid integer, got '{}': {}",
                    value_str, e
                ))
            })?;

            if value == 0 || value > MAX_REQUEST_TIMEOUT_SECS {
                return Err(ControllerError::Config(format!(
                    "CONTROLLER_REQUEST_TIMEOUT_SECS must be between 1 and {}, got {}",
                    MAX_REQUEST_TIMEOUT_SECS, value
                )));
            }

            value
        } else {
            DEFAULT_REQUEST_TIMEOUT_SECS
        };

        Ok(Self {
            issuer_url,
            automation_url,
            agent_type,
            request_timeout: Duration::from_secs(timeout_secs),
        })
    }
}

/// Read a base URL, trimming any trailing slash so paths can be appended.
fn base_url(
    vars: &HashMap<String, String>,
    name: &str,
    default: &str,
) -> Result<String, ControllerError> {
    let value = vars.get(name).map_or(default, String::as_str);

    if !(value.starts_with("http://") || value.starts_with("https://")) {
        return Err(ControllerError::Config(format!(
            "{} must be an http(s) URL, got '{}'",
            name, value
        )));
    }

    Ok(value.trim_end_matches('/').to_string())
}
