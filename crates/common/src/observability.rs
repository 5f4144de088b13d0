//! Logging configuration shared by Room Pass binaries.
//!
//! Every binary initialises `tracing` the same way: an `EnvFilter` taken from
//! `RUST_LOG` (falling back to a per-binary default) and either human-readable
//! or JSON output selected by `LOG_FORMAT`.

use std::collections::HashMap;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Output format for log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Multi-field human-readable lines.
    #[default]
    Pretty,
    /// One JSON object per line.
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObservabilityConfig {
    /// Filter directives used when `RUST_LOG` is not set.
    pub default_directives: String,
    /// Output format.
    pub format: LogFormat,
}

impl ObservabilityConfig {
    /// Build from environment-style variables.
    ///
    /// `LOG_FORMAT=json` (case-insensitive) selects JSON output; anything else,
    /// including absence, selects pretty output.
    #[must_use]
    pub fn from_vars(vars: &HashMap<String, String>, default_directives: &str) -> Self {
        let format = match vars.get("LOG_FORMAT") {
            Some(value) if value.eq_ignore_ascii_case("json") => LogFormat::Json,
            _ => LogFormat::Pretty,
        };

        Self {
            default_directives: default_directives.to_string(),
            format,
        }
    }
}

/// Install the global tracing subscriber.
///
/// Safe to call once per process; a second call is ignored (the error from
/// `try_init` is discarded) so test binaries can call it freely.
pub fn init_tracing(config: &ObservabilityConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.default_directives));

    let result = match config.format {
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .try_init(),
        LogFormat::Pretty => tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .try_init(),
    };

    if result.is_err() {
        tracing::debug!(target: "common.observability", "Tracing subscriber already installed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_format_is_pretty() {
        let config = ObservabilityConfig::from_vars(&HashMap::new(), "issuer_service=debug");
        assert_eq!(config.format, LogFormat::Pretty);
        assert_eq!(config.default_directives, "issuer_service=debug");
    }

    #[test]
    fn test_json_format_case_insensitive() {
        let vars = HashMap::from([("LOG_FORMAT".to_string(), "JSON".to_string())]);
        let config = ObservabilityConfig::from_vars(&vars, "info");
        assert_eq!(config.format, LogFormat::Json);
    }

    #[test]
    fn test_unknown_format_falls_back_to_pretty() {
        let vars = HashMap::from([("LOG_FORMAT".to_string(), "xml".to_string())]);
        let config = ObservabilityConfig::from_vars(&vars, "info");
        assert_eq!(config.format, LogFormat::Pretty);
    }
}
