//! Metrics definitions for the credential issuer.
//!
//! All metrics follow Prometheus naming conventions:
//! - `issuer_` prefix
//! - `_total` suffix for counters
//! - `_seconds` suffix for duration histograms
//!
//! # Cardinality
//!
//! Labels are bounded:
//! - `kind`: 2 values (caller, agent)
//! - `status`: 2 values (success, error)
//! - `error`: one value per `IssuerError` variant plus "none"

use metrics::{counter, histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use std::time::Duration;

/// Which issuance endpoint produced a credential.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssuanceKind {
    /// `/api/connection_details`
    Caller,
    /// `/api/agent_connection_details`
    Agent,
}

impl IssuanceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            IssuanceKind::Caller => "caller",
            IssuanceKind::Agent => "agent",
        }
    }
}

/// Initialize Prometheus metrics recorder and return the handle
/// for serving metrics via HTTP.
///
/// Must be called before any metrics are recorded. Issuance is a pure
/// in-memory HMAC operation, so the buckets sit well below a millisecond.
///
/// # Errors
///
/// Returns error if Prometheus recorder fails to install (e.g., already installed).
pub fn init_metrics_recorder() -> Result<PrometheusHandle, String> {
    PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Prefix("issuer_issuance".to_string()),
            &[
                0.0001, 0.00025, 0.0005, 0.001, 0.0025, 0.005, 0.010, 0.025, 0.050, 0.100,
            ],
        )
        .map_err(|e| format!("Failed to set issuance buckets: {e}"))?
        .install_recorder()
        .map_err(|e| format!("Failed to install Prometheus recorder: {e}"))
}

/// Record one issuance attempt.
///
/// Metric: `issuer_credentials_issued_total`, `issuer_issuance_duration_seconds`
/// Labels: `kind`, `status`, `error`
pub fn record_credential_issuance(
    kind: IssuanceKind,
    error_type: Option<&'static str>,
    duration: Duration,
) {
    let status = if error_type.is_some() {
        "error"
    } else {
        "success"
    };

    histogram!("issuer_issuance_duration_seconds", "kind" => kind.as_str())
        .record(duration.as_secs_f64());

    counter!(
        "issuer_credentials_issued_total",
        "kind" => kind.as_str(),
        "status" => status,
        "error" => error_type.unwrap_or("none")
    )
    .increment(1);
}
