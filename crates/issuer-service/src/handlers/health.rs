//! Health check handlers.
//!
//! - `/health`: Liveness probe - returns OK if the process is running
//! - `/ready`: Readiness probe - reports whether signing is configured

use crate::routes::AppState;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;
use std::sync::Arc;

/// Readiness probe body.
#[derive(Debug, Serialize)]
pub struct ReadinessResponse {
    pub status: &'static str,
    pub signing: &'static str,
}

/// Liveness probe handler.
///
/// Does NOT check configuration. A misconfigured issuer is still alive and
/// answers every issuance request with 500.
pub async fn health_check() -> &'static str {
    "OK"
}

/// Readiness probe handler.
///
/// Returns 200 when signing material is loaded, 503 otherwise so load
/// balancers stop routing to an issuer that can only return errors.
#[tracing::instrument(skip_all, name = "issuer.health.readiness")]
pub async fn readiness_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    if state.config.signing.is_none() {
        tracing::warn!(target: "issuer.health", "Readiness check failed: signing not configured");
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ReadinessResponse {
                status: "not_ready",
                signing: "missing",
            }),
        );
    }

    (
        StatusCode::OK,
        Json(ReadinessResponse {
            status: "ready",
            signing: "configured",
        }),
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_health_check() {
        assert_eq!(health_check().await, "OK");
    }

    #[test]
    fn test_readiness_response_serialization() {
        let json = serde_json::to_string(&ReadinessResponse {
            status: "not_ready",
            signing: "missing",
        })
        .unwrap();
        assert_eq!(json, r#"{"status":"not_ready","signing":"missing"}"#);
    }
}
