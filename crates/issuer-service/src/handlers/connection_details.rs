//! Credential issuance endpoints.
//!
//! - `/api/connection_details`: credential for the human caller
//! - `/api/agent_connection_details?agent_type=<type>`: credential for an
//!   automated participant
//!
//! Both routes accept every method so a non-GET request answers with the
//! JSON 400 body instead of the router's bare 405. Checks run in a fixed
//! order: method, then signing configuration, then `agent_type`.

use crate::errors::IssuerError;
use crate::observability::{record_credential_issuance, IssuanceKind};
use crate::routes::AppState;
use crate::services::token_service::{self, IdentityHint};
use axum::extract::{Query, State};
use axum::http::Method;
use axum::Json;
use common::types::ConnectionDetails;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::instrument;

/// Handler for `/api/connection_details`.
#[instrument(skip_all, name = "issuer.connection_details")]
pub async fn connection_details(
    State(state): State<Arc<AppState>>,
    method: Method,
) -> Result<Json<ConnectionDetails>, IssuerError> {
    let start = Instant::now();
    let result = issue(&state, &method, || Ok(IdentityHint::Caller));
    finish(IssuanceKind::Caller, start, result)
}

/// Handler for `/api/agent_connection_details`.
#[instrument(skip_all, name = "issuer.agent_connection_details")]
pub async fn agent_connection_details(
    State(state): State<Arc<AppState>>,
    method: Method,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<ConnectionDetails>, IssuerError> {
    let start = Instant::now();
    let result = issue(&state, &method, || {
        IdentityHint::agent(params.get("agent_type").map(String::as_str))
    });

    if result.is_ok() {
        tracing::info!(
            target: "issuer.handlers",
            agent_type = params.get("agent_type").map(String::as_str).unwrap_or_default(),
            "Agent credential issued"
        );
    }

    finish(IssuanceKind::Agent, start, result)
}

fn issue(
    state: &AppState,
    method: &Method,
    hint: impl FnOnce() -> Result<IdentityHint, IssuerError>,
) -> Result<Json<ConnectionDetails>, IssuerError> {
    if method != Method::GET {
        tracing::debug!(target: "issuer.handlers", method = %method, "Rejected non-GET request");
        return Err(IssuerError::InvalidMethod);
    }

    let signing = state
        .config
        .signing
        .as_ref()
        .ok_or(IssuerError::Misconfigured)?;

    let hint = hint()?;

    token_service::issue_credential(
        signing,
        &state.config.room_name,
        state.config.token_ttl_seconds,
        &hint,
    )
    .map(Json)
}

fn finish(
    kind: IssuanceKind,
    start: Instant,
    result: Result<Json<ConnectionDetails>, IssuerError>,
) -> Result<Json<ConnectionDetails>, IssuerError> {
    record_credential_issuance(
        kind,
        result.as_ref().err().map(IssuerError::error_type),
        start.elapsed(),
    );
    result
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::config::{Config, SigningConfig};
    use common::jwt::decode_claims_unverified;
    use common::secret::SecretString;

    fn state(signing: Option<SigningConfig>) -> Arc<AppState> {
        let mut config = Config::from_vars(&HashMap::new()).unwrap();
        config.signing = signing;
        Arc::new(AppState { config })
    }

    fn signing() -> SigningConfig {
        SigningConfig {
            api_key: "APIhandlertest".to_string(),
            api_secret: SecretString::from("handler-test-secret"),
            ws_url: "wss://rtc.example.com".to_string(),
        }
    }

    fn agent_query(value: Option<&str>) -> Query<HashMap<String, String>> {
        let mut params = HashMap::new();
        if let Some(value) = value {
            params.insert("agent_type".to_string(), value.to_string());
        }
        Query(params)
    }

    #[tokio::test]
    async fn test_caller_credential() {
        let Json(details) = connection_details(State(state(Some(signing()))), Method::GET)
            .await
            .unwrap();

        assert_eq!(details.ws_url, "wss://rtc.example.com");
        let claims = decode_claims_unverified(&details.token).unwrap();
        assert_eq!(claims.identity(), "caller");
        assert_eq!(claims.iss, "APIhandlertest");
    }

    #[tokio::test]
    async fn test_post_is_invalid_method() {
        let result = connection_details(State(state(Some(signing()))), Method::POST).await;
        assert!(matches!(result, Err(IssuerError::InvalidMethod)));
    }

    #[tokio::test]
    async fn test_method_checked_before_configuration() {
        let result = connection_details(State(state(None)), Method::PUT).await;
        assert!(matches!(result, Err(IssuerError::InvalidMethod)));
    }

    #[tokio::test]
    async fn test_missing_configuration() {
        let result = connection_details(State(state(None)), Method::GET).await;
        assert!(matches!(result, Err(IssuerError::Misconfigured)));
    }

    #[tokio::test]
    async fn test_configuration_checked_before_agent_type() {
        let result =
            agent_connection_details(State(state(None)), Method::GET, agent_query(None)).await;
        assert!(matches!(result, Err(IssuerError::Misconfigured)));
    }

    #[tokio::test]
    async fn test_agent_credential() {
        let Json(details) = agent_connection_details(
            State(state(Some(signing()))),
            Method::GET,
            agent_query(Some("kitt")),
        )
        .await
        .unwrap();

        let claims = decode_claims_unverified(&details.token).unwrap();
        assert!(claims.identity().starts_with("kitt-"));
        assert_eq!(claims.room(), "test");
    }

    #[tokio::test]
    async fn test_agent_long_type_is_issued() {
        let agent_type = "a".repeat(65);
        let Json(details) = agent_connection_details(
            State(state(Some(signing()))),
            Method::GET,
            agent_query(Some(&agent_type)),
        )
        .await
        .unwrap();

        let claims = decode_claims_unverified(&details.token).unwrap();
        assert!(claims.identity().starts_with(&format!("{agent_type}-")));
    }

    #[tokio::test]
    async fn test_agent_missing_or_empty_type() {
        for value in [None, Some("")] {
            let result = agent_connection_details(
                State(state(Some(signing()))),
                Method::GET,
                agent_query(value),
            )
            .await;
            assert!(matches!(result, Err(IssuerError::InvalidAgentType)));
        }
    }
}
