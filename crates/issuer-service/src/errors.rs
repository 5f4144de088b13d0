//! Credential issuer error types.
//!
//! Every error maps to an HTTP status and a `{"error": "<message>"}` body via
//! the `IntoResponse` impl. Messages returned to clients are fixed strings;
//! internal detail is logged server-side and never returned.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use common::types::ErrorResponse;
use thiserror::Error;

/// Credential issuer error type.
///
/// Maps to HTTP status codes:
/// - InvalidMethod, InvalidAgentType: 400 Bad Request
/// - Misconfigured, Signing: 500 Internal Server Error
#[derive(Debug, Error)]
pub enum IssuerError {
    /// Request used a method other than GET.
    #[error("Invalid method")]
    InvalidMethod,

    /// Agent issuance without a usable `agent_type` query parameter.
    #[error("Invalid or missing agent_type")]
    InvalidAgentType,

    /// Signing key, secret or endpoint URL is not configured.
    #[error("Server misconfigured")]
    Misconfigured,

    /// Token construction or signing failed. Carries internal detail.
    #[error("Signing failed: {0}")]
    Signing(String),
}

impl IssuerError {
    /// Returns the HTTP status code for this error (for metrics recording).
    pub fn status_code(&self) -> u16 {
        match self {
            IssuerError::InvalidMethod | IssuerError::InvalidAgentType => 400,
            IssuerError::Misconfigured | IssuerError::Signing(_) => 500,
        }
    }

    /// Bounded label for the `error` metric dimension.
    pub fn error_type(&self) -> &'static str {
        match self {
            IssuerError::InvalidMethod => "invalid_method",
            IssuerError::InvalidAgentType => "invalid_agent_type",
            IssuerError::Misconfigured => "misconfigured",
            IssuerError::Signing(_) => "signing",
        }
    }

    /// Message returned to the client.
    pub fn client_message(&self) -> &'static str {
        match self {
            IssuerError::InvalidMethod => "Invalid method",
            IssuerError::InvalidAgentType => "Invalid or missing agent_type",
            IssuerError::Misconfigured => "Server misconfigured",
            IssuerError::Signing(_) => "Internal server error",
        }
    }
}

impl IntoResponse for IssuerError {
    fn into_response(self) -> Response {
        let status = match &self {
            IssuerError::InvalidMethod | IssuerError::InvalidAgentType => StatusCode::BAD_REQUEST,
            IssuerError::Misconfigured => {
                tracing::error!(
                    target: "issuer.config",
                    "Issuance refused: signing configuration is incomplete"
                );
                StatusCode::INTERNAL_SERVER_ERROR
            }
            IssuerError::Signing(err) => {
                // Log actual error server-side, return generic message to client
                tracing::error!(target: "issuer.crypto", error = %err, "Credential signing failed");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        (status, Json(ErrorResponse::new(self.client_message()))).into_response()
    }
}
