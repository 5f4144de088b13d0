//! Wire types shared by the credential issuer and its clients.

use serde::{Deserialize, Serialize};

/// Successful issuance response body.
///
/// `token` is the signed access token, `ws_url` the real-time service endpoint
/// the token is valid for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionDetails {
    /// Signed access token (JWT).
    pub token: String,
    /// Real-time service endpoint URL.
    pub ws_url: String,
}

/// Error response body returned by the issuer for every non-2xx status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Human-readable error message.
    pub error: String,
}

impl ErrorResponse {
    /// Create a new error body.
    #[must_use]
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}
