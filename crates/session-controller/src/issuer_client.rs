//! Credential issuer HTTP client.
//!
//! Fetches `{token, ws_url}` pairs from the issuer. The token is moved into a
//! `SecretString` as soon as the body is parsed and is only exposed when
//! handed to the real-time service.

use crate::errors::ControllerError;
use common::secret::SecretString;
use common::types::{ConnectionDetails, ErrorResponse};
use reqwest::Client;
use std::time::Duration;
use tracing::{error, instrument, warn};

/// Connect timeout for issuer requests in seconds.
const CONNECT_TIMEOUT_SECS: u64 = 5;

/// A credential held client-side for the lifetime of one session.
#[derive(Debug, Clone)]
pub struct Credential {
    /// Signed access token.
    pub token: SecretString,
    /// Real-time service endpoint URL the token is valid for.
    pub ws_url: String,
}

impl TryFrom<ConnectionDetails> for Credential {
    type Error = ControllerError;

    fn try_from(details: ConnectionDetails) -> Result<Self, Self::Error> {
        if details.token.is_empty() {
            return Err(ControllerError::InvalidResponse(
                "token is empty".to_string(),
            ));
        }
        if details.ws_url.is_empty() {
            return Err(ControllerError::InvalidResponse(
                "ws_url is empty".to_string(),
            ));
        }

        Ok(Self {
            token: SecretString::from(details.token),
            ws_url: details.ws_url,
        })
    }
}

/// Source of the human caller's credential (enables mocking).
#[async_trait::async_trait]
pub trait CredentialSource: Send + Sync {
    /// Fetch one caller credential.
    async fn fetch_credential(&self) -> Result<Credential, ControllerError>;
}

/// HTTP client for the credential issuer.
#[derive(Clone)]
pub struct IssuerClient {
    /// HTTP client with configured timeouts.
    client: Client,

    /// Issuer base URL, without trailing slash.
    base_url: String,
}

impl IssuerClient {
    /// Create a new issuer client.
    ///
    /// # Errors
    ///
    /// Returns `ControllerError::Config` if the HTTP client cannot be built.
    pub fn new(base_url: String, timeout: Duration) -> Result<Self, ControllerError> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS).min(timeout))
            .build()
            .map_err(|e| {
                error!(target: "sc.issuer_client", error = %e, "Failed to build HTTP client");
                ControllerError::Config(format!("failed to build HTTP client: {e}"))
            })?;

        Ok(Self { client, base_url })
    }

    /// Request a credential for the human caller.
    ///
    /// # Errors
    ///
    /// - `Transport` if the issuer is unreachable or times out
    /// - `Issuance` for any non-2xx status
    /// - `InvalidResponse` if a 2xx body is malformed or has empty fields
    #[instrument(skip_all)]
    pub async fn fetch_caller_credential(&self) -> Result<Credential, ControllerError> {
        let url = format!("{}/api/connection_details", self.base_url);
        self.get(&url, &[]).await
    }

    /// Request a credential for an automated participant of `agent_type`.
    ///
    /// Used by the automation side when it joins a dispatched participant;
    /// sessions themselves only fetch caller credentials.
    ///
    /// # Errors
    ///
    /// Same as [`IssuerClient::fetch_caller_credential`].
    #[instrument(skip(self))]
    pub async fn fetch_agent_credential(
        &self,
        agent_type: &str,
    ) -> Result<Credential, ControllerError> {
        let url = format!("{}/api/agent_connection_details", self.base_url);
        self.get(&url, &[("agent_type", agent_type)]).await
    }

    async fn get(&self, url: &str, query: &[(&str, &str)]) -> Result<Credential, ControllerError> {
        let response = self
            .client
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(|e| {
                warn!(target: "sc.issuer_client", error = %e, "Issuer request failed");
                ControllerError::Transport(e.to_string())
            })?;

        Self::handle_response(response).await
    }

    /// Map the issuer response to a credential or an error.
    async fn handle_response(response: reqwest::Response) -> Result<Credential, ControllerError> {
        let status = response.status();

        if status.is_success() {
            let details: ConnectionDetails = response.json().await.map_err(|e| {
                warn!(target: "sc.issuer_client", error = %e, "Failed to parse issuer response");
                ControllerError::InvalidResponse(e.to_string())
            })?;
            return Credential::try_from(details);
        }

        // Error bodies are `{"error": "..."}`; fall back to the raw text
        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorResponse>(&body)
            .map(|e| e.error)
            .unwrap_or(body);

        warn!(
            target: "sc.issuer_client",
            status = %status,
            message = %message,
            "Issuer refused credential request"
        );

        Err(ControllerError::Issuance {
            status: status.as_u16(),
            message,
        })
    }
}

#[async_trait::async_trait]
impl CredentialSource for IssuerClient {
    async fn fetch_credential(&self) -> Result<Credential, ControllerError> {
        self.fetch_caller_credential().await
    }
}
