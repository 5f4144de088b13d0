//! Credential issuance.
//!
//! Builds the participant identity, attaches the full capability grant for
//! the configured room and signs the result. Nothing is stored: two calls
//! with the same input produce independent credentials.

use crate::config::SigningConfig;
use crate::crypto;
use crate::errors::IssuerError;
use crate::observability::IssuanceKind;
use common::jwt::{AccessClaims, VideoGrant};
use common::types::ConnectionDetails;
use tracing::instrument;
use uuid::Uuid;

/// Identity of every human caller.
pub const CALLER_IDENTITY: &str = "caller";

/// Who a credential is being issued for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentityHint {
    /// The human caller.
    Caller,
    /// An automated participant of the given category.
    Agent(String),
}

impl IdentityHint {
    /// Validate the `agent_type` query value.
    ///
    /// Absent and blank values are rejected. Any other value is used as is.
    pub fn agent(agent_type: Option<&str>) -> Result<Self, IssuerError> {
        match agent_type {
            Some(value) if !value.trim().is_empty() => {
                Ok(IdentityHint::Agent(value.to_string()))
            }
            _ => Err(IssuerError::InvalidAgentType),
        }
    }

    /// Build the participant identity.
    ///
    /// Agents get a fresh UUID v4 suffix on every call.
    pub fn identity(&self) -> String {
        match self {
            IdentityHint::Caller => CALLER_IDENTITY.to_string(),
            IdentityHint::Agent(agent_type) => format!("{}-{}", agent_type, Uuid::new_v4()),
        }
    }

    pub fn kind(&self) -> IssuanceKind {
        match self {
            IdentityHint::Caller => IssuanceKind::Caller,
            IdentityHint::Agent(_) => IssuanceKind::Agent,
        }
    }
}

/// Issue a credential for `hint` scoped to `room`.
#[instrument(skip_all, fields(kind = hint.kind().as_str()))]
pub fn issue_credential(
    signing: &SigningConfig,
    room: &str,
    ttl_seconds: i64,
    hint: &IdentityHint,
) -> Result<ConnectionDetails, IssuerError> {
    sign_grant(
        signing,
        &hint.identity(),
        VideoGrant::full(room),
        ttl_seconds,
    )
}

/// Sign `grant` for `identity`. Unusable grants are never signed.
fn sign_grant(
    signing: &SigningConfig,
    identity: &str,
    grant: VideoGrant,
    ttl_seconds: i64,
) -> Result<ConnectionDetails, IssuerError> {
    if !grant.is_usable() {
        return Err(IssuerError::Signing(
            "refusing to sign a grant without room join".to_string(),
        ));
    }

    let now = chrono::Utc::now().timestamp();
    let claims = AccessClaims::new(&signing.api_key, identity, grant, now, ttl_seconds);
    let token = crypto::sign_access_token(&claims, &signing.api_secret)?;

    tracing::debug!(
        target: "issuer.token_service",
        room = %claims.video.room,
        exp = claims.exp,
        "Credential signed"
    );

    Ok(ConnectionDetails {
        token,
        ws_url: signing.ws_url.clone(),
    })
}
