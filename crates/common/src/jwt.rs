//! Access token utilities shared across Room Pass components.
//!
//! This module provides:
//! - The access token claims structure (`AccessClaims`) and its capability
//!   grant (`VideoGrant`), in the claim layout real-time media servers expect
//! - Size limits for DoS prevention
//! - Clock skew constants and `iat` validation
//! - Unverified claim decoding for clients that only need to read their own
//!   identity out of a token they were handed
//!
//! # Security
//!
//! - Tokens are size-checked BEFORE parsing
//! - `decode_claims_unverified` does NOT check the signature; it must never be
//!   used to make an authorization decision
//!
//! # Usage
//!
//! ```rust,ignore
//! use common::jwt::{decode_claims_unverified, VideoGrant};
//!
//! let claims = decode_claims_unverified(&details.token)?;
//! assert_eq!(claims.video.room, "test");
//! ```

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

// =============================================================================
// Constants
// =============================================================================

/// Maximum allowed JWT size in bytes (8KB).
///
/// Typical access tokens are 300-500 bytes. Anything larger than this is
/// rejected before any base64 decoding or JSON parsing.
pub const MAX_JWT_SIZE_BYTES: usize = 8192; // 8KB

/// Default JWT clock skew tolerance (5 minutes).
///
/// Tokens with `iat` more than this amount in the future are rejected.
pub const DEFAULT_CLOCK_SKEW: Duration = Duration::from_secs(300);

// =============================================================================
// Error Types
// =============================================================================

/// Errors that can occur while decoding or validating a token.
///
/// Note: Error messages are intentionally generic. Detail is logged at debug
/// level.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum JwtValidationError {
    /// Token size exceeds maximum allowed.
    #[error("The access token is invalid or expired")]
    TokenTooLarge,

    /// Token format is invalid (not a valid JWT structure).
    #[error("The access token is invalid or expired")]
    MalformedToken,

    /// Token `iat` claim is too far in the future.
    #[error("The access token is invalid or expired")]
    IatTooFarInFuture,

    /// Signature, issuer or time-window check failed.
    #[error("The access token is invalid or expired")]
    VerificationFailed,
}

// =============================================================================
// Claims Types
// =============================================================================

/// Capability grant attached to one (identity, room) pair.
///
/// Serialized with camelCase keys (`roomJoin`, `canPublish`, `canSubscribe`)
/// under the `video` claim. A grant without `room_join` is unusable; publish
/// and subscribe can be withheld independently.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoGrant {
    /// Room the grant applies to.
    pub room: String,
    /// Permission to join the room.
    pub room_join: bool,
    /// Permission to publish tracks.
    pub can_publish: bool,
    /// Permission to subscribe to other participants' tracks.
    pub can_subscribe: bool,
}

impl VideoGrant {
    /// Grant join, publish and subscribe for `room`.
    #[must_use]
    pub fn full(room: impl Into<String>) -> Self {
        Self {
            room: room.into(),
            room_join: true,
            can_publish: true,
            can_subscribe: true,
        }
    }

    /// Whether a credential carrying this grant can be used at all.
    #[must_use]
    pub fn is_usable(&self) -> bool {
        self.room_join && !self.room.is_empty()
    }
}

/// Access token claims.
///
/// # Fields
///
/// - `iss`: Signing key identifier
/// - `sub`: Participant identity
/// - `jti`: Token identifier (the identity)
/// - `iat`/`nbf`/`exp`: Unix epoch seconds
/// - `video`: Capability grant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessClaims {
    /// Issuer (signing key identifier).
    pub iss: String,

    /// Subject (participant identity).
    pub sub: String,

    /// Token identifier.
    pub jti: String,

    /// Issued-at timestamp (Unix epoch seconds).
    pub iat: i64,

    /// Not-before timestamp (Unix epoch seconds).
    pub nbf: i64,

    /// Expiration timestamp (Unix epoch seconds).
    pub exp: i64,

    /// Capability grant.
    pub video: VideoGrant,
}

impl AccessClaims {
    /// Build claims for `identity` valid from `now` for `ttl_seconds`.
    #[must_use]
    pub fn new(
        key_id: &str,
        identity: &str,
        grant: VideoGrant,
        now: i64,
        ttl_seconds: i64,
    ) -> Self {
        Self {
            iss: key_id.to_string(),
            sub: identity.to_string(),
            jti: identity.to_string(),
            iat: now,
            nbf: now,
            exp: now + ttl_seconds,
            video: grant,
        }
    }

    /// Participant identity carried by the token.
    #[must_use]
    pub fn identity(&self) -> &str {
        &self.sub
    }

    /// Room the token grants access to.
    #[must_use]
    pub fn room(&self) -> &str {
        &self.video.room
    }
}

// =============================================================================
// Functions
// =============================================================================

/// Decode the claims of a JWT without verifying its signature.
///
/// Clients use this to read their own identity and room out of a token they
/// just received from the issuer.
///
/// # Errors
///
/// - `TokenTooLarge` - Token exceeds `MAX_JWT_SIZE_BYTES`
/// - `MalformedToken` - Wrong structure, bad base64, or claims that do not
///   match `AccessClaims`
pub fn decode_claims_unverified(token: &str) -> Result<AccessClaims, JwtValidationError> {
    if token.len() > MAX_JWT_SIZE_BYTES {
        tracing::debug!(
            target: "common.jwt",
            token_size = token.len(),
            max_size = MAX_JWT_SIZE_BYTES,
            "Token rejected: size exceeds maximum allowed"
        );
        return Err(JwtValidationError::TokenTooLarge);
    }

    let mut parts = token.split('.');
    let (Some(_header), Some(payload), Some(_signature), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        tracing::debug!(target: "common.jwt", "Token rejected: invalid JWT format");
        return Err(JwtValidationError::MalformedToken);
    };

    let payload_bytes = URL_SAFE_NO_PAD.decode(payload).map_err(|e| {
        tracing::debug!(target: "common.jwt", error = %e, "Failed to decode JWT payload base64");
        JwtValidationError::MalformedToken
    })?;

    serde_json::from_slice(&payload_bytes).map_err(|e| {
        tracing::debug!(target: "common.jwt", error = %e, "Failed to parse JWT claims JSON");
        JwtValidationError::MalformedToken
    })
}

/// Validate the `iat` (issued-at) claim with clock skew tolerance.
///
/// # Errors
///
/// Returns `JwtValidationError::IatTooFarInFuture` if the iat timestamp is more
/// than `clock_skew` in the future.
pub fn validate_iat(iat: i64, clock_skew: Duration) -> Result<(), JwtValidationError> {
    let now = chrono::Utc::now().timestamp();
    validate_iat_at(iat, clock_skew, now)
}

/// Deterministic `iat` validation against an explicit `now` timestamp.
pub(crate) fn validate_iat_at(
    iat: i64,
    clock_skew: Duration,
    now: i64,
) -> Result<(), JwtValidationError> {
    // Safe cast: callers pass minute-scale tolerances
    #[allow(clippy::cast_possible_wrap)]
    let clock_skew_secs = clock_skew.as_secs() as i64;
    let max_iat = now + clock_skew_secs;

    if iat > max_iat {
        tracing::debug!(
            target: "common.jwt",
            iat = iat,
            now = now,
            max_allowed = max_iat,
            clock_skew_secs = clock_skew_secs,
            "Token rejected: iat too far in the future"
        );
        return Err(JwtValidationError::IatTooFarInFuture);
    }

    Ok(())
}

// =============================================================================
// Tests
// =============================================================================
