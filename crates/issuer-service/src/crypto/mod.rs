//! Access token signing and verification.
//!
//! Tokens are HS256 JWTs keyed by the configured signing secret, with the
//! signing key identifier as `iss`. Verification exists so the service's own
//! tests and harness can prove a token was produced with a given secret; the
//! real-time service does the production verification.

use crate::errors::IssuerError;
use common::jwt::{validate_iat, AccessClaims, JwtValidationError, MAX_JWT_SIZE_BYTES};
use common::secret::{ExposeSecret, SecretString};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use std::time::Duration;
use tracing::instrument;

/// Sign `claims` with HS256 using `secret`.
#[instrument(skip_all)]
pub fn sign_access_token(claims: &AccessClaims, secret: &SecretString) -> Result<String, IssuerError> {
    let encoding_key = EncodingKey::from_secret(secret.expose_secret().as_bytes());

    let mut header = Header::new(Algorithm::HS256);
    header.typ = Some("JWT".to_string());

    encode(&header, claims, &encoding_key)
        .map_err(|e| IssuerError::Signing(format!("JWT signing operation failed: {}", e)))
}

/// Verify an HS256 access token.
///
/// Validates:
/// - Token size (must be <= MAX_JWT_SIZE_BYTES), checked before parsing
/// - Signature against `secret`
/// - `iss` equals `key_id`
/// - `exp` and `nbf`
/// - `iat` no further than `clock_skew` in the future
#[instrument(skip_all)]
pub fn verify_access_token(
    token: &str,
    key_id: &str,
    secret: &SecretString,
    clock_skew: Duration,
) -> Result<AccessClaims, JwtValidationError> {
    if token.len() > MAX_JWT_SIZE_BYTES {
        tracing::debug!(
            target: "issuer.crypto",
            token_size = token.len(),
            max_size = MAX_JWT_SIZE_BYTES,
            "Token rejected: size exceeds maximum allowed"
        );
        return Err(JwtValidationError::TokenTooLarge);
    }

    let decoding_key = DecodingKey::from_secret(secret.expose_secret().as_bytes());

    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = true;
    validation.validate_nbf = true;
    validation.set_issuer(&[key_id]);
    validation.set_required_spec_claims(&["exp", "nbf", "iss", "sub"]);

    let token_data = decode::<AccessClaims>(token, &decoding_key, &validation).map_err(|e| {
        tracing::debug!(target: "issuer.crypto", error = %e, "Token verification failed");
        JwtValidationError::VerificationFailed
    })?;

    validate_iat(token_data.claims.iat, clock_skew)?;

    Ok(token_data.claims)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use common::jwt::{VideoGrant, DEFAULT_CLOCK_SKEW};

    const KEY_ID: &str = "APIunittest";

    fn secret() -> SecretString {
        SecretString::from("unit-test-signing-secret-0123456789")
    }

    fn claims_at(now: i64, ttl: i64) -> AccessClaims {
        AccessClaims::new(KEY_ID, "caller", VideoGrant::full("test"), now, ttl)
    }

    #[test]
    fn test_sign_and_verify() {
        let now = chrono::Utc::now().timestamp();
        let claims = claims_at(now, 600);

        let token = sign_access_token(&claims, &secret()).unwrap();
        let verified = verify_access_token(&token, KEY_ID, &secret(), DEFAULT_CLOCK_SKEW).unwrap();

        assert_eq!(verified, claims);
    }

    #[test]
    fn test_header_is_hs256_jwt() {
        let now = chrono::Utc::now().timestamp();
        let token = sign_access_token(&claims_at(now, 600), &secret()).unwrap();

        let header = jsonwebtoken::decode_header(&token).unwrap();
        assert_eq!(header.alg, Algorithm::HS256);
        assert_eq!(header.typ.as_deref(), Some("JWT"));
    }

    #[test]
    fn test_verify_rejects_wrong_secret() {
        let now = chrono::Utc::now().timestamp();
        let token = sign_access_token(&claims_at(now, 600), &secret()).unwrap();

        let other = SecretString::from("a-different-secret");
        let result = verify_access_token(&token, KEY_ID, &other, DEFAULT_CLOCK_SKEW);
        assert_eq!(result, Err(JwtValidationError::VerificationFailed));
    }

    #[test]
    fn test_verify_rejects_wrong_issuer() {
        let now = chrono::Utc::now().timestamp();
        let token = sign_access_token(&claims_at(now, 600), &secret()).unwrap();

        let result = verify_access_token(&token, "APIother", &secret(), DEFAULT_CLOCK_SKEW);
        assert_eq!(result, Err(JwtValidationError::VerificationFailed));
    }

    #[test]
    fn test_verify_rejects_expired() {
        // Well past the default 60s leeway
        let issued = chrono::Utc::now().timestamp() - 7200;
        let token = sign_access_token(&claims_at(issued, 600), &secret()).unwrap();

        let result = verify_access_token(&token, KEY_ID, &secret(), DEFAULT_CLOCK_SKEW);
        assert_eq!(result, Err(JwtValidationError::VerificationFailed));
    }

    #[test]
    fn test_verify_rejects_future_iat() {
        let future = chrono::Utc::now().timestamp() + 3600;
        let mut claims = claims_at(future, 600);
        // Keep nbf valid so only the iat check can fail
        claims.nbf = chrono::Utc::now().timestamp();

        let token = sign_access_token(&claims, &secret()).unwrap();
        let result = verify_access_token(&token, KEY_ID, &secret(), DEFAULT_CLOCK_SKEW);
        assert_eq!(result, Err(JwtValidationError::IatTooFarInFuture));
    }

    #[test]
    fn test_verify_rejects_oversized_token() {
        let oversized = "a".repeat(MAX_JWT_SIZE_BYTES + 1);
        let result = verify_access_token(&oversized, KEY_ID, &secret(), DEFAULT_CLOCK_SKEW);
        assert_eq!(result, Err(JwtValidationError::TokenTooLarge));
    }

    #[test]
    fn test_verify_rejects_garbage() {
        let result = verify_access_token("not.a.jwt", KEY_ID, &secret(), DEFAULT_CLOCK_SKEW);
        assert_eq!(result, Err(JwtValidationError::VerificationFailed));
    }
}
