//! Custom test assertions for expressive tests
//!
//! Provides trait-based assertions for issued access tokens.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use common::jwt::AccessClaims;
use serde::Deserialize;

/// JWT header structure
#[derive(Debug, Deserialize)]
struct JwtHeader {
    pub alg: String,
    pub typ: String,
}

fn segment(token: &str, index: usize) -> Vec<u8> {
    let part = token
        .split('.')
        .nth(index)
        .unwrap_or_else(|| panic!("JWT is missing segment {}", index));
    URL_SAFE_NO_PAD
        .decode(part)
        .unwrap_or_else(|e| panic!("Failed to base64 decode JWT segment {}: {}", index, e))
}

fn claims(token: &str) -> AccessClaims {
    serde_json::from_slice(&segment(token, 1)).expect("Failed to parse JWT claims")
}

/// Custom assertions for issued tokens
///
/// # Example
/// ```rust,ignore
/// details.token
///     .assert_valid_jwt()
///     .assert_identity_prefix("kitt-")
///     .assert_full_grant("test")
///     .assert_signed_by(TEST_API_KEY);
/// ```
pub trait TokenAssertions {
    /// Assert that the token is an HS256 JWT carrying access claims
    fn assert_valid_jwt(&self) -> &Self;

    /// Assert that the token is for exactly this identity
    fn assert_identity(&self, identity: &str) -> &Self;

    /// Assert that the identity is `prefix` followed by a UUID v4
    fn assert_identity_prefix(&self, prefix: &str) -> &Self;

    /// Assert join, publish and subscribe are granted for `room`
    fn assert_full_grant(&self, room: &str) -> &Self;

    /// Assert that the token names `key_id` as its issuer
    fn assert_signed_by(&self, key_id: &str) -> &Self;

    /// Assert that the token expires within the specified seconds
    fn assert_expires_in(&self, seconds: u64) -> &Self;
}

impl TokenAssertions for String {
    fn assert_valid_jwt(&self) -> &Self {
        let parts = self.split('.').count();
        assert_eq!(
            parts, 3,
            "JWT must have 3 parts (header.payload.signature), got {}",
            parts
        );

        let header: JwtHeader =
            serde_json::from_slice(&segment(self, 0)).expect("Failed to parse JWT header JSON");
        assert_eq!(header.alg, "HS256", "Expected HS256 algorithm");
        assert_eq!(header.typ, "JWT", "Expected JWT type");

        let claims = claims(self);
        assert_eq!(claims.sub, claims.jti, "jti must repeat the identity");
        assert!(claims.exp > claims.iat, "exp must follow iat");

        self
    }

    fn assert_identity(&self, identity: &str) -> &Self {
        let claims = claims(self);
        assert_eq!(
            claims.identity(),
            identity,
            "Expected identity '{}', got '{}'",
            identity,
            claims.identity()
        );
        self
    }

    fn assert_identity_prefix(&self, prefix: &str) -> &Self {
        let claims = claims(self);
        let suffix = claims.identity().strip_prefix(prefix).unwrap_or_else(|| {
            panic!(
                "Expected identity starting with '{}', got '{}'",
                prefix,
                claims.identity()
            )
        });

        let uuid = uuid::Uuid::parse_str(suffix)
            .unwrap_or_else(|e| panic!("Identity suffix '{}' is not a UUID: {}", suffix, e));
        assert_eq!(uuid.get_version_num(), 4, "Identity suffix must be UUID v4");

        self
    }

    fn assert_full_grant(&self, room: &str) -> &Self {
        let claims = claims(self);
        assert_eq!(claims.video.room, room, "Grant is for the wrong room");
        assert!(claims.video.room_join, "Grant must allow room join");
        assert!(claims.video.can_publish, "Grant must allow publish");
        assert!(claims.video.can_subscribe, "Grant must allow subscribe");
        self
    }

    fn assert_signed_by(&self, key_id: &str) -> &Self {
        let claims = claims(self);
        assert_eq!(
            claims.iss, key_id,
            "Expected issuer '{}', got '{}'",
            key_id, claims.iss
        );
        self
    }

    fn assert_expires_in(&self, seconds: u64) -> &Self {
        let claims = claims(self);
        let now = chrono::Utc::now().timestamp();
        let expires_in = claims.exp - now;

        // Allow 5-second tolerance for clock skew
        assert!(
            (expires_in - seconds as i64).abs() <= 5,
            "Expected token to expire in {} seconds, but expires in {} seconds",
            seconds,
            expires_in
        );

        self
    }
}
