//! Fixed signing fixtures for testing.
//!
//! Every test issuer signs with the same key id and secret so tokens can be
//! verified without reaching into the server.

use common::secret::SecretString;
use issuer_service::config::{Config, SigningConfig, DEFAULT_TOKEN_TTL_SECONDS};

/// Signing key identifier used by test issuers.
pub const TEST_API_KEY: &str = "APItestfixture";

/// Signing secret used by test issuers.
pub const TEST_API_SECRET: &str = "test-fixture-secret-do-not-use-in-production";

/// Real-time endpoint URL returned by test issuers.
pub const TEST_WS_URL: &str = "wss://rtc.test.invalid";

/// Room test issuers scope credentials to.
pub const TEST_ROOM: &str = "test";

/// The fixture secret wrapped for the signing APIs.
pub fn test_secret() -> SecretString {
    SecretString::from(TEST_API_SECRET)
}

/// Signing configuration built from the fixtures.
pub fn test_signing_config() -> SigningConfig {
    SigningConfig {
        api_key: TEST_API_KEY.to_string(),
        api_secret: test_secret(),
        ws_url: TEST_WS_URL.to_string(),
    }
}

/// Issuer configuration bound to an ephemeral local port.
///
/// Pass `signing: None` to model an issuer started without its
/// `LIVEKIT_*` variables.
pub fn test_config(signing: Option<SigningConfig>) -> Config {
    Config {
        bind_address: "127.0.0.1:0".to_string(),
        room_name: TEST_ROOM.to_string(),
        token_ttl_seconds: DEFAULT_TOKEN_TTL_SECONDS,
        drain_seconds: 0,
        signing,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::secret::ExposeSecret;

    #[test]
    fn test_signing_config_uses_fixtures() {
        let signing = test_signing_config();
        assert_eq!(signing.api_key, TEST_API_KEY);
        assert_eq!(signing.api_secret.expose_secret(), TEST_API_SECRET);
        assert_eq!(signing.ws_url, TEST_WS_URL);
    }

    #[test]
    fn test_config_without_signing() {
        let config = test_config(None);
        assert!(config.signing.is_none());
        assert_eq!(config.room_name, TEST_ROOM);
    }
}
