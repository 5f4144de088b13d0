//! Secret types for protecting sensitive values from accidental logging.
//!
//! This module re-exports types from the [`secrecy`] crate. Use these types for
//! the signing secret held by the issuer and for access tokens held by clients.
//!
//! # Compile-Time Safety
//!
//! `SecretString` implements `Debug` with redaction, so any struct that derives
//! `Debug` while holding one gets safe logging behavior for free.
//!
//! # Example
//!
//! ```rust
//! use common::secret::SecretString;
//! use secrecy::ExposeSecret;
//!
//! #[derive(Debug)]
//! struct SigningMaterial {
//!     key_id: String,
//!     secret: SecretString,  // Safe: Debug shows "[REDACTED]"
//! }
//!
//! let material = SigningMaterial {
//!     key_id: "APIdevkey".to_string(),
//!     secret: SecretString::from("hunter2"),
//! };
//!
//! // This is safe - secret is redacted
//! println!("{:?}", material);
//!
//! // To access the actual value, you must explicitly call expose_secret()
//! let secret: &str = material.secret.expose_secret();
//! ```
//!
//! # Usage Guidelines
//!
//! Use `SecretString` for:
//! - The issuer's signing secret (`LIVEKIT_API_SECRET`)
//! - Access tokens held client-side for the lifetime of one session

// Re-export the main types from secrecy
pub use secrecy::{ExposeSecret, SecretString};

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[test]
    fn test_debug_is_redacted() {
        let secret = SecretString::from("hunter2");
        let debug_str = format!("{secret:?}");

        assert!(debug_str.contains("REDACTED"));
        assert!(!debug_str.contains("hunter2"));
    }

    #[test]
    fn test_expose_secret_returns_inner_value() {
        let secret = SecretString::from("signing-secret");
        assert_eq!(secret.expose_secret(), "signing-secret");
    }

    #[test]
    fn test_struct_with_secret_is_safe() {
        #[allow(dead_code)]
        #[derive(Debug)]
        struct HeldCredential {
            ws_url: String,
            token: SecretString,
        }

        let held = HeldCredential {
            ws_url: "wss://rtc.example.com".to_string(),
            token: SecretString::from("eyJhbGciOiJIUzI1NiJ9.payload.sig"),
        };

        let debug_str = format!("{held:?}");

        assert!(debug_str.contains("wss://rtc.example.com"));
        assert!(debug_str.contains("REDACTED"));
        assert!(!debug_str.contains("eyJhbGciOiJIUzI1NiJ9"));
    }

    #[test]
    fn test_deserialize() {
        #[allow(dead_code)]
        #[derive(Debug, Deserialize)]
        struct Details {
            ws_url: String,
            token: SecretString,
        }

        let json = r#"{"ws_url": "wss://rtc", "token": "my-token-value"}"#;
        let details: Details = serde_json::from_str(json).expect("deserialize");

        assert_eq!(details.token.expose_secret(), "my-token-value");

        let debug = format!("{details:?}");
        assert!(!debug.contains("my-token-value"));
        assert!(debug.contains("REDACTED"));
    }
}
