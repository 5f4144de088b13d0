//! # Issuer Test Utilities
//!
//! Shared test utilities for the credential issuer.
//!
//! This crate provides:
//! - Fixed signing fixtures (key id, secret, endpoint URL)
//! - Server test harness (TestIssuerServer for E2E tests)
//! - Custom assertions (TokenAssertions trait)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use issuer_test_utils::*;
//!
//! #[tokio::test]
//! async fn test_example() -> anyhow::Result<()> {
//!     let server = TestIssuerServer::spawn_default().await?;
//!
//!     let details: ConnectionDetails = reqwest::get(server.caller_url())
//!         .await?
//!         .json()
//!         .await?;
//!
//!     details.token
//!         .assert_valid_jwt()
//!         .assert_identity("caller")
//!         .assert_full_grant(TEST_ROOM);
//!     Ok(())
//! }
//! ```

pub mod assertions;
pub mod crypto_fixtures;
pub mod server_harness;

// Re-export commonly used items
pub use assertions::*;
pub use crypto_fixtures::*;
pub use server_harness::*;
