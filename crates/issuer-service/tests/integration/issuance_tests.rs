//! Integration tests for credential issuance.
//!
//! Every test runs against a real issuer bound to an ephemeral port.

use common::jwt::DEFAULT_CLOCK_SKEW;
use common::types::{ConnectionDetails, ErrorResponse};
use issuer_service::config::DEFAULT_TOKEN_TTL_SECONDS;
use issuer_service::crypto::verify_access_token;
use issuer_test_utils::{
    test_config, test_secret, test_signing_config, TestIssuerServer, TokenAssertions,
    TEST_API_KEY, TEST_ROOM, TEST_WS_URL,
};
use reqwest::StatusCode;
use std::collections::HashSet;

// ============================================================================
// Caller Issuance
// ============================================================================

/// Full configuration: 200 with a token and the configured endpoint URL.
#[tokio::test]
async fn test_caller_issuance_returns_token_and_ws_url() -> Result<(), anyhow::Error> {
    let server = TestIssuerServer::spawn_default().await?;

    let response = reqwest::get(server.caller_url()).await?;
    assert_eq!(response.status(), StatusCode::OK);

    let details: ConnectionDetails = response.json().await?;
    assert!(!details.token.is_empty(), "token must not be empty");
    assert_eq!(details.ws_url, TEST_WS_URL);

    details
        .token
        .assert_valid_jwt()
        .assert_identity("caller")
        .assert_full_grant(TEST_ROOM)
        .assert_signed_by(TEST_API_KEY)
        .assert_expires_in(DEFAULT_TOKEN_TTL_SECONDS as u64);

    Ok(())
}

/// Tokens verify against the configured secret and nothing else.
#[tokio::test]
async fn test_caller_token_is_signed_with_configured_secret() -> Result<(), anyhow::Error> {
    let server = TestIssuerServer::spawn_default().await?;

    let details: ConnectionDetails = reqwest::get(server.caller_url()).await?.json().await?;

    let claims =
        verify_access_token(&details.token, TEST_API_KEY, &test_secret(), DEFAULT_CLOCK_SKEW)?;
    assert_eq!(claims.identity(), "caller");
    assert_eq!(claims.room(), TEST_ROOM);

    let wrong = common::secret::SecretString::from("not-the-secret");
    assert!(verify_access_token(&details.token, TEST_API_KEY, &wrong, DEFAULT_CLOCK_SKEW).is_err());

    Ok(())
}

/// The configured TTL and room flow into the token.
#[tokio::test]
async fn test_configured_ttl_and_room() -> Result<(), anyhow::Error> {
    let mut config = test_config(Some(test_signing_config()));
    config.token_ttl_seconds = 900;
    config.room_name = "lobby".to_string();
    let server = TestIssuerServer::spawn(config).await?;

    let details: ConnectionDetails = reqwest::get(server.caller_url()).await?.json().await?;

    details
        .token
        .assert_full_grant("lobby")
        .assert_expires_in(900);

    Ok(())
}

/// Query parameters on the caller endpoint are ignored.
#[tokio::test]
async fn test_caller_ignores_query() -> Result<(), anyhow::Error> {
    let server = TestIssuerServer::spawn_default().await?;

    let response = reqwest::get(format!("{}?agent_type=kitt&room=other", server.caller_url())).await?;
    assert_eq!(response.status(), StatusCode::OK);

    let details: ConnectionDetails = response.json().await?;
    details
        .token
        .assert_identity("caller")
        .assert_full_grant(TEST_ROOM);

    Ok(())
}

// ============================================================================
// Agent Issuance
// ============================================================================

/// `agent_type=kitt`: identity starts with "kitt-" followed by a UUID v4.
#[tokio::test]
async fn test_agent_issuance_identity_prefix() -> Result<(), anyhow::Error> {
    let server = TestIssuerServer::spawn_default().await?;

    let response = reqwest::get(server.agent_url("kitt")).await?;
    assert_eq!(response.status(), StatusCode::OK);

    let details: ConnectionDetails = response.json().await?;
    assert_eq!(details.ws_url, TEST_WS_URL);
    details
        .token
        .assert_valid_jwt()
        .assert_identity_prefix("kitt-")
        .assert_full_grant(TEST_ROOM);

    Ok(())
}

/// Repeated agent requests never produce the same identity.
#[tokio::test]
async fn test_agent_identities_are_unique() -> Result<(), anyhow::Error> {
    let server = TestIssuerServer::spawn_default().await?;
    let client = reqwest::Client::new();

    let mut identities = HashSet::new();
    for _ in 0..20 {
        let details: ConnectionDetails = client
            .get(server.agent_url("kitt"))
            .send()
            .await?
            .json()
            .await?;
        let claims = common::jwt::decode_claims_unverified(&details.token)?;
        identities.insert(claims.sub);
    }

    assert_eq!(identities.len(), 20, "every agent identity must be distinct");
    Ok(())
}

/// Missing `agent_type`: 400 with the fixed message.
#[tokio::test]
async fn test_agent_missing_type_rejected() -> Result<(), anyhow::Error> {
    let server = TestIssuerServer::spawn_default().await?;

    let response = reqwest::get(format!("{}/api/agent_connection_details", server.url())).await?;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body: ErrorResponse = response.json().await?;
    assert_eq!(body.error, "Invalid or missing agent_type");

    Ok(())
}

/// Empty `agent_type` is treated as missing.
#[tokio::test]
async fn test_agent_empty_type_rejected() -> Result<(), anyhow::Error> {
    let server = TestIssuerServer::spawn_default().await?;

    let response = reqwest::get(server.agent_url("")).await?;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body: ErrorResponse = response.json().await?;
    assert_eq!(body.error, "Invalid or missing agent_type");

    Ok(())
}

// ============================================================================
// Method Handling
// ============================================================================

/// POST to either issuance endpoint: 400 "Invalid method".
#[tokio::test]
async fn test_post_rejected_on_both_endpoints() -> Result<(), anyhow::Error> {
    let server = TestIssuerServer::spawn_default().await?;
    let client = reqwest::Client::new();

    for url in [server.caller_url(), server.agent_url("kitt")] {
        let response = client.post(&url).send().await?;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "POST {url}");

        let body: ErrorResponse = response.json().await?;
        assert_eq!(body.error, "Invalid method");
    }

    Ok(())
}

/// Method is checked before `agent_type`.
#[tokio::test]
async fn test_method_checked_before_agent_type() -> Result<(), anyhow::Error> {
    let server = TestIssuerServer::spawn_default().await?;

    let response = reqwest::Client::new()
        .delete(format!("{}/api/agent_connection_details", server.url()))
        .send()
        .await?;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body: ErrorResponse = response.json().await?;
    assert_eq!(body.error, "Invalid method");

    Ok(())
}
