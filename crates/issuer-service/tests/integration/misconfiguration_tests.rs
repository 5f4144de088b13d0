//! Integration tests for an issuer started without complete signing
//! configuration.

use common::types::ErrorResponse;
use issuer_test_utils::{test_config, test_signing_config, TestIssuerServer};
use reqwest::StatusCode;

/// Missing `ws_url`: both endpoints answer 500 "Server misconfigured".
///
/// An empty value is dropped at load time, so building the config through
/// `from_vars` is the same path the binary takes.
#[tokio::test]
async fn test_missing_ws_url_fails_every_request() -> Result<(), anyhow::Error> {
    let vars = std::collections::HashMap::from([
        ("LIVEKIT_API_KEY".to_string(), "APIkey".to_string()),
        ("LIVEKIT_API_SECRET".to_string(), "secret".to_string()),
        ("LIVEKIT_WS_URL".to_string(), String::new()),
        ("BIND_ADDRESS".to_string(), "127.0.0.1:0".to_string()),
    ]);
    let config = issuer_service::config::Config::from_vars(&vars)?;
    let server = TestIssuerServer::spawn(config).await?;
    let client = reqwest::Client::new();

    for url in [server.caller_url(), server.agent_url("kitt")] {
        let response = client.get(&url).send().await?;
        assert_eq!(
            response.status(),
            StatusCode::INTERNAL_SERVER_ERROR,
            "GET {url}"
        );

        let body: ErrorResponse = response.json().await?;
        assert_eq!(body.error, "Server misconfigured");
    }

    Ok(())
}

/// Configuration is checked before `agent_type`.
#[tokio::test]
async fn test_configuration_checked_before_agent_type() -> Result<(), anyhow::Error> {
    let server = TestIssuerServer::spawn_misconfigured().await?;

    let response = reqwest::get(format!("{}/api/agent_connection_details", server.url())).await?;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let body: ErrorResponse = response.json().await?;
    assert_eq!(body.error, "Server misconfigured");

    Ok(())
}

/// Method is still checked first on a misconfigured issuer.
#[tokio::test]
async fn test_method_checked_before_configuration() -> Result<(), anyhow::Error> {
    let server = TestIssuerServer::spawn_misconfigured().await?;

    let response = reqwest::Client::new()
        .post(server.caller_url())
        .send()
        .await?;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body: ErrorResponse = response.json().await?;
    assert_eq!(body.error, "Invalid method");

    Ok(())
}

/// Restoring configuration is a restart: a new issuer with signing works.
#[tokio::test]
async fn test_configured_issuer_alongside_misconfigured() -> Result<(), anyhow::Error> {
    let broken = TestIssuerServer::spawn_misconfigured().await?;
    let working = TestIssuerServer::spawn(test_config(Some(test_signing_config()))).await?;

    assert_eq!(
        reqwest::get(broken.caller_url()).await?.status(),
        StatusCode::INTERNAL_SERVER_ERROR
    );
    assert_eq!(
        reqwest::get(working.caller_url()).await?.status(),
        StatusCode::OK
    );

    Ok(())
}
