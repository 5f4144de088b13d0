//! Integration tests for health probes and the metrics endpoint.

use issuer_test_utils::TestIssuerServer;
use reqwest::StatusCode;

// ============================================================================
// Liveness Probe Tests
// ============================================================================

/// `/health` answers OK even without signing configuration.
#[tokio::test]
async fn test_health_endpoint_returns_ok() -> Result<(), anyhow::Error> {
    let server = TestIssuerServer::spawn_misconfigured().await?;

    let response = reqwest::get(format!("{}/health", server.url())).await?;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.text().await?, "OK");

    Ok(())
}

// ============================================================================
// Readiness Probe Tests
// ============================================================================

#[tokio::test]
async fn test_ready_when_signing_configured() -> Result<(), anyhow::Error> {
    let server = TestIssuerServer::spawn_default().await?;

    let response = reqwest::get(format!("{}/ready", server.url())).await?;
    assert_eq!(response.status(), StatusCode::OK);

    let body: serde_json::Value = response.json().await?;
    assert_eq!(body["status"], "ready");
    assert_eq!(body["signing"], "configured");

    Ok(())
}

#[tokio::test]
async fn test_not_ready_without_signing() -> Result<(), anyhow::Error> {
    let server = TestIssuerServer::spawn_misconfigured().await?;

    let response = reqwest::get(format!("{}/ready", server.url())).await?;
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

    let body: serde_json::Value = response.json().await?;
    assert_eq!(body["status"], "not_ready");
    assert_eq!(body["signing"], "missing");

    Ok(())
}

// ============================================================================
// Metrics Endpoint Tests
// ============================================================================

#[tokio::test]
async fn test_metrics_endpoint_is_served() -> Result<(), anyhow::Error> {
    let server = TestIssuerServer::spawn_default().await?;

    let response = reqwest::get(format!("{}/metrics", server.url())).await?;
    assert_eq!(response.status(), StatusCode::OK);

    Ok(())
}
