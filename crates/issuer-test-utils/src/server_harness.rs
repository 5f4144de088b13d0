//! Test server harness for E2E testing
//!
//! Provides TestIssuerServer for spawning real issuer instances in tests.

use crate::crypto_fixtures::{test_config, test_signing_config};
use issuer_service::config::Config;
use issuer_service::observability::init_metrics_recorder;
use issuer_service::routes::{self, AppState};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::task::JoinHandle;

/// Test harness for spawning the credential issuer in E2E tests
///
/// The server task is aborted when the harness is dropped.
///
/// # Example
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_issue_e2e() -> Result<()> {
///     let server = TestIssuerServer::spawn_default().await?;
///     let response = reqwest::get(server.caller_url()).await?;
///     assert_eq!(response.status(), 200);
///     Ok(())
/// }
/// ```
pub struct TestIssuerServer {
    addr: SocketAddr,
    config: Config,
    handle: JoinHandle<()>,
}

impl TestIssuerServer {
    /// Spawn a new test server instance with the given configuration
    ///
    /// The server will:
    /// - Bind to a random available port (127.0.0.1:0)
    /// - Serve the real issuer router, including `/metrics`
    /// - Run in a background task
    pub async fn spawn(config: Config) -> Result<Self, anyhow::Error> {
        let state = Arc::new(AppState {
            config: config.clone(),
        });

        // The global recorder can only be installed once per test process.
        // Later servers get a standalone recorder that is never installed.
        let metrics_handle = match init_metrics_recorder() {
            Ok(handle) => handle,
            Err(_) => {
                use metrics_exporter_prometheus::PrometheusBuilder;
                let recorder = PrometheusBuilder::new().build_recorder();
                recorder.handle()
            }
        };

        let app = routes::build_routes(state, Some(metrics_handle));

        // Bind to random port
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .map_err(|e| anyhow::anyhow!("Failed to bind test server: {}", e))?;

        let addr = listener
            .local_addr()
            .map_err(|e| anyhow::anyhow!("Failed to get local address: {}", e))?;

        let handle = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                eprintln!("Test server error: {}", e);
            }
        });

        Ok(Self {
            addr,
            config,
            handle,
        })
    }

    /// Spawn a fully configured issuer using the fixture signing material
    pub async fn spawn_default() -> Result<Self, anyhow::Error> {
        Self::spawn(test_config(Some(test_signing_config()))).await
    }

    /// Spawn an issuer with no signing material
    pub async fn spawn_misconfigured() -> Result<Self, anyhow::Error> {
        Self::spawn(test_config(None)).await
    }

    /// Get the base URL of the test server
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// URL of the caller issuance endpoint
    pub fn caller_url(&self) -> String {
        format!("{}/api/connection_details", self.url())
    }

    /// URL of the agent issuance endpoint with `agent_type` set,
    /// percent-encoded
    pub fn agent_url(&self, agent_type: &str) -> String {
        let endpoint = format!("{}/api/agent_connection_details", self.url());
        reqwest::Url::parse_with_params(&endpoint, &[("agent_type", agent_type)])
            .expect("Test server URL should always parse")
            .to_string()
    }

    /// Get the socket address
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Get reference to the server configuration
    pub fn config(&self) -> &Config {
        &self.config
    }
}

impl Drop for TestIssuerServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_spawn_binds_ephemeral_port() {
        let server = TestIssuerServer::spawn_default().await.unwrap();
        assert_ne!(server.addr().port(), 0);
        assert!(server.url().starts_with("http://127.0.0.1:"));
        assert!(server.config().signing.is_some());
    }

    #[tokio::test]
    async fn test_health_responds() {
        let server = TestIssuerServer::spawn_misconfigured().await.unwrap();
        let body = reqwest::get(format!("{}/health", server.url()))
            .await
            .unwrap()
            .text()
            .await
            .unwrap();
        assert_eq!(body, "OK");
    }

    #[tokio::test]
    async fn test_agent_url_encodes_agent_type() {
        let server = TestIssuerServer::spawn_default().await.unwrap();

        let url = server.agent_url("kitt & co/1");
        assert!(url.ends_with("/api/agent_connection_details?agent_type=kitt+%26+co%2F1"));

        let response = reqwest::get(&url).await.unwrap();
        assert_eq!(response.status(), reqwest::StatusCode::OK);
        let details: common::types::ConnectionDetails = response.json().await.unwrap();
        let claims = common::jwt::decode_claims_unverified(&details.token).unwrap();
        assert!(claims.identity().starts_with("kitt & co/1-"));
    }
}
