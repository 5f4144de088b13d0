//! Automation-control client.
//!
//! Inviting an automated participant is a best-effort side action: the
//! session fires the request on a detached task and only logs the outcome.

use crate::errors::ControllerError;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;
use tracing::{error, instrument};

/// Body of `POST /add_agent`.
#[derive(Debug, Clone, Serialize)]
pub struct AddAgentRequest<'a> {
    /// Category of automated participant to dispatch.
    pub agent: &'a str,
}

/// Invites automated participants into the room (enables mocking).
#[async_trait::async_trait]
pub trait AgentInviter: Send + Sync {
    /// Ask the automation side to dispatch one participant of `agent_type`.
    async fn invite(&self, agent_type: &str) -> Result<(), ControllerError>;
}

/// HTTP client for the automation-control endpoint.
#[derive(Clone)]
pub struct AutomationClient {
    client: Client,
    base_url: String,
}

impl AutomationClient {
    /// Create a new automation client.
    ///
    /// # Errors
    ///
    /// Returns `ControllerError::Config` if the HTTP client cannot be built.
    pub fn new(base_url: String, timeout: Duration) -> Result<Self, ControllerError> {
        let client = Client::builder().timeout(timeout).build().map_err(|e| {
            error!(target: "sc.automation", error = %e, "Failed to build HTTP client");
            ControllerError::Config(format!("failed to build HTTP client: {e}"))
        })?;

        Ok(Self { client, base_url })
    }
}

#[async_trait::async_trait]
impl AgentInviter for AutomationClient {
    #[instrument(skip(self))]
    async fn invite(&self, agent_type: &str) -> Result<(), ControllerError> {
        let url = format!("{}/add_agent", self.base_url);

        let response = self
            .client
            .post(&url)
            .json(&AddAgentRequest { agent: agent_type })
            .send()
            .await
            .map_err(|e| ControllerError::Automation(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ControllerError::Automation(format!(
                "add_agent returned {}",
                status
            )));
        }

        Ok(())
    }
}
