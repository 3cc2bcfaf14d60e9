pub mod retell;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Parameters of a create-web-call operation.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CreateWebCallRequest {
    pub agent_id: String,
    /// Arbitrary caller data stored with the call.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
    /// Values substituted into the agent's prompt variables.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retell_llm_dynamic_variables: Option<serde_json::Value>,
}

impl CreateWebCallRequest {
    pub fn new(agent_id: impl Into<String>) -> Self {
        Self {
            agent_id: agent_id.into(),
            ..Default::default()
        }
    }
}

/// A web call as returned by the provider. Only `access_token` is ever relayed to callers.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct WebCall {
    pub access_token: String,
    #[serde(default)]
    pub call_id: Option<String>,
    #[serde(default)]
    pub agent_id: Option<String>,
    #[serde(default)]
    pub call_status: Option<String>,
}

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("request to provider failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("provider returned {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("malformed provider response: {0}")]
    Decode(String),
}

/// Upstream voice-agent provider.
/// Implementations: RetellClient (HTTP). Tests substitute in-memory fakes.
#[async_trait]
pub trait WebCallProvider: Send + Sync {
    /// Creates a web call and returns its short-lived access token.
    async fn create_web_call(
        &self,
        request: &CreateWebCallRequest,
    ) -> Result<WebCall, ProviderError>;
}
