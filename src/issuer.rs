use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::{HeaderValue, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use serde::Deserialize;
use serde_json::json;

use crate::config::Config;
use crate::errors::{AppError, MissingSetting};
use crate::function::{FunctionEvent, FunctionResponse};
use crate::provider::retell::RetellClient;
use crate::provider::{CreateWebCallRequest, WebCallProvider};
use crate::server::{AppState, MAX_BODY_BYTES};

/// JSON body sent by the browser.
#[derive(Debug, Deserialize)]
struct WebCallRequestBody {
    #[serde(default)]
    agent_id: Option<String>,
    #[serde(default)]
    metadata: Option<serde_json::Value>,
    #[serde(default)]
    retell_llm_dynamic_variables: Option<serde_json::Value>,
}

/// Exchanges a browser's `agent_id` for a short-lived web-call access token.
pub struct CallTokenIssuer {
    /// `None` when no API key was configured at startup.
    provider: Option<Arc<dyn WebCallProvider>>,
    allow_origin: HeaderValue,
}

impl CallTokenIssuer {
    pub fn new(provider: Option<Arc<dyn WebCallProvider>>, allow_origin: HeaderValue) -> Self {
        Self {
            provider,
            allow_origin,
        }
    }

    pub fn from_config(cfg: &Config) -> anyhow::Result<Self> {
        let provider = match &cfg.retell_api_key {
            Some(key) => {
                let client = RetellClient::new(key.clone(), &cfg.retell_base_url)?;
                Some(Arc::new(client) as Arc<dyn WebCallProvider>)
            }
            None => {
                tracing::warn!("RETELL_API_KEY is not set; every call request will fail");
                None
            }
        };
        Ok(Self::new(provider, cfg.allowed_origin.clone()))
    }

    pub fn is_configured(&self) -> bool {
        self.provider.is_some()
    }

    /// Handles one invocation. Always produces a response.
    pub async fn handle(&self, event: FunctionEvent) -> FunctionResponse {
        match self.issue(event).await {
            Ok(resp) => resp,
            Err(e) => e.into_function_response(),
        }
    }

    async fn issue(&self, event: FunctionEvent) -> Result<FunctionResponse, AppError> {
        if event.http_method != Method::POST.as_str() {
            return Err(AppError::MethodNotAllowed(event.http_method));
        }

        // An unconfigured service answers every POST the same way, whatever the body.
        let provider = self
            .provider
            .as_ref()
            .ok_or(AppError::ConfigurationMissing(MissingSetting::ApiKey))?;

        // Object first: a bare array would otherwise fill the struct positionally.
        let object: serde_json::Map<String, serde_json::Value> =
            serde_json::from_str(event.body.as_deref().unwrap_or(""))?;
        let body: WebCallRequestBody = serde_json::from_value(object.into())?;
        let agent_id = body
            .agent_id
            .filter(|id| !id.is_empty())
            .ok_or(AppError::ConfigurationMissing(MissingSetting::AgentId))?;

        let request = CreateWebCallRequest {
            agent_id,
            metadata: body.metadata,
            retell_llm_dynamic_variables: body.retell_llm_dynamic_variables,
        };
        let call = provider.create_web_call(&request).await?;

        tracing::info!(
            agent_id = %request.agent_id,
            call_id = call.call_id.as_deref().unwrap_or("-"),
            "Issued web call access token"
        );

        Ok(
            FunctionResponse::json(StatusCode::OK, &json!({ "access_token": call.access_token }))
                .with_header("access-control-allow-origin", self.allow_origin.clone()),
        )
    }
}

/// axum adapter: routes every method here so non-POST requests get the
/// issuer's own 405 body. Only POST bodies are buffered; an oversized or
/// non-UTF-8 body reaches the issuer as absent.
#[tracing::instrument(skip_all, fields(method = %req.method()))]
pub async fn create_web_call_handler(
    State(state): State<Arc<AppState>>,
    req: Request,
) -> Response {
    let method = req.method().clone();
    let body = if method == Method::POST {
        match axum::body::to_bytes(req.into_body(), MAX_BODY_BYTES).await {
            Ok(bytes) => String::from_utf8(bytes.to_vec()).ok(),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read request body");
                None
            }
        }
    } else {
        None
    };

    let event = FunctionEvent::new(method.as_str(), body);
    state.issuer.handle(event).await.into_response()
}
