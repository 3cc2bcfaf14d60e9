use std::fmt;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use crate::function::FunctionResponse;
use crate::provider::ProviderError;

pub const METHOD_NOT_ALLOWED_BODY: &str = "Method Not Allowed";
pub const BAD_REQUEST_BODY: &str = "Bad Request";
pub const CONFIGURATION_MISSING_BODY: &str = "Error: Service configuration missing.";
pub const UPSTREAM_FAILURE_BODY: &str = "Error initiating call session.";

/// The setting whose absence blocked a call. Logged, never returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingSetting {
    ApiKey,
    AgentId,
}

impl fmt::Display for MissingSetting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MissingSetting::ApiKey => f.write_str("api_key"),
            MissingSetting::AgentId => f.write_str("agent_id"),
        }
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("method {0} not allowed")]
    MethodNotAllowed(String),

    #[error("invalid request body: {0}")]
    InvalidBody(#[from] serde_json::Error),

    #[error("configuration missing: {0}")]
    ConfigurationMissing(MissingSetting),

    #[error("upstream error: {0}")]
    Upstream(#[from] ProviderError),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
            AppError::InvalidBody(_) => StatusCode::BAD_REQUEST,
            AppError::ConfigurationMissing(_) | AppError::Upstream(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Logs the diagnostic detail and returns the fixed caller-facing response.
    pub fn into_function_response(self) -> FunctionResponse {
        let msg = match &self {
            AppError::MethodNotAllowed(method) => {
                tracing::debug!(%method, "Rejected non-POST request");
                METHOD_NOT_ALLOWED_BODY
            }
            AppError::InvalidBody(e) => {
                tracing::warn!(error = %e, "Request body is not a valid JSON object");
                BAD_REQUEST_BODY
            }
            AppError::ConfigurationMissing(missing) => {
                tracing::error!(%missing, "Missing credentials for call creation");
                CONFIGURATION_MISSING_BODY
            }
            AppError::Upstream(e) => {
                tracing::error!(error = %e, "Retell API error");
                UPSTREAM_FAILURE_BODY
            }
        };

        FunctionResponse::text(self.status(), msg)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        self.into_function_response().into_response()
    }
}
