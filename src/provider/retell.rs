//! HTTP client for the Retell create-web-call endpoint.
//! Single attempt per call: no retries, no overall timeout.
use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use url::Url;

use super::{CreateWebCallRequest, ProviderError, WebCall, WebCallProvider};
use crate::config::ApiKey;

const CREATE_WEB_CALL_PATH: &str = "v2/create-web-call";

pub struct RetellClient {
    client: reqwest::Client,
    endpoint: Url,
    api_key: ApiKey,
}

impl RetellClient {
    pub fn new(api_key: ApiKey, base_url: &Url) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .use_rustls_tls()
            .pool_max_idle_per_host(8)
            .connect_timeout(Duration::from_secs(5))
            .build()
            .context("failed to build HTTP client")?;

        // `join` replaces the last segment unless the base path ends in '/'.
        let mut base = base_url.clone();
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let endpoint = base
            .join(CREATE_WEB_CALL_PATH)
            .with_context(|| format!("invalid Retell base URL: {}", base_url))?;

        Ok(Self {
            client,
            endpoint,
            api_key,
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl WebCallProvider for RetellClient {
    async fn create_web_call(
        &self,
        request: &CreateWebCallRequest,
    ) -> Result<WebCall, ProviderError> {
        let resp = self
            .client
            .post(self.endpoint.clone())
            .bearer_auth(self.api_key.expose())
            .json(request)
            .send()
            .await?;

        let status = resp.status();
        let body = resp.text().await?;
        if !status.is_success() {
            return Err(ProviderError::Status { status, body });
        }

        let call: WebCall =
            serde_json::from_str(&body).map_err(|e| ProviderError::Decode(e.to_string()))?;
        if call.access_token.is_empty() {
            return Err(ProviderError::Decode("empty access_token".into()));
        }

        tracing::debug!(
            call_id = call.call_id.as_deref().unwrap_or("-"),
            call_status = call.call_status.as_deref().unwrap_or("-"),
            "Retell web call created"
        );
        Ok(call)
    }
}
