use std::fmt;

use anyhow::Context;
use axum::http::HeaderValue;
use url::Url;
use zeroize::Zeroizing;

pub const DEFAULT_RETELL_BASE_URL: &str = "https://api.retellai.com";
pub const DEFAULT_PORT: u16 = 8888;

/// Provider secret. Wiped from memory on drop and never printed.
#[derive(Clone)]
pub struct ApiKey(Zeroizing<String>);

impl ApiKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(Zeroizing::new(key.into()))
    }

    pub fn expose(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(***)")
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    /// Set via RETELL_API_KEY. `None` is served as a configuration error per request,
    /// not a startup failure.
    pub retell_api_key: Option<ApiKey>,
    pub retell_base_url: Url,
    /// Value of `Access-Control-Allow-Origin` on successful responses.
    /// Set via WEBCALL_ALLOWED_ORIGIN. Default: `*`.
    pub allowed_origin: HeaderValue,
}

pub fn load() -> anyhow::Result<Config> {
    dotenvy::dotenv().ok();
    from_lookup(|name| std::env::var(name).ok())
}

/// Builds a [`Config`] from an arbitrary variable source.
pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Config>
where
    F: Fn(&str) -> Option<String>,
{
    let retell_api_key = lookup("RETELL_API_KEY")
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .map(ApiKey::new);

    let base = lookup("RETELL_BASE_URL").unwrap_or_else(|| DEFAULT_RETELL_BASE_URL.into());
    let retell_base_url =
        Url::parse(&base).with_context(|| format!("invalid RETELL_BASE_URL: {}", base))?;

    let origin = lookup("WEBCALL_ALLOWED_ORIGIN").unwrap_or_else(|| "*".into());
    let allowed_origin = HeaderValue::from_str(&origin)
        .with_context(|| format!("invalid WEBCALL_ALLOWED_ORIGIN: {}", origin))?;

    Ok(Config {
        port: lookup("WEBCALL_PORT")
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_PORT),
        retell_api_key,
        retell_base_url,
        allowed_origin,
    })
}
