use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::State;
use axum::http::{HeaderValue, StatusCode};
use axum::routing::{any, get};
use axum::Router;

use crate::config::Config;
use crate::issuer::{self, CallTokenIssuer};

/// Path kept compatible with front ends built against the Netlify function.
pub const NETLIFY_FUNCTION_PATH: &str = "/.netlify/functions/create-retell-web-call";
pub const API_PATH: &str = "/api/create-web-call";

/// Largest POST body the function handler buffers.
pub const MAX_BODY_BYTES: usize = 64 * 1024;

/// Shared application state passed to handlers.
pub struct AppState {
    pub issuer: CallTokenIssuer,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(|| async { "ok" }))
        .route("/readyz", get(readiness_check))
        .route(NETLIFY_FUNCTION_PATH, any(issuer::create_web_call_handler))
        .route(API_PATH, any(issuer::create_web_call_handler))
        .with_state(state)
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .layer(axum::middleware::from_fn(request_id_middleware))
        .layer(axum::middleware::from_fn(security_headers_middleware))
}

pub async fn run(cfg: Config, port: u16) -> anyhow::Result<()> {
    let issuer = CallTokenIssuer::from_config(&cfg)?;
    let state = Arc::new(AppState { issuer });
    let app = router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("web-call token issuer listening on {}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}

async fn readiness_check(State(state): State<Arc<AppState>>) -> (StatusCode, &'static str) {
    if state.issuer.is_configured() {
        (StatusCode::OK, "ok")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "unconfigured")
    }
}

/// Middleware: injects a unique X-Request-Id into every response.
async fn request_id_middleware(
    req: axum::extract::Request,
    next: axum::middleware::Next,
) -> axum::response::Response {
    let req_id = uuid::Uuid::new_v4().to_string();
    let mut resp = next.run(req).await;
    if let Ok(val) = HeaderValue::from_str(&req_id) {
        resp.headers_mut().insert("x-request-id", val);
    }
    resp
}

/// Middleware: tokens must never be cached or sniffed.
async fn security_headers_middleware(
    req: axum::extract::Request,
    next: axum::middleware::Next,
) -> axum::response::Response {
    let mut resp = next.run(req).await;
    let headers = resp.headers_mut();

    headers.insert("x-content-type-options", HeaderValue::from_static("nosniff"));
    headers.insert("x-frame-options", HeaderValue::from_static("DENY"));
    headers.insert("cache-control", HeaderValue::from_static("no-store"));
    headers.insert("referrer-policy", HeaderValue::from_static("no-referrer"));
    headers.remove("server");

    resp
}
