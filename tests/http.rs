//! End-to-end tests: the axum router in front of a wiremock Retell API.
//!
//! Requests go through `tower::ServiceExt::oneshot`, so no port is bound for
//! the gateway itself; only the mock upstream listens.

use std::collections::HashMap;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::json;
use tower::ServiceExt;
use webcall_token::config;
use webcall_token::issuer::CallTokenIssuer;
use webcall_token::server::{self, AppState, API_PATH, NETLIFY_FUNCTION_PATH};
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn app_with_env(pairs: &[(&str, &str)]) -> Router {
    let vars: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    let cfg = config::from_lookup(|name| vars.get(name).cloned()).unwrap();
    let issuer = CallTokenIssuer::from_config(&cfg).unwrap();
    server::router(Arc::new(AppState { issuer }))
}

fn app_for(mock_server: &MockServer) -> Router {
    let uri = mock_server.uri();
    app_with_env(&[("RETELL_API_KEY", "key_test"), ("RETELL_BASE_URL", uri.as_str())])
}

async fn send(
    app: Router,
    method: &str,
    uri: &str,
    body: &str,
) -> (StatusCode, axum::http::HeaderMap, String) {
    let req = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    let resp = app.oneshot(req).await.unwrap();
    let status = resp.status();
    let headers = resp.headers().clone();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    (status, headers, String::from_utf8(bytes.to_vec()).unwrap())
}

#[tokio::test]
async fn test_post_relays_access_token() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v2/create-web-call"))
        .and(header("authorization", "Bearer key_test"))
        .and(body_json(json!({"agent_id": "agent_123"})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "call_type": "web_call",
            "access_token": "tok_abc",
            "call_id": "call_1",
            "agent_id": "agent_123",
            "call_status": "registered"
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let (status, headers, body) = send(
        app_for(&mock_server),
        "POST",
        NETLIFY_FUNCTION_PATH,
        r#"{"agent_id":"agent_123"}"#,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"access_token":"tok_abc"}"#);
    assert_eq!(headers["content-type"], "application/json");
    assert_eq!(headers["access-control-allow-origin"], "*");
    assert_eq!(headers["cache-control"], "no-store");
    assert!(headers.contains_key("x-request-id"));
}

#[tokio::test]
async fn test_api_path_serves_the_same_handler() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v2/create-web-call"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"access_token": "tok_api"})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let (status, _, body) = send(
        app_for(&mock_server),
        "POST",
        API_PATH,
        r#"{"agent_id":"agent_123"}"#,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"access_token":"tok_api"}"#);
}

#[tokio::test]
async fn test_get_is_method_not_allowed() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"access_token": "tok"})))
        .expect(0)
        .mount(&mock_server)
        .await;

    let (status, headers, body) =
        send(app_for(&mock_server), "GET", NETLIFY_FUNCTION_PATH, "").await;

    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(body, "Method Not Allowed");
    assert!(!headers.contains_key("access-control-allow-origin"));
}

#[tokio::test]
async fn test_missing_agent_id_never_reaches_upstream() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"access_token": "tok"})))
        .expect(0)
        .mount(&mock_server)
        .await;

    let (status, _, body) =
        send(app_for(&mock_server), "POST", NETLIFY_FUNCTION_PATH, r#"{"agent_id":""}"#).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, "Error: Service configuration missing.");
}

#[tokio::test]
async fn test_unset_api_key_yields_configuration_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"access_token": "tok"})))
        .expect(0)
        .mount(&mock_server)
        .await;

    let uri = mock_server.uri();
    let app = app_with_env(&[("RETELL_BASE_URL", uri.as_str())]);

    let (status, _, body) =
        send(app, "POST", NETLIFY_FUNCTION_PATH, r#"{"agent_id":"agent_123"}"#).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, "Error: Service configuration missing.");
}

#[tokio::test]
async fn test_upstream_error_detail_is_not_leaked() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v2/create-web-call"))
        .respond_with(
            ResponseTemplate::new(500).set_body_string(r#"{"error":"db shard eu-7 unavailable"}"#),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let (status, headers, body) = send(
        app_for(&mock_server),
        "POST",
        NETLIFY_FUNCTION_PATH,
        r#"{"agent_id":"agent_123"}"#,
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, "Error initiating call session.");
    assert!(!body.contains("eu-7"));
    assert!(!headers.contains_key("access-control-allow-origin"));
}

#[tokio::test]
async fn test_malformed_body_is_bad_request() {
    let mock_server = MockServer::start().await;

    let (status, _, body) =
        send(app_for(&mock_server), "POST", NETLIFY_FUNCTION_PATH, "{not json").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, "Bad Request");
}

#[tokio::test]
async fn test_health_and_readiness() {
    let mock_server = MockServer::start().await;

    let (status, _, body) = send(app_for(&mock_server), "GET", "/healthz", "").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "ok");

    let (status, _, body) = send(app_for(&mock_server), "GET", "/readyz", "").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "ok");

    let (status, _, body) = send(app_with_env(&[]), "GET", "/readyz", "").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body, "unconfigured");
}

#[tokio::test]
async fn test_oversized_non_post_body_still_gets_method_not_allowed() {
    let mock_server = MockServer::start().await;
    let big = "x".repeat(server::MAX_BODY_BYTES + 6 * 1024);

    for verb in ["GET", "PUT"] {
        let (status, _, body) =
            send(app_for(&mock_server), verb, NETLIFY_FUNCTION_PATH, &big).await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED, "{}", verb);
        assert_eq!(body, "Method Not Allowed");
    }
}

#[tokio::test]
async fn test_oversized_post_body_is_bad_request() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"access_token": "tok"})))
        .expect(0)
        .mount(&mock_server)
        .await;

    let padding = "x".repeat(server::MAX_BODY_BYTES);
    let big = format!(r#"{{"agent_id":"agent_123","metadata":{{"pad":"{}"}}}}"#, padding);
    let (status, _, body) =
        send(app_for(&mock_server), "POST", NETLIFY_FUNCTION_PATH, &big).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, "Bad Request");
}

#[tokio::test]
async fn test_unset_api_key_wins_over_malformed_post_body() {
    for payload in ["", "{not json", "[]"] {
        let (status, _, body) = send(app_with_env(&[]), "POST", API_PATH, payload).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR, "{:?}", payload);
        assert_eq!(body, "Error: Service configuration missing.");
    }
}
