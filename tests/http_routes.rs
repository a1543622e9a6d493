//! Integration tests for the axum router.
//!
//! Verifies that:
//! - GET /health reports key counts and rotation without key material
//! - Non-POST calls to proxy routes get a JSON 405 envelope
//! - Proxy responses carry the request-id, latency and provider headers
//! - POST /api/chat and /api/tts work end to end through the router

use axum::body::Body;
use http::Request;
use serde_json::{json, Value};
use tower::ServiceExt;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use voxgate::config::Config;
use voxgate::proxy::invoker::provider_client;
use voxgate::proxy::{create_router, AppState};

/// Build the app from a TOML config, with no environment lookups.
fn setup_app(toml: &str) -> axum::Router {
    let (config, _) = Config::parse_str_with(toml, |_| None).expect("valid config");
    let state = AppState::from_config(config, provider_client().expect("client")).expect("state");
    create_router(state)
}

/// Parse the response body as JSON and return (status_code, headers, json_value).
async fn parse_body(
    response: axum::response::Response,
) -> (http::StatusCode, http::HeaderMap, Value) {
    let status = response.status();
    let headers = response.headers().clone();
    let body_bytes = axum::body::to_bytes(response.into_body(), 1_048_576)
        .await
        .expect("read body");
    let json: Value = serde_json::from_slice(&body_bytes).unwrap_or_default();
    (status, headers, json)
}

fn post_json(uri: &str, body: &Value) -> Request<Body> {
    Request::post(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn test_health_reports_pools_without_keys() {
    let app = setup_app(
        r#"
        [tts]
        api_keys = "tts-secret"

        [chat]
        api_keys = "gsk_a,gsk_b,gsk_c"
        rotation = "round_robin"
        "#,
    );

    let response = app
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let (status, _, json) = parse_body(response).await;

    assert_eq!(status, http::StatusCode::OK);
    assert_eq!(json["status"], "ok");
    assert_eq!(json["service"], "voxgate");
    assert_eq!(json["providers"]["tts"]["keys"], 1);
    assert_eq!(json["providers"]["tts"]["rotation"], "round_robin");
    assert_eq!(json["providers"]["chat"]["keys"], 3);
    assert_eq!(json["providers"]["chat"]["rotation"], "round_robin");
    let text = json.to_string();
    assert!(!text.contains("tts-secret"));
    assert!(!text.contains("gsk_"));
}

#[tokio::test]
async fn test_get_on_proxy_routes_is_json_405() {
    let app = setup_app("");

    for uri in ["/api/chat", "/api/tts"] {
        let response = app
            .clone()
            .oneshot(Request::get(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let (status, headers, json) = parse_body(response).await;

        assert_eq!(status, http::StatusCode::METHOD_NOT_ALLOWED, "{}", uri);
        assert_eq!(json, json!({"error": "Method Not Allowed"}));
        assert!(headers.get("x-voxgate-request-id").is_some());
    }
}

#[tokio::test]
async fn test_missing_keys_is_500_configuration_error() {
    let app = setup_app("");

    let response = app
        .oneshot(post_json("/api/tts", &json!({"textToSpeak": "Olá"})))
        .await
        .unwrap();
    let (status, headers, json) = parse_body(response).await;

    assert_eq!(status, http::StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        json,
        json!({"error": "Server configuration error: API keys not found."})
    );
    assert_eq!(headers.get("x-voxgate-provider").unwrap(), "tts");
}

#[tokio::test]
async fn test_malformed_body_is_400() {
    let app = setup_app(r#"
        [chat]
        api_keys = "k"
    "#);

    let request = Request::post("/api/chat")
        .header("content-type", "application/json")
        .body(Body::from("{\"prompt\": "))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    let (status, _, json) = parse_body(response).await;

    assert_eq!(status, http::StatusCode::BAD_REQUEST);
    assert_eq!(json, json!({"error": "Invalid JSON body"}));
}

#[tokio::test]
async fn test_chat_end_to_end_through_router() {
    let server = MockServer::start().await;
    let completion = json!({
        "id": "chatcmpl-1",
        "choices": [{"index": 0, "message": {"role": "assistant", "content": "oi"}}]
    });
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion.clone()))
        .expect(1)
        .mount(&server)
        .await;

    let app = setup_app(&format!(
        r#"
        [chat]
        endpoint = "{}/v1/chat/completions"
        api_keys = "gsk_test"
        "#,
        server.uri()
    ));

    let response = app
        .oneshot(post_json("/api/chat", &json!({"prompt": "hello", "maxTokens": 50})))
        .await
        .unwrap();
    let (status, headers, json) = parse_body(response).await;

    assert_eq!(status, http::StatusCode::OK);
    assert_eq!(json, completion);
    assert_eq!(headers.get("x-voxgate-provider").unwrap(), "chat");
    assert!(headers.get("x-voxgate-latency-ms").is_some());
    assert_eq!(
        headers.get("content-type").unwrap(),
        "application/json"
    );
}

#[tokio::test]
async fn test_tts_end_to_end_through_router() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/text:synthesize"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"audioContent": "//NExAAAAANIAAAAAE"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let app = setup_app(&format!(
        r#"
        [tts]
        endpoint = "{}/v1/text:synthesize"
        api_keys = "tts-key"
        "#,
        server.uri()
    ));

    let response = app
        .oneshot(post_json("/api/tts", &json!({"textToSpeak": "Olá"})))
        .await
        .unwrap();
    let (status, _, json) = parse_body(response).await;

    assert_eq!(status, http::StatusCode::OK);
    assert_eq!(json, json!({"audioBase64": "//NExAAAAANIAAAAAE"}));
}
