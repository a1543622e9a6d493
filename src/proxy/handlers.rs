//! HTTP request handlers.
//!
//! Thin adapters: each proxy handler packs method and body into an
//! [`InboundEvent`], runs the pipeline, and tags the response.

use axum::{
    body::Bytes,
    extract::{Extension, State},
    http::{HeaderName, HeaderValue, Method},
    response::{IntoResponse, Response},
    Json,
};

use super::envelope::ProviderKind;
use super::pipeline::InboundEvent;
use super::server::{AppState, RequestId};
use crate::keys::KeyPool;

/// Response header: correlation ID (UUID v4).
pub const VOXGATE_REQUEST_ID_HEADER: &str = "x-voxgate-request-id";
/// Response header: wall-clock latency in milliseconds (integer).
pub const VOXGATE_LATENCY_MS_HEADER: &str = "x-voxgate-latency-ms";
/// Response header: provider that handled the request ("tts" or "chat").
pub const VOXGATE_PROVIDER_HEADER: &str = "x-voxgate-provider";

/// Attach voxgate metadata headers to a response.
fn attach_voxgate_headers(
    response: &mut Response,
    request_id: &RequestId,
    latency_ms: u64,
    provider: ProviderKind,
) {
    let headers = response.headers_mut();

    if let Ok(value) = HeaderValue::from_str(&request_id.0.to_string()) {
        headers.insert(HeaderName::from_static(VOXGATE_REQUEST_ID_HEADER), value);
    }
    headers.insert(
        HeaderName::from_static(VOXGATE_LATENCY_MS_HEADER),
        HeaderValue::from(latency_ms),
    );
    headers.insert(
        HeaderName::from_static(VOXGATE_PROVIDER_HEADER),
        HeaderValue::from_static(provider.as_str()),
    );
}

/// Handle /api/tts
pub async fn synthesize(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    method: Method,
    body: Bytes,
) -> Response {
    let start = std::time::Instant::now();
    tracing::info!(request_id = %request_id.0, method = %method, "Received speech synthesis request");

    let envelope = state.tts.handle(&InboundEvent::new(method, body)).await;

    let latency_ms = start.elapsed().as_millis() as u64;
    tracing::info!(
        request_id = %request_id.0,
        status = envelope.status().as_u16(),
        latency_ms,
        "Speech synthesis request finished"
    );

    let mut response = envelope.into_response();
    attach_voxgate_headers(&mut response, &request_id, latency_ms, ProviderKind::Tts);
    response
}

/// Handle /api/chat
pub async fn chat_completions(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    method: Method,
    body: Bytes,
) -> Response {
    let start = std::time::Instant::now();
    tracing::info!(request_id = %request_id.0, method = %method, "Received chat completion request");

    let envelope = state.chat.handle(&InboundEvent::new(method, body)).await;

    let latency_ms = start.elapsed().as_millis() as u64;
    tracing::info!(
        request_id = %request_id.0,
        status = envelope.status().as_u16(),
        latency_ms,
        "Chat completion request finished"
    );

    let mut response = envelope.into_response();
    attach_voxgate_headers(&mut response, &request_id, latency_ms, ProviderKind::Chat);
    response
}

fn pool_summary(pool: &KeyPool) -> serde_json::Value {
    serde_json::json!({
        "keys": pool.size(),
        "rotation": pool.policy().to_string(),
    })
}

/// Handle GET /health
///
/// Reports key counts only, never key material.
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "voxgate",
        "providers": {
            "tts": pool_summary(state.tts.keys()),
            "chat": pool_summary(state.chat.keys()),
        }
    }))
}
