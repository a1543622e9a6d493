//! HTTP server setup and configuration.

use axum::{
    extract::Request,
    middleware::{self, Next},
    response::Response,
    routing::{any, get},
    Router,
};
use reqwest::Client;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use super::handlers;
use super::invoker::provider_client;
use super::pipeline::{ChatPipeline, TtsPipeline};
use crate::config::Config;

/// Per-request correlation ID, inserted by middleware before any handler runs.
#[derive(Debug, Clone, Copy)]
pub struct RequestId(pub Uuid);

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub tts: Arc<TtsPipeline>,
    pub chat: Arc<ChatPipeline>,
    pub config: Arc<Config>,
}

impl AppState {
    /// Build both pipelines over one shared HTTP client.
    pub fn from_config(config: Config, http_client: Client) -> crate::Result<Self> {
        let tts = TtsPipeline::from_config(&config.tts, http_client.clone())?;
        let chat = ChatPipeline::from_config(&config.chat, http_client)?;

        Ok(Self {
            tts: Arc::new(tts),
            chat: Arc::new(chat),
            config: Arc::new(config),
        })
    }
}

async fn inject_request_id(mut request: Request, next: Next) -> Response {
    request
        .extensions_mut()
        .insert(RequestId(Uuid::new_v4()));
    next.run(request).await
}

/// Create the axum router with all endpoints.
///
/// The proxy routes accept every method so that non-POST calls get the
/// JSON 405 envelope instead of axum's empty default.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/api/tts", any(handlers::synthesize))
        .route("/api/chat", any(handlers::chat_completions))
        .route("/health", get(handlers::health))
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(middleware::from_fn(inject_request_id)),
        )
}

/// Run the HTTP server.
pub async fn run_server(config: Config) -> anyhow::Result<()> {
    let listen_addr = config.server.listen.clone();

    let http_client = provider_client()?;

    let state = AppState::from_config(config, http_client)?;

    for pool in [state.tts.keys(), state.chat.keys()] {
        if pool.is_empty() {
            tracing::warn!(
                provider = %pool.provider(),
                "No API keys configured - requests to this provider will fail with 500"
            );
        } else {
            tracing::info!(
                provider = %pool.provider(),
                keys = pool.size(),
                rotation = %pool.policy(),
                "Key pool ready"
            );
        }
    }

    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(&listen_addr).await?;
    tracing::info!(address = %listen_addr, "Starting voxgate proxy server");

    axum::serve(listener, app).await?;

    Ok(())
}
