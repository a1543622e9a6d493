//! Error types for voxgate.

use axum::http::StatusCode;

use crate::proxy::envelope::ProviderKind;

/// Result type alias for voxgate operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for voxgate.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),

    #[error("Method Not Allowed")]
    MethodNotAllowed,

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("No API keys configured for provider '{provider}'")]
    NoCredentials { provider: String },

    /// The provider answered, but with a non-2xx status.
    /// `detail` holds the error body when it parsed as JSON.
    #[error("Provider '{provider}' returned {status}")]
    Provider {
        provider: String,
        status: StatusCode,
        detail: Option<serde_json::Value>,
    },

    #[error("Upstream request failed: {0}")]
    Upstream(#[from] reqwest::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Status code the caller sees when this error ends a request.
    ///
    /// Provider failures forward the provider's status only for chat; the
    /// speech pipeline always reports 500.
    pub fn status_code(&self, kind: ProviderKind) -> StatusCode {
        match self {
            Error::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            Error::BadRequest(_) => StatusCode::BAD_REQUEST,
            Error::Provider { status, .. } => match kind {
                ProviderKind::Chat if status.is_client_error() || status.is_server_error() => {
                    *status
                }
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Error::Config(_)
            | Error::NoCredentials { .. }
            | Error::Upstream(_)
            | Error::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
