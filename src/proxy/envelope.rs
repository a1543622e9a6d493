//! Uniform response envelope returned to clients.
//!
//! An envelope carries either a success payload with status 200 or an
//! `{ "error": "<message>" }` body with a 4xx/5xx status. The constructors
//! are the only way to build one, so the two never mix.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use serde_json::Value;

use crate::error::{Error, Result};

/// Returned when a provider error body has no recognizable message.
pub const PROVIDER_ERROR_FALLBACK: &str = "Unknown provider error";
pub const CONFIGURATION_ERROR_MESSAGE: &str = "Server configuration error: API keys not found.";
pub const INTERNAL_ERROR_MESSAGE: &str = "Internal Server Error";

/// Which pipeline produced an outcome. Normalization differs slightly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    Tts,
    Chat,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::Tts => "tts",
            ProviderKind::Chat => "chat",
        }
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error body shape.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EnvelopeBody {
    Success(Value),
    Failure(ErrorBody),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    status: StatusCode,
    body: EnvelopeBody,
}

impl Envelope {
    pub fn success(body: Value) -> Self {
        Self {
            status: StatusCode::OK,
            body: EnvelopeBody::Success(body),
        }
    }

    /// Build an error envelope. Statuses outside 4xx/5xx become 500.
    pub fn failure(status: StatusCode, message: impl Into<String>) -> Self {
        let status = if status.is_client_error() || status.is_server_error() {
            status
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        };
        Self {
            status,
            body: EnvelopeBody::Failure(ErrorBody {
                error: message.into(),
            }),
        }
    }

    /// Normalize a pipeline error into the client-facing envelope.
    ///
    /// Messages never include transport detail or request URLs.
    pub fn from_error(kind: ProviderKind, error: &Error) -> Self {
        let message = match error {
            Error::MethodNotAllowed => "Method Not Allowed".to_string(),
            Error::BadRequest(message) => message.clone(),
            Error::NoCredentials { .. } => CONFIGURATION_ERROR_MESSAGE.to_string(),
            Error::Config(_) => "Server configuration error".to_string(),
            Error::Provider { detail, .. } => {
                let message = provider_error_message(detail.as_ref());
                match kind {
                    ProviderKind::Tts => format!("API Error: {}", message),
                    ProviderKind::Chat => message,
                }
            }
            Error::Upstream(_) => INTERNAL_ERROR_MESSAGE.to_string(),
            Error::Internal(message) => message.clone(),
        };
        Self::failure(error.status_code(kind), message)
    }

    /// Normalize a pipeline outcome.
    pub fn from_result(kind: ProviderKind, result: Result<Value>) -> Self {
        match result {
            Ok(body) => Self::success(body),
            Err(error) => Self::from_error(kind, &error),
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn body(&self) -> &EnvelopeBody {
        &self.body
    }

    pub fn is_success(&self) -> bool {
        matches!(self.body, EnvelopeBody::Success(_))
    }

    /// The error message, for failure envelopes.
    pub fn error_message(&self) -> Option<&str> {
        match &self.body {
            EnvelopeBody::Failure(body) => Some(&body.error),
            EnvelopeBody::Success(_) => None,
        }
    }

    /// The JSON the client receives.
    pub fn into_json(self) -> Value {
        match self.body {
            EnvelopeBody::Success(body) => body,
            EnvelopeBody::Failure(body) => serde_json::json!({ "error": body.error }),
        }
    }
}

impl IntoResponse for Envelope {
    fn into_response(self) -> Response {
        let status = self.status;
        (status, Json(self.into_json())).into_response()
    }
}

/// Best-effort message from a provider error body.
///
/// Understands `{"error":{"message":..}}` (Google and OpenAI-compatible),
/// `{"error":".."}` and `{"message":".."}`.
pub fn provider_error_message(detail: Option<&Value>) -> String {
    detail
        .and_then(|detail| {
            detail
                .pointer("/error/message")
                .and_then(Value::as_str)
                .or_else(|| detail.get("error").and_then(Value::as_str))
                .or_else(|| detail.get("message").and_then(Value::as_str))
        })
        .filter(|message| !message.is_empty())
        .unwrap_or(PROVIDER_ERROR_FALLBACK)
        .to_string()
}

/// Re-wrap a synthesis response as `{ "audioBase64": .. }`, dropping every
/// other field.
pub fn speech_success_body(response: Value) -> Result<Value> {
    let audio = response
        .get("audioContent")
        .and_then(Value::as_str)
        .ok_or_else(|| {
            Error::Internal("Provider response did not include audio content".to_string())
        })?;
    Ok(serde_json::json!({ "audioBase64": audio }))
}
