//! Client request bodies and provider payload types.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};

// ── Client side ──

/// Body accepted on the speech endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TtsRequestBody {
    pub text_to_speak: Option<String>,
    pub voice_name: Option<String>,
    /// Expressiveness control (~0.5 to 1.0). Anything but a JSON number is ignored.
    pub audio_temp: Option<Value>,
}

/// Body accepted on the chat endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequestBody {
    pub prompt: Option<String>,
    /// Only positive integers that fit in a `u32` are honored.
    pub max_tokens: Option<Value>,
}

/// A validated speech request.
#[derive(Debug, Clone, PartialEq)]
pub struct SpeechRequest {
    pub text: String,
    pub voice_name: Option<String>,
    pub style: Option<f64>,
}

/// A validated chat request.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub prompt: String,
    pub max_tokens: Option<u32>,
}

impl TtsRequestBody {
    /// Check required fields and normalize the optional ones.
    pub fn validate(self) -> Result<SpeechRequest> {
        let text = self
            .text_to_speak
            .filter(|text| !text.is_empty())
            .ok_or_else(|| Error::BadRequest("Missing \"textToSpeak\" parameter".to_string()))?;

        Ok(SpeechRequest {
            text,
            voice_name: self.voice_name.filter(|name| !name.is_empty()),
            style: self
                .audio_temp
                .as_ref()
                .and_then(Value::as_f64)
                .filter(|style| style.is_finite()),
        })
    }
}

impl ChatRequestBody {
    /// Check required fields and normalize the optional ones.
    pub fn validate(self) -> Result<CompletionRequest> {
        let prompt = self
            .prompt
            .filter(|prompt| !prompt.is_empty())
            .ok_or_else(|| Error::BadRequest("Missing \"prompt\" parameter".to_string()))?;

        Ok(CompletionRequest {
            prompt,
            max_tokens: self
                .max_tokens
                .as_ref()
                .and_then(Value::as_u64)
                .and_then(|n| u32::try_from(n).ok())
                .filter(|n| *n > 0),
        })
    }
}

// ── Provider side ──

/// Google Cloud Text-to-Speech `text:synthesize` request.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SynthesizeRequest {
    pub input: SynthesisInput,
    pub voice: VoiceSelection,
    pub audio_config: AudioConfig,
}

#[derive(Debug, Clone, Serialize)]
pub struct SynthesisInput {
    pub text: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VoiceSelection {
    pub language_code: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AudioConfig {
    pub audio_encoding: String,
    pub pitch: f64,
    pub speaking_rate: f64,
}

/// Chat completion request (OpenAI-compatible).
#[derive(Debug, Clone, Serialize)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<Message>,
    pub temperature: f64,
    pub max_tokens: u32,
    pub top_p: f64,
    pub stream: bool,
}

/// A chat message.
#[derive(Debug, Clone, Serialize)]
pub struct Message {
    pub role: String,
    pub content: String,
}
