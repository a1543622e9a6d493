//! Translation from validated client requests to provider payloads.

use super::types::{
    AudioConfig, ChatCompletionRequest, CompletionRequest, Message, SpeechRequest,
    SynthesisInput, SynthesizeRequest, VoiceSelection,
};

pub const AUDIO_ENCODING: &str = "MP3";
pub const PITCH: f64 = 0.0;
pub const NEUTRAL_SPEAKING_RATE: f64 = 1.0;
/// Style value that maps to the neutral speaking rate.
const STYLE_CENTER: f64 = 0.7;
/// Speaking-rate change per unit of style.
const STYLE_GAIN: f64 = 0.1;
/// Length of a BCP-47 `ll-CC` prefix such as `pt-BR`.
const LANGUAGE_CODE_LEN: usize = 5;

pub const CHAT_TEMPERATURE: f64 = 0.7;
pub const CHAT_TOP_P: f64 = 1.0;

/// Builds `text:synthesize` payloads.
#[derive(Debug, Clone)]
pub struct TtsTranslator {
    default_voice: String,
}

impl TtsTranslator {
    pub fn new(default_voice: impl Into<String>) -> Self {
        Self {
            default_voice: default_voice.into(),
        }
    }

    pub fn translate(&self, request: &SpeechRequest) -> SynthesizeRequest {
        let voice_name = request
            .voice_name
            .as_deref()
            .unwrap_or(&self.default_voice)
            .to_string();

        SynthesizeRequest {
            input: SynthesisInput {
                text: request.text.clone(),
            },
            voice: VoiceSelection {
                language_code: language_code(&voice_name),
                name: voice_name,
            },
            audio_config: AudioConfig {
                audio_encoding: AUDIO_ENCODING.to_string(),
                pitch: PITCH,
                speaking_rate: speaking_rate(request.style),
            },
        }
    }
}

/// Language code implied by a voice name: its first five characters.
///
/// Shorter names are returned whole rather than rejected.
pub fn language_code(voice_name: &str) -> String {
    voice_name.chars().take(LANGUAGE_CODE_LEN).collect()
}

/// Map the client's style control onto a narrow band around neutral speed.
pub fn speaking_rate(style: Option<f64>) -> f64 {
    match style {
        Some(style) => NEUTRAL_SPEAKING_RATE + (style - STYLE_CENTER) * STYLE_GAIN,
        None => NEUTRAL_SPEAKING_RATE,
    }
}

/// Builds single-turn chat completion payloads.
#[derive(Debug, Clone)]
pub struct ChatTranslator {
    model: String,
    default_max_tokens: u32,
}

impl ChatTranslator {
    pub fn new(model: impl Into<String>, default_max_tokens: u32) -> Self {
        Self {
            model: model.into(),
            default_max_tokens,
        }
    }

    pub fn translate(&self, request: &CompletionRequest) -> ChatCompletionRequest {
        ChatCompletionRequest {
            model: self.model.clone(),
            messages: vec![Message {
                role: "user".to_string(),
                content: request.prompt.clone(),
            }],
            temperature: CHAT_TEMPERATURE,
            max_tokens: request.max_tokens.unwrap_or(self.default_max_tokens),
            top_p: CHAT_TOP_P,
            stream: false,
        }
    }
}
