//! Request pipelines: one per provider.
//!
//! A pipeline turns an [`InboundEvent`] into an [`Envelope`] in a single
//! linear pass:
//!
//! method check → parse → validate → key selection → translate → invoke → normalize
//!
//! Anything that fails before key selection never touches the key pool or
//! the provider. Pipelines know nothing about the HTTP server in front of
//! them, so they can be driven directly from tests or another trigger.

use axum::http::Method;
use bytes::Bytes;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::envelope::{speech_success_body, Envelope, ProviderKind};
use super::invoker::{AuthScheme, ProviderInvoker};
use super::translate::{ChatTranslator, TtsTranslator};
use super::types::{ChatRequestBody, TtsRequestBody};
use crate::config::{ChatConfig, TtsConfig};
use crate::error::{Error, Result};
use crate::keys::KeyPool;

/// An inbound invocation: HTTP method plus the raw body.
#[derive(Debug, Clone)]
pub struct InboundEvent {
    pub method: Method,
    pub body: Bytes,
}

impl InboundEvent {
    pub fn new(method: Method, body: impl Into<Bytes>) -> Self {
        Self {
            method,
            body: body.into(),
        }
    }

    /// A POST carrying `body` serialized as JSON.
    pub fn post_json(body: &Value) -> Self {
        Self::new(Method::POST, body.to_string())
    }
}

/// Only POST reaches the body parser.
fn ensure_post(method: &Method) -> Result<()> {
    if *method == Method::POST {
        Ok(())
    } else {
        Err(Error::MethodNotAllowed)
    }
}

fn parse_body<T: DeserializeOwned>(body: &[u8]) -> Result<T> {
    serde_json::from_slice(body).map_err(|e| {
        tracing::debug!(error = %e, "Rejected unparseable request body");
        Error::BadRequest("Invalid JSON body".to_string())
    })
}

/// Text-to-speech pipeline.
#[derive(Debug)]
pub struct TtsPipeline {
    keys: KeyPool,
    translator: TtsTranslator,
    invoker: ProviderInvoker,
}

impl TtsPipeline {
    pub fn new(keys: KeyPool, translator: TtsTranslator, invoker: ProviderInvoker) -> Self {
        Self {
            keys,
            translator,
            invoker,
        }
    }

    /// Build the pipeline from its config section. The key goes in the URL query.
    pub fn from_config(config: &TtsConfig, client: Client) -> Result<Self> {
        let keys = KeyPool::from_delimited(
            ProviderKind::Tts.as_str(),
            config.api_keys.as_ref().map(|k| k.expose_secret()),
            config.rotation,
        );
        let invoker = ProviderInvoker::new(
            client,
            ProviderKind::Tts.as_str(),
            &config.endpoint,
            AuthScheme::QueryKey,
        )?;
        Ok(Self::new(
            keys,
            TtsTranslator::new(config.default_voice.clone()),
            invoker,
        ))
    }

    pub fn keys(&self) -> &KeyPool {
        &self.keys
    }

    pub async fn handle(&self, event: &InboundEvent) -> Envelope {
        Envelope::from_result(ProviderKind::Tts, self.execute(event).await)
    }

    async fn execute(&self, event: &InboundEvent) -> Result<Value> {
        ensure_post(&event.method)?;
        let request = parse_body::<TtsRequestBody>(&event.body)?.validate()?;
        let key = self.keys.next()?;
        let payload = self.translator.translate(&request);

        tracing::debug!(
            voice = %payload.voice.name,
            language = %payload.voice.language_code,
            speaking_rate = payload.audio_config.speaking_rate,
            text_len = request.text.len(),
            "Forwarding speech synthesis request"
        );

        let response = self.invoker.invoke(key, &payload).await?;
        speech_success_body(response)
    }
}

/// Chat completion pipeline.
#[derive(Debug)]
pub struct ChatPipeline {
    keys: KeyPool,
    translator: ChatTranslator,
    invoker: ProviderInvoker,
}

impl ChatPipeline {
    pub fn new(keys: KeyPool, translator: ChatTranslator, invoker: ProviderInvoker) -> Self {
        Self {
            keys,
            translator,
            invoker,
        }
    }

    /// Build the pipeline from its config section. The key goes in a bearer header.
    pub fn from_config(config: &ChatConfig, client: Client) -> Result<Self> {
        let keys = KeyPool::from_delimited(
            ProviderKind::Chat.as_str(),
            config.api_keys.as_ref().map(|k| k.expose_secret()),
            config.rotation,
        );
        let invoker = ProviderInvoker::new(
            client,
            ProviderKind::Chat.as_str(),
            &config.endpoint,
            AuthScheme::Bearer,
        )?;
        Ok(Self::new(
            keys,
            ChatTranslator::new(config.model.clone(), config.default_max_tokens),
            invoker,
        ))
    }

    pub fn keys(&self) -> &KeyPool {
        &self.keys
    }

    pub async fn handle(&self, event: &InboundEvent) -> Envelope {
        Envelope::from_result(ProviderKind::Chat, self.execute(event).await)
    }

    async fn execute(&self, event: &InboundEvent) -> Result<Value> {
        ensure_post(&event.method)?;
        let request = parse_body::<ChatRequestBody>(&event.body)?.validate()?;
        let key = self.keys.next()?;
        let payload = self.translator.translate(&request);

        tracing::debug!(
            model = %payload.model,
            max_tokens = payload.max_tokens,
            prompt_len = request.prompt.len(),
            "Forwarding chat completion request"
        );

        self.invoker.invoke(key, &payload).await
    }
}
