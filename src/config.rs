//! Configuration parsing and validation for voxgate.
//!
//! Configuration comes from an optional TOML file. Every field has a default,
//! so a deployment that only sets the key environment variables
//! (`GEMINI_API_KEY`, `GROQ_API_KEYS`) needs no file at all.

use reqwest::Url;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::path::Path;

use crate::keys::RotationPolicy;

/// Google Cloud Text-to-Speech synthesis endpoint.
pub const DEFAULT_TTS_ENDPOINT: &str = "https://texttospeech.googleapis.com/v1/text:synthesize";
/// Groq OpenAI-compatible chat completion endpoint.
pub const DEFAULT_CHAT_ENDPOINT: &str = "https://api.groq.com/openai/v1/chat/completions";
pub const DEFAULT_VOICE: &str = "pt-BR-Wavenet-B";
pub const DEFAULT_CHAT_MODEL: &str = "llama3-70b-8192";
pub const DEFAULT_MAX_TOKENS: u32 = 1024;
/// Environment variable read for TTS keys when `api_keys` is not set.
pub const DEFAULT_TTS_KEYS_ENV: &str = "GEMINI_API_KEY";
/// Environment variable read for chat keys when `api_keys` is not set.
pub const DEFAULT_CHAT_KEYS_ENV: &str = "GROQ_API_KEYS";

/// Root configuration structure.
#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub tts: TtsConfig,
    pub chat: ChatConfig,
    pub logging: LoggingConfig,
}

/// HTTP server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Address to listen on (e.g., "127.0.0.1:8080")
    #[serde(default = "default_listen")]
    pub listen: String,
}

fn default_listen() -> String {
    "127.0.0.1:8080".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: default_listen(),
        }
    }
}

/// API key wrapper that redacts in Debug/Display/Serialize and zeroizes on drop.
///
/// Holds either a single provider key or the raw comma-separated list a
/// [`crate::keys::KeyPool`] is built from. The value is only reachable via
/// `.expose_secret()`, so every use is grep-auditable.
#[derive(Clone)]
pub struct ApiKey(SecretString);

impl ApiKey {
    /// Access the raw key value. Every call site is auditable via `grep expose_secret`.
    pub fn expose_secret(&self) -> &str {
        self.0.expose_secret()
    }
}

impl std::fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[REDACTED]")
    }
}

impl std::fmt::Display for ApiKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[REDACTED]")
    }
}

impl Serialize for ApiKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str("[REDACTED]")
    }
}

impl<'de> serde::Deserialize<'de> for ApiKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(|s| ApiKey(SecretString::from(s)))
    }
}

impl From<String> for ApiKey {
    fn from(s: String) -> Self {
        ApiKey(SecretString::from(s))
    }
}

impl From<&str> for ApiKey {
    fn from(s: &str) -> Self {
        ApiKey(SecretString::from(s))
    }
}

/// How a provider's key list was resolved.
#[derive(Debug, Clone, PartialEq)]
pub enum KeySource {
    /// Keys were a literal string in config (no ${} references)
    Literal,
    /// Keys contained ${VAR} references expanded from environment
    EnvExpanded,
    /// Keys were read from the section's `api_keys_env` variable (holds var name)
    Convention(String),
    /// No keys available
    None,
}

impl std::fmt::Display for KeySource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            KeySource::Literal => write!(f, "config-literal"),
            KeySource::EnvExpanded => write!(f, "env-expanded"),
            KeySource::Convention(var) => write!(f, "convention ({})", var),
            KeySource::None => write!(f, "none"),
        }
    }
}

/// Text-to-speech provider configuration.
#[derive(Debug, Clone)]
pub struct TtsConfig {
    /// Synthesis endpoint; the key is appended as the `key` query parameter.
    pub endpoint: String,
    /// Comma-separated API keys.
    pub api_keys: Option<ApiKey>,
    pub rotation: RotationPolicy,
    /// Voice used when the client does not name one.
    pub default_voice: String,
}

/// Chat completion provider configuration.
#[derive(Debug, Clone)]
pub struct ChatConfig {
    /// Completion endpoint; the key is sent as a bearer token.
    pub endpoint: String,
    /// Comma-separated API keys.
    pub api_keys: Option<ApiKey>,
    pub rotation: RotationPolicy,
    pub model: String,
    /// `max_tokens` sent when the client gives no usable value.
    pub default_max_tokens: u32,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level, used when RUST_LOG is not set
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Configuration validation error: {0}")]
    Validation(String),

    #[error("Environment variable '{var}' not set for section '{section}': {message}")]
    EnvVar {
        var: String,
        section: String,
        message: String,
    },
}

/// Raw `[tts]` section. `api_keys` may still contain `${VAR}` references.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct RawTtsConfig {
    endpoint: String,
    api_keys: Option<String>,
    api_keys_env: String,
    rotation: RotationPolicy,
    default_voice: String,
}

impl Default for RawTtsConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_TTS_ENDPOINT.to_string(),
            api_keys: None,
            api_keys_env: DEFAULT_TTS_KEYS_ENV.to_string(),
            rotation: RotationPolicy::RoundRobin,
            default_voice: DEFAULT_VOICE.to_string(),
        }
    }
}

/// Raw `[chat]` section. `api_keys` may still contain `${VAR}` references.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct RawChatConfig {
    endpoint: String,
    api_keys: Option<String>,
    api_keys_env: String,
    rotation: RotationPolicy,
    model: String,
    default_max_tokens: u32,
}

impl Default for RawChatConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_CHAT_ENDPOINT.to_string(),
            api_keys: None,
            api_keys_env: DEFAULT_CHAT_KEYS_ENV.to_string(),
            rotation: RotationPolicy::Random,
            model: DEFAULT_CHAT_MODEL.to_string(),
            default_max_tokens: DEFAULT_MAX_TOKENS,
        }
    }
}

/// Raw configuration deserialized directly from TOML, before key resolution.
#[derive(Debug, Default, Deserialize)]
pub struct RawConfig {
    #[serde(default)]
    server: ServerConfig,
    #[serde(default)]
    tts: RawTtsConfig,
    #[serde(default)]
    chat: RawChatConfig,
    #[serde(default)]
    logging: LoggingConfig,
}

/// Expand all `${VAR}` references in a string using a custom lookup function.
///
/// Supports multiple `${VAR}` in one string (e.g., `${KEY_A},${KEY_B}`).
/// Fails on first missing variable, unclosed `${`, or empty variable name.
fn expand_env_vars_with<F>(input: &str, section: &str, lookup: &F) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if !input.contains("${") {
        return Ok(input.to_string());
    }

    let mut result = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(start) = rest.find("${") {
        result.push_str(&rest[..start]);
        let after = &rest[start + 2..];

        // The input may hold secrets, so errors never echo it.
        let end = after.find('}').ok_or_else(|| ConfigError::EnvVar {
            var: "<unclosed>".to_string(),
            section: section.to_string(),
            message: "Unclosed '${' in api_keys".to_string(),
        })?;

        let var_name = &after[..end];
        if var_name.is_empty() {
            return Err(ConfigError::EnvVar {
                var: "".to_string(),
                section: section.to_string(),
                message: "Empty variable name in '${}' reference".to_string(),
            });
        }

        let value = lookup(var_name).ok_or_else(|| ConfigError::EnvVar {
            var: var_name.to_string(),
            section: section.to_string(),
            message: format!(
                "Environment variable '{}' is not set (referenced in [{}])",
                var_name, section
            ),
        })?;

        result.push_str(&value);
        rest = &after[end + 1..];
    }

    result.push_str(rest);
    Ok(result)
}

/// Resolve a section's key list.
///
/// - `api_keys` containing `${VAR}`: expanded, source = `EnvExpanded`
/// - `api_keys` literal: used as-is, source = `Literal`
/// - `api_keys` absent: read `env_var`, source = `Convention(env_var)` or `None`
fn resolve_keys<F>(
    section: &str,
    api_keys: Option<String>,
    env_var: &str,
    lookup: &F,
) -> Result<(Option<ApiKey>, KeySource), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match api_keys {
        Some(raw) if raw.contains("${") => {
            let expanded = expand_env_vars_with(&raw, section, lookup)?;
            Ok((Some(ApiKey::from(expanded)), KeySource::EnvExpanded))
        }
        Some(raw) => Ok((Some(ApiKey::from(raw)), KeySource::Literal)),
        None => match lookup(env_var) {
            Some(value) => Ok((
                Some(ApiKey::from(value)),
                KeySource::Convention(env_var.to_string()),
            )),
            None => Ok((None, KeySource::None)),
        },
    }
}

fn env_lookup(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

impl Config {
    /// Load configuration from `path`, or from the environment alone when no
    /// path is given.
    pub fn load(path: Option<&Path>) -> Result<(Self, Vec<(String, KeySource)>), ConfigError> {
        match path {
            Some(path) => Self::from_file_with_env(path),
            None => Self::from_env(),
        }
    }

    /// Build a config from defaults plus the key environment variables.
    pub fn from_env() -> Result<(Self, Vec<(String, KeySource)>), ConfigError> {
        let (config, key_sources) = Self::from_raw_with(RawConfig::default(), &env_lookup)?;
        config.validate()?;
        Ok((config, key_sources))
    }

    /// Load configuration from a TOML file with environment variable expansion.
    ///
    /// Returns the config and per-section key source information.
    pub fn from_file_with_env(
        path: impl AsRef<Path>,
    ) -> Result<(Self, Vec<(String, KeySource)>), ConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| ConfigError::Io {
            path: path.as_ref().display().to_string(),
            source: e,
        })?;

        Self::parse_str_with(&content, env_lookup)
    }

    /// Parse configuration from a TOML string, resolving keys through `lookup`.
    ///
    /// Taking the lookup as a closure keeps tests off the process environment.
    pub fn parse_str_with<F>(
        content: &str,
        lookup: F,
    ) -> Result<(Self, Vec<(String, KeySource)>), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let raw: RawConfig = toml::from_str(content).map_err(ConfigError::Parse)?;
        let (config, key_sources) = Self::from_raw_with(raw, &lookup)?;
        config.validate()?;
        Ok((config, key_sources))
    }

    /// Convert raw (deserialized) config to final config, resolving key lists.
    fn from_raw_with<F>(
        raw: RawConfig,
        lookup: &F,
    ) -> Result<(Self, Vec<(String, KeySource)>), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let (tts_keys, tts_source) =
            resolve_keys("tts", raw.tts.api_keys, &raw.tts.api_keys_env, lookup)?;
        let (chat_keys, chat_source) =
            resolve_keys("chat", raw.chat.api_keys, &raw.chat.api_keys_env, lookup)?;

        let config = Config {
            server: raw.server,
            tts: TtsConfig {
                endpoint: raw.tts.endpoint,
                api_keys: tts_keys,
                rotation: raw.tts.rotation,
                default_voice: raw.tts.default_voice,
            },
            chat: ChatConfig {
                endpoint: raw.chat.endpoint,
                api_keys: chat_keys,
                rotation: raw.chat.rotation,
                model: raw.chat.model,
                default_max_tokens: raw.chat.default_max_tokens,
            },
            logging: raw.logging,
        };

        let key_sources = vec![
            ("tts".to_string(), tts_source),
            ("chat".to_string(), chat_source),
        ];

        Ok((config, key_sources))
    }

    /// Validate the configuration.
    ///
    /// Missing keys are not an error here: the affected endpoint answers 500
    /// per request instead, and callers warn at startup.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.server.listen.trim().is_empty() {
            return Err(ConfigError::Validation(
                "server.listen must not be empty".to_string(),
            ));
        }

        for (section, endpoint) in [("tts", &self.tts.endpoint), ("chat", &self.chat.endpoint)] {
            Url::parse(endpoint).map_err(|e| {
                ConfigError::Validation(format!(
                    "[{}] endpoint '{}' is not a valid URL: {}",
                    section, endpoint, e
                ))
            })?;
        }

        if self.tts.default_voice.trim().is_empty() {
            return Err(ConfigError::Validation(
                "tts.default_voice must not be empty".to_string(),
            ));
        }

        if self.chat.model.trim().is_empty() {
            return Err(ConfigError::Validation(
                "chat.model must not be empty".to_string(),
            ));
        }

        if self.chat.default_max_tokens == 0 {
            return Err(ConfigError::Validation(
                "chat.default_max_tokens must be positive".to_string(),
            ));
        }

        Ok(())
    }
}
