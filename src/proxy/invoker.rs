//! Single-shot calls to provider endpoints.
//!
//! Every inbound request produces at most one outbound call. There is no
//! retry and no backoff: a failed attempt is reported as-is, so a repeated
//! provider call can only ever come from the client repeating its request.
//! Redirects are not followed either; a 3xx is a provider failure.

use axum::http::header;
use reqwest::{Client, Url};
use serde::Serialize;
use serde_json::Value;

use crate::config::{ApiKey, ConfigError};
use crate::error::{Error, Result};

/// Where the provider expects the key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthScheme {
    /// `?key=<credential>` on the endpoint URL (Google Cloud style).
    QueryKey,
    /// `Authorization: Bearer <credential>` (OpenAI style).
    Bearer,
}

/// HTTP client for provider calls: no redirects, transport defaults otherwise.
pub fn provider_client() -> reqwest::Result<Client> {
    Client::builder()
        .user_agent(concat!("voxgate/", env!("CARGO_PKG_VERSION")))
        .redirect(reqwest::redirect::Policy::none())
        .build()
}

/// Issues POST requests with a JSON body to one fixed provider endpoint.
#[derive(Debug, Clone)]
pub struct ProviderInvoker {
    client: Client,
    provider: String,
    endpoint: Url,
    auth: AuthScheme,
}

impl ProviderInvoker {
    pub fn new(
        client: Client,
        provider: impl Into<String>,
        endpoint: &str,
        auth: AuthScheme,
    ) -> Result<Self> {
        let provider = provider.into();
        let endpoint = Url::parse(endpoint).map_err(|e| {
            ConfigError::Validation(format!(
                "Invalid endpoint for provider '{}': {}",
                provider, e
            ))
        })?;

        Ok(Self {
            client,
            provider,
            endpoint,
            auth,
        })
    }

    pub fn provider(&self) -> &str {
        &self.provider
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Send `payload` to the provider once.
    ///
    /// - 2xx with a JSON body: the body, unmodified
    /// - any other status: [`Error::Provider`] carrying the status and the
    ///   error body when it parses as JSON
    /// - no response or an undecodable success body: [`Error::Upstream`]
    pub async fn invoke<T: Serialize>(&self, key: &ApiKey, payload: &T) -> Result<Value> {
        let mut request = self
            .client
            .post(self.endpoint.clone())
            .header(header::CONTENT_TYPE, "application/json")
            .json(payload);

        request = match self.auth {
            AuthScheme::QueryKey => request.query(&[("key", key.expose_secret())]),
            AuthScheme::Bearer => request.bearer_auth(key.expose_secret()),
        };

        // Errors drop the URL: for query-key providers it contains the key.
        let response = request.send().await.map_err(|e| {
            let e = e.without_url();
            tracing::error!(error = %e, provider = %self.provider, "Failed to reach provider");
            Error::Upstream(e)
        })?;

        let status = response.status();
        if !status.is_success() {
            let error_body = match response.text().await {
                Ok(body) => body,
                Err(e) => {
                    tracing::debug!(
                        error = %e.without_url(),
                        provider = %self.provider,
                        "Failed to read provider error body"
                    );
                    String::new()
                }
            };
            tracing::error!(
                status = %status,
                provider = %self.provider,
                body = %error_body,
                "Provider returned error"
            );
            return Err(Error::Provider {
                provider: self.provider.clone(),
                status,
                detail: serde_json::from_str(&error_body).ok(),
            });
        }

        response.json::<Value>().await.map_err(|e| {
            let e = e.without_url();
            tracing::error!(error = %e, provider = %self.provider, "Failed to parse provider response");
            Error::Upstream(e)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_endpoint_is_config_error() {
        let result = ProviderInvoker::new(Client::new(), "tts", "::not a url", AuthScheme::QueryKey);
        assert!(matches!(result, Err(Error::Config(ConfigError::Validation(_)))));
    }

    #[test]
    fn test_endpoint_kept_without_key() {
        let invoker = ProviderInvoker::new(
            Client::new(),
            "tts",
            "https://texttospeech.googleapis.com/v1/text:synthesize",
            AuthScheme::QueryKey,
        )
        .unwrap();
        assert_eq!(invoker.endpoint().query(), None);
        assert_eq!(invoker.provider(), "tts");
    }
}
