//! Key selection logic.

use std::sync::atomic::{AtomicUsize, Ordering};

use rand::Rng;
use serde::Deserialize;

use crate::config::ApiKey;
use crate::error::{Error, Result};

/// Separator between keys in a configured key list.
pub const KEY_DELIMITER: char = ',';

/// Rule for picking which key serves a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RotationPolicy {
    #[default]
    Random,
    #[serde(alias = "round-robin")]
    RoundRobin,
}

impl std::fmt::Display for RotationPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RotationPolicy::Random => write!(f, "random"),
            RotationPolicy::RoundRobin => write!(f, "round_robin"),
        }
    }
}

/// Immutable set of interchangeable keys for one provider.
#[derive(Debug)]
pub struct KeyPool {
    provider: String,
    keys: Vec<ApiKey>,
    policy: RotationPolicy,
    /// Next round-robin index. Always `< keys.len()` when the pool is non-empty.
    cursor: AtomicUsize,
}

impl KeyPool {
    /// Create a pool from already-split keys.
    pub fn new(provider: impl Into<String>, keys: Vec<ApiKey>, policy: RotationPolicy) -> Self {
        Self {
            provider: provider.into(),
            keys,
            policy,
            cursor: AtomicUsize::new(0),
        }
    }

    /// Create a pool from a comma-separated key list.
    ///
    /// Entries are trimmed and empty entries dropped, so `None`, `""` and
    /// `" , "` all produce an empty (but valid) pool.
    pub fn from_delimited(
        provider: impl Into<String>,
        raw: Option<&str>,
        policy: RotationPolicy,
    ) -> Self {
        let keys = raw
            .unwrap_or_default()
            .split(KEY_DELIMITER)
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .map(ApiKey::from)
            .collect();
        Self::new(provider, keys, policy)
    }

    /// Number of available keys.
    pub fn size(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn policy(&self) -> RotationPolicy {
        self.policy
    }

    pub fn provider(&self) -> &str {
        &self.provider
    }

    /// Pick the key for one request.
    ///
    /// Fails with [`Error::NoCredentials`] when the pool is empty; callers
    /// must stop before contacting the provider.
    pub fn next(&self) -> Result<&ApiKey> {
        let len = self.keys.len();
        if len == 0 {
            tracing::error!(provider = %self.provider, "No API keys configured");
            return Err(Error::NoCredentials {
                provider: self.provider.clone(),
            });
        }

        let index = match self.policy {
            RotationPolicy::Random => rand::rng().random_range(0..len),
            RotationPolicy::RoundRobin => {
                // Read-and-advance in one step so concurrent callers never share a slot.
                match self
                    .cursor
                    .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |current| {
                        Some((current + 1) % len)
                    }) {
                    Ok(previous) | Err(previous) => previous,
                }
            }
        };

        tracing::debug!(
            provider = %self.provider,
            policy = %self.policy,
            index,
            pool_size = len,
            "Selected API key"
        );

        Ok(&self.keys[index])
    }
}
