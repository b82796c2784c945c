//! Configuration for embedding providers

use crate::error::{EmbedError, Result};
use serde::Deserialize;

/// Default OpenAI-compatible API endpoint.
pub const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";

/// Default embedding model; produces 1536-dimensional vectors.
pub const DEFAULT_MODEL: &str = "text-embedding-3-small";

/// Dimension every stored documentation chunk was embedded with.
pub const DEFAULT_DIMENSION: usize = 1536;

/// Configuration for an embedding provider
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct EmbedConfig {
    /// Base URL of the OpenAI-compatible API (without the `/embeddings` suffix)
    pub api_base: String,
    /// Bearer token for the API
    pub api_key: Option<String>,
    /// Name of the embedding model to use
    pub model: String,
    /// Expected dimension of every embedding vector
    pub dimension: usize,
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
    /// Number of query embeddings to keep in memory; 0 disables caching
    pub cache_capacity: usize,
}

// The API key never ends up in logs.
impl std::fmt::Debug for EmbedConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmbedConfig")
            .field("api_base", &self.api_base)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("model", &self.model)
            .field("dimension", &self.dimension)
            .field("timeout_secs", &self.timeout_secs)
            .field("cache_capacity", &self.cache_capacity)
            .finish()
    }
}

impl Default for EmbedConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            dimension: DEFAULT_DIMENSION,
            timeout_secs: 30,
            cache_capacity: 256,
        }
    }
}

impl EmbedConfig {
    /// Defaults overlaid with the process environment. See [`EmbedConfig::apply_env`].
    pub fn from_env() -> Self {
        Self::default().apply_env(|key| std::env::var(key).ok())
    }

    /// Overlay values from an environment lookup.
    ///
    /// Recognised variables, first match wins:
    /// - API key: `OPENAI_API_KEY`, `LLM_API_KEY`
    /// - base URL: `EMBEDDING_BASE_URL`, `BASE_URL`
    /// - model: `EMBEDDING_MODEL`
    pub fn apply_env<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let first = |keys: &[&str]| {
            keys.iter()
                .filter_map(|key| lookup(key))
                .find(|value| !value.trim().is_empty())
        };

        if let Some(key) = first(&["OPENAI_API_KEY", "LLM_API_KEY"]) {
            self.api_key = Some(key);
        }
        if let Some(base) = first(&["EMBEDDING_BASE_URL", "BASE_URL"]) {
            self.api_base = base;
        }
        if let Some(model) = first(&["EMBEDDING_MODEL"]) {
            self.model = model;
        }
        self
    }

    /// Set the API base URL (builder style)
    pub fn with_api_base<S: Into<String>>(self, api_base: S) -> Self {
        Self {
            api_base: api_base.into(),
            ..self
        }
    }

    /// Set the API key (builder style)
    pub fn with_api_key<S: Into<String>>(self, api_key: S) -> Self {
        Self {
            api_key: Some(api_key.into()),
            ..self
        }
    }

    /// Set the expected embedding dimension (builder style)
    pub fn with_dimension(self, dimension: usize) -> Self {
        Self { dimension, ..self }
    }

    /// Set the request timeout (builder style)
    pub fn with_timeout_secs(self, timeout_secs: u64) -> Self {
        Self {
            timeout_secs,
            ..self
        }
    }

    /// Endpoint that embedding requests are posted to
    pub fn embeddings_url(&self) -> String {
        format!("{}/embeddings", self.api_base.trim_end_matches('/'))
    }

    /// Check the configuration for values no provider can work with
    pub fn validate(&self) -> Result<()> {
        if self.dimension == 0 {
            return Err(EmbedError::invalid_config("dimension must be positive"));
        }
        if self.model.trim().is_empty() {
            return Err(EmbedError::invalid_config("model name must not be empty"));
        }
        if self.api_base.trim().is_empty() {
            return Err(EmbedError::invalid_config("api_base must not be empty"));
        }
        Ok(())
    }
}
