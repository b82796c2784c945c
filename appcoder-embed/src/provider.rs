//! Embedding provider implementations

use crate::config::EmbedConfig;
use crate::error::{EmbedError, Result};
use async_trait::async_trait;
use half::f16;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Trait for embedding providers that can generate embeddings from text
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Generate an embedding for a single text
    async fn embed_text(&self, text: &str) -> Result<Vec<f16>>;

    /// Get the dimension of embeddings produced by this provider
    fn embedding_dimension(&self) -> usize;

    /// Get the name/identifier of this provider
    fn provider_name(&self) -> &str;
}

#[derive(Serialize)]
struct OpenAiEmbeddingRequest<'a> {
    model: &'a str,
    input: &'a str,
}

#[derive(Deserialize)]
struct OpenAiEmbeddingResponse {
    data: Vec<OpenAiEmbeddingData>,
}

#[derive(Deserialize)]
struct OpenAiEmbeddingData {
    embedding: Vec<f32>,
    #[serde(default)]
    index: usize,
}

/// Embedding provider for OpenAI and API-compatible servers (Ollama, LM Studio, vLLM).
#[derive(Clone)]
pub struct OpenAiProvider {
    config: EmbedConfig,
    client: reqwest::Client,
}

impl std::fmt::Debug for OpenAiProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiProvider")
            .field("config", &self.config)
            .finish()
    }
}

impl OpenAiProvider {
    /// Creates a provider after validating the configuration.
    pub fn new(config: EmbedConfig) -> Result<Self> {
        config.validate()?;
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs.max(1)))
            .build()?;
        Ok(Self { config, client })
    }

    async fn request(&self, input: &str) -> Result<Vec<Vec<f32>>> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .ok_or(EmbedError::NotConfigured)?;

        let body = OpenAiEmbeddingRequest {
            model: &self.config.model,
            input,
        };

        tracing::debug!(
            "Requesting embeddings from {} with model {}",
            self.config.api_base,
            self.config.model
        );

        let response = self
            .client
            .post(self.config.embeddings_url())
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after_secs = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse().ok())
                .unwrap_or(60);
            return Err(EmbedError::RateLimited { retry_after_secs });
        }

        let text = response.text().await?;
        if !status.is_success() {
            return Err(EmbedError::Api {
                status: status.as_u16(),
                body: text,
            });
        }

        let mut parsed: OpenAiEmbeddingResponse = serde_json::from_str(&text)
            .map_err(|e| EmbedError::invalid_response(format!("malformed body: {e}")))?;
        parsed.data.sort_by_key(|d| d.index);

        let expected = self.config.dimension;
        parsed
            .data
            .into_iter()
            .map(|d| {
                if d.embedding.len() == expected {
                    Ok(d.embedding)
                } else {
                    Err(EmbedError::DimensionMismatch {
                        expected,
                        actual: d.embedding.len(),
                    })
                }
            })
            .collect()
    }
}

/// Convert provider output to the half precision the store persists.
fn convert_to_f16(embedding: &[f32]) -> Vec<f16> {
    embedding.iter().map(|&x| f16::from_f32(x)).collect()
}

#[async_trait]
impl EmbeddingProvider for OpenAiProvider {
    async fn embed_text(&self, text: &str) -> Result<Vec<f16>> {
        let mut vectors = self.request(text).await?;
        if vectors.is_empty() {
            return Err(EmbedError::invalid_response("no embedding in response"));
        }
        Ok(convert_to_f16(&vectors.swap_remove(0)))
    }

    fn embedding_dimension(&self) -> usize {
        self.config.dimension
    }

    fn provider_name(&self) -> &str {
        "openai"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_rejects_invalid_config() {
        let result = OpenAiProvider::new(EmbedConfig::default().with_dimension(0));
        assert!(matches!(result, Err(EmbedError::InvalidConfig { .. })));
    }

    #[tokio::test]
    async fn test_missing_key_fails_without_request() {
        let provider = OpenAiProvider::new(
            EmbedConfig::default().with_api_base("http://127.0.0.1:9"),
        )
        .expect("valid config");
        let err = provider.embed_text("hello").await.unwrap_err();
        assert!(matches!(err, EmbedError::NotConfigured));
    }

    #[test]
    fn test_request_serialisation() {
        let request = OpenAiEmbeddingRequest {
            model: "m",
            input: "hi",
        };
        assert_eq!(
            serde_json::to_string(&request).unwrap(),
            r#"{"model":"m","input":"hi"}"#
        );
    }
}
