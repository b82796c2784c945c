//! Never-failing embedding front end used by the retrieval core.
//!
//! Retrieval has to keep working while the embedding provider is down, rate
//! limited or misconfigured. [`ResilientEmbedder`] wraps any
//! [`EmbeddingProvider`] and turns every failure into a zero vector of the
//! provider's dimension. Similarity search against a zero vector scores every
//! row the same, so ranking degrades to store order instead of erroring.
//!
//! Successful embeddings are kept in a small LRU cache keyed by the exact query
//! text. Zero vectors are never cached, so a recovered provider is used again
//! on the next call.

use crate::provider::EmbeddingProvider;
use half::f16;
use lru::LruCache;
use serde::Serialize;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

/// Point-in-time counters for the embedder.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EmbedStats {
    pub provider: String,
    pub dimension: usize,
    pub requests: u64,
    pub cache_hits: u64,
    pub fallbacks: u64,
}

/// Embedding front end that always returns a vector of the configured dimension.
pub struct ResilientEmbedder {
    provider: Arc<dyn EmbeddingProvider>,
    dimension: usize,
    cache: Option<Mutex<LruCache<String, Vec<f16>>>>,
    requests: AtomicU64,
    cache_hits: AtomicU64,
    fallbacks: AtomicU64,
}

impl std::fmt::Debug for ResilientEmbedder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResilientEmbedder")
            .field("provider", &self.provider.provider_name())
            .field("dimension", &self.dimension)
            .field("cached", &self.cache.is_some())
            .finish()
    }
}

impl ResilientEmbedder {
    /// Wrap a provider. `cache_capacity` of 0 disables the query cache.
    pub fn new(provider: Arc<dyn EmbeddingProvider>, cache_capacity: usize) -> Self {
        let dimension = provider.embedding_dimension();
        let cache = NonZeroUsize::new(cache_capacity).map(|cap| Mutex::new(LruCache::new(cap)));
        Self {
            provider,
            dimension,
            cache,
            requests: AtomicU64::new(0),
            cache_hits: AtomicU64::new(0),
            fallbacks: AtomicU64::new(0),
        }
    }

    /// Embed `text`, returning a zero vector if the provider fails.
    pub async fn embed(&self, text: &str) -> Vec<f16> {
        self.requests.fetch_add(1, Ordering::Relaxed);

        if let Some(hit) = self.cached(text) {
            self.cache_hits.fetch_add(1, Ordering::Relaxed);
            tracing::debug!("Embedding cache hit ({} chars)", text.len());
            return hit;
        }

        match self.provider.embed_text(text).await {
            Ok(embedding) if embedding.len() == self.dimension => {
                self.remember(text, &embedding);
                embedding
            }
            Ok(embedding) => {
                tracing::warn!(
                    "Provider {} returned {} dimensions, expected {}; using zero vector",
                    self.provider.provider_name(),
                    embedding.len(),
                    self.dimension
                );
                self.fallback()
            }
            Err(e) => {
                tracing::warn!(
                    "Error getting embedding from {}: {}; using zero vector",
                    self.provider.provider_name(),
                    e
                );
                self.fallback()
            }
        }
    }

    /// Snapshot of the request counters.
    pub fn stats(&self) -> EmbedStats {
        EmbedStats {
            provider: self.provider.provider_name().to_string(),
            dimension: self.dimension,
            requests: self.requests.load(Ordering::Relaxed),
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            fallbacks: self.fallbacks.load(Ordering::Relaxed),
        }
    }

    fn fallback(&self) -> Vec<f16> {
        self.fallbacks.fetch_add(1, Ordering::Relaxed);
        vec![f16::ZERO; self.dimension]
    }

    fn cached(&self, text: &str) -> Option<Vec<f16>> {
        let cache = self.cache.as_ref()?;
        lock(cache).get(text).cloned()
    }

    fn remember(&self, text: &str, embedding: &[f16]) {
        if let Some(cache) = &self.cache {
            lock(cache).put(text.to_string(), embedding.to_vec());
        }
    }
}

// A poisoned cache only means another request panicked mid-insert; the map is still usable.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{EmbedError, Result};
    use async_trait::async_trait;
    use std::sync::atomic::AtomicUsize;
    use tracing_test::traced_test;

    struct CountingProvider {
        dimension: usize,
        output_len: usize,
        fail: bool,
        calls: AtomicUsize,
    }

    impl CountingProvider {
        fn healthy(dimension: usize) -> Self {
            Self {
                dimension,
                output_len: dimension,
                fail: false,
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl EmbeddingProvider for CountingProvider {
        async fn embed_text(&self, text: &str) -> Result<Vec<f16>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(EmbedError::RateLimited {
                    retry_after_secs: 1,
                });
            }
            Ok(vec![f16::from_f32(text.len() as f32); self.output_len])
        }

        fn embedding_dimension(&self) -> usize {
            self.dimension
        }

        fn provider_name(&self) -> &str {
            "counting"
        }
    }

    #[tokio::test]
    #[traced_test]
    async fn test_failure_yields_zero_vector() {
        let provider = Arc::new(CountingProvider {
            fail: true,
            ..CountingProvider::healthy(1536)
        });
        let embedder = ResilientEmbedder::new(provider, 16);

        let long = "x".repeat(100_000);
        for text in ["", "hooks", long.as_str()] {
            let v = embedder.embed(text).await;
            assert_eq!(v.len(), 1536);
            assert!(v.iter().all(|x| *x == f16::ZERO));
        }
        assert_eq!(embedder.stats().fallbacks, 3);
        assert!(logs_contain("using zero vector"));
    }

    #[tokio::test]
    async fn test_wrong_dimension_is_treated_as_failure() {
        let provider = Arc::new(CountingProvider {
            output_len: 3,
            ..CountingProvider::healthy(1536)
        });
        let embedder = ResilientEmbedder::new(provider, 0);
        let v = embedder.embed("hello").await;
        assert_eq!(v.len(), 1536);
        assert_eq!(embedder.stats().fallbacks, 1);
    }

    #[tokio::test]
    async fn test_cache_serves_repeated_queries() {
        let provider = Arc::new(CountingProvider::healthy(4));
        let embedder = ResilientEmbedder::new(provider.clone(), 8);

        let first = embedder.embed("state management").await;
        let second = embedder.embed("state management").await;
        assert_eq!(first, second);
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);

        let stats = embedder.stats();
        assert_eq!(stats.requests, 2);
        assert_eq!(stats.cache_hits, 1);
        assert_eq!(stats.fallbacks, 0);
        assert_eq!(stats.provider, "counting");
    }

    #[tokio::test]
    async fn test_fallbacks_are_not_cached() {
        let provider = Arc::new(CountingProvider {
            fail: true,
            ..CountingProvider::healthy(4)
        });
        let embedder = ResilientEmbedder::new(provider.clone(), 8);
        embedder.embed("q").await;
        embedder.embed("q").await;
        assert_eq!(provider.calls.load(Ordering::SeqCst), 2);
        assert_eq!(embedder.stats().cache_hits, 0);
    }

    #[tokio::test]
    async fn test_disabled_cache_always_calls_provider() {
        let provider = Arc::new(CountingProvider::healthy(2));
        let embedder = ResilientEmbedder::new(provider.clone(), 0);
        embedder.embed("a").await;
        embedder.embed("a").await;
        assert_eq!(provider.calls.load(Ordering::SeqCst), 2);
    }
}
