//! Storage abstraction layer for appcoder-retriever
//!
//! The retrieval core only ever reads from the documentation store. Rows are
//! written by the ingestion pipeline (crawling, chunking, embedding), which is
//! a separate collaborator; [`sqlite_store::SqliteDocStore::upsert_chunks`] is
//! the write path it uses.
//!
//! ## Key Components
//!
//! - **DocumentStore**: Read-only, per-partition query trait used by the engine
//! - **SqliteDocStore**: SQLite implementation, one table per partition
//! - **Data Types**: [`DocumentChunk`], [`ScoredChunk`], [`StoreError`]
//!
//! ## Per-partition operations
//!
//! ```text
//! similarity_search(embedding, limit)   optional, see supports_similarity()
//! scan(limit?)                          unranked, store-native order
//! scan_by_url(url)                      ordered by chunk_index
//! ```

use crate::partition::Partition;
use async_trait::async_trait;
use half::f16;
use serde::{Deserialize, Serialize};

pub mod sqlite_store;

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// A bounded slice of one documentation page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentChunk {
    /// URL of the page this chunk was cut from
    pub url: String,
    /// Zero-based position of the chunk within its page
    pub chunk_index: u32,
    /// Page title, possibly compound ("Main Title - Subsection")
    pub title: String,
    /// Short summary produced at ingestion
    #[serde(default)]
    pub summary: String,
    /// Chunk text
    pub content: String,
    /// Opaque ingestion annotations
    #[serde(default)]
    pub metadata: serde_json::Value,
    /// Stored embedding; omitted by reads that do not need it
    #[serde(skip)]
    pub embedding: Option<Vec<f16>>,
}

/// A chunk returned by similarity search, with its cosine similarity to the query.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredChunk {
    pub chunk: DocumentChunk,
    pub similarity: f32,
}

/// Failures reading from or writing to a store partition.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("similarity search is not available for partition {0}")]
    SimilarityUnavailable(Partition),

    #[error("invalid record: {0}")]
    InvalidRecord(String),

    #[error("metadata serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Read-only access to the partitioned documentation store.
///
/// Every method addresses exactly one partition. Implementations must not
/// hold locks across awaits; callers may issue requests for different
/// partitions concurrently.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Whether `similarity_search` is available for this partition.
    ///
    /// Fixed when the store is configured; the engine consults it instead of
    /// probing by failure.
    fn supports_similarity(&self, partition: Partition) -> bool;

    /// Up to `limit` chunks ranked by descending similarity to `query`.
    async fn similarity_search(
        &self,
        partition: Partition,
        query: &[f16],
        limit: usize,
    ) -> Result<Vec<ScoredChunk>>;

    /// Up to `limit` chunks (all when `None`) in store-native order.
    async fn scan(&self, partition: Partition, limit: Option<usize>) -> Result<Vec<DocumentChunk>>;

    /// All chunks of one page, ordered by `chunk_index`.
    async fn scan_by_url(&self, partition: Partition, url: &str) -> Result<Vec<DocumentChunk>>;

    /// URLs of every row in the partition, duplicates included.
    async fn list_urls(&self, partition: Partition) -> Result<Vec<String>> {
        Ok(self
            .scan(partition, None)
            .await?
            .into_iter()
            .map(|chunk| chunk.url)
            .collect())
    }

    /// Number of chunk rows in the partition.
    async fn count_rows(&self, partition: Partition) -> Result<usize> {
        Ok(self.scan(partition, None).await?.len())
    }
}

/// Cosine similarity between two half precision vectors.
///
/// Mismatched lengths and zero-norm vectors score 0, so a fallback zero query
/// vector ranks every row equally.
pub fn cosine_similarity(a: &[f16], b: &[f16]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let mut dot_product = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;

    for (x, y) in a.iter().zip(b) {
        let x = x.to_f32();
        let y = y.to_f32();
        dot_product += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let norm = norm_a.sqrt() * norm_b.sqrt();
    if norm == 0.0 { 0.0 } else { dot_product / norm }
}
