//! Shared fixtures: an in-memory store with failure injection and scripted
//! embedding providers.

#![allow(dead_code)]

use appcoder_embed::{EmbedError, EmbeddingProvider, ResilientEmbedder};
use appcoder_retriever::partition::{Partition, PartitionMap};
use appcoder_retriever::retrieval::{RetrievalEngine, RetrievalSettings};
use appcoder_retriever::storage::{
    DocumentChunk, DocumentStore, Result, ScoredChunk, StoreError, cosine_similarity,
};
use async_trait::async_trait;
use half::f16;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Store holding rows in insertion order per partition.
#[derive(Default)]
pub struct FakeStore {
    rows: HashMap<Partition, Vec<DocumentChunk>>,
    similarity: HashSet<Partition>,
    failing: HashSet<Partition>,
    broken_similarity: HashSet<Partition>,
    pub similarity_calls: AtomicUsize,
    pub scan_calls: AtomicUsize,
}

impl FakeStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rows(mut self, partition: Partition, rows: Vec<DocumentChunk>) -> Self {
        self.rows.entry(partition).or_default().extend(rows);
        self
    }

    /// Advertise similarity search for a partition.
    pub fn with_similarity(mut self, partition: Partition) -> Self {
        self.similarity.insert(partition);
        self
    }

    /// Every read of the partition fails.
    pub fn failing(mut self, partition: Partition) -> Self {
        self.failing.insert(partition);
        self
    }

    /// Similarity is advertised but errors; plain scans still work.
    pub fn broken_similarity(mut self, partition: Partition) -> Self {
        self.similarity.insert(partition);
        self.broken_similarity.insert(partition);
        self
    }

    fn check(&self, partition: Partition) -> Result<&[DocumentChunk]> {
        if self.failing.contains(&partition) {
            return Err(StoreError::InvalidRecord(format!(
                "injected failure on {partition}"
            )));
        }
        Ok(self.rows.get(&partition).map(Vec::as_slice).unwrap_or(&[]))
    }
}

#[async_trait]
impl DocumentStore for FakeStore {
    fn supports_similarity(&self, partition: Partition) -> bool {
        self.similarity.contains(&partition)
    }

    async fn similarity_search(
        &self,
        partition: Partition,
        query: &[f16],
        limit: usize,
    ) -> Result<Vec<ScoredChunk>> {
        self.similarity_calls.fetch_add(1, Ordering::SeqCst);
        if self.broken_similarity.contains(&partition) {
            return Err(StoreError::SimilarityUnavailable(partition));
        }
        let (embedded, unembedded): (Vec<_>, Vec<_>) = self
            .check(partition)?
            .iter()
            .partition(|chunk| chunk.embedding.is_some());
        let mut scored: Vec<_> = embedded
            .into_iter()
            .map(|chunk| ScoredChunk {
                similarity: chunk
                    .embedding
                    .as_deref()
                    .map_or(0.0, |embedding| cosine_similarity(query, embedding)),
                chunk: chunk.clone(),
            })
            .collect();
        scored.sort_by(|a, b| b.similarity.total_cmp(&a.similarity));
        // unembedded rows rank last, in insertion order
        scored.extend(unembedded.into_iter().map(|chunk| ScoredChunk {
            chunk: chunk.clone(),
            similarity: 0.0,
        }));
        scored.truncate(limit);
        Ok(scored)
    }

    async fn scan(&self, partition: Partition, limit: Option<usize>) -> Result<Vec<DocumentChunk>> {
        self.scan_calls.fetch_add(1, Ordering::SeqCst);
        let rows = self.check(partition)?;
        let n = limit.unwrap_or(rows.len()).min(rows.len());
        Ok(rows[..n].to_vec())
    }

    // Rows come back in insertion order, not chunk order, so callers must sort.
    async fn scan_by_url(&self, partition: Partition, url: &str) -> Result<Vec<DocumentChunk>> {
        Ok(self
            .check(partition)?
            .iter()
            .filter(|chunk| chunk.url == url)
            .cloned()
            .collect())
    }
}

/// Provider returning the same vector for every text.
pub struct FixedProvider(pub Vec<f32>);

#[async_trait]
impl EmbeddingProvider for FixedProvider {
    async fn embed_text(&self, _text: &str) -> appcoder_embed::Result<Vec<f16>> {
        Ok(self.0.iter().map(|&x| f16::from_f32(x)).collect())
    }

    fn embedding_dimension(&self) -> usize {
        self.0.len()
    }

    fn provider_name(&self) -> &str {
        "fixed"
    }
}

/// Provider that always errors.
pub struct FailingProvider {
    pub dimension: usize,
}

#[async_trait]
impl EmbeddingProvider for FailingProvider {
    async fn embed_text(&self, _text: &str) -> appcoder_embed::Result<Vec<f16>> {
        Err(EmbedError::Api {
            status: 503,
            body: "service unavailable".into(),
        })
    }

    fn embedding_dimension(&self) -> usize {
        self.dimension
    }

    fn provider_name(&self) -> &str {
        "failing"
    }
}

pub fn chunk(url: &str, chunk_index: u32, title: &str, content: &str) -> DocumentChunk {
    DocumentChunk {
        url: url.into(),
        chunk_index,
        title: title.into(),
        summary: String::new(),
        content: content.into(),
        metadata: serde_json::json!({}),
        embedding: None,
    }
}

pub fn embedded(mut chunk: DocumentChunk, embedding: &[f32]) -> DocumentChunk {
    chunk.embedding = Some(embedding.iter().map(|&x| f16::from_f32(x)).collect());
    chunk
}

/// `count` single-chunk pages under `base`, titled "{title} {i}".
pub fn pages(base: &str, title: &str, count: usize) -> Vec<DocumentChunk> {
    (0..count)
        .map(|i| chunk(&format!("{base}/{i}"), 0, &format!("{title} {i}"), &format!("content {i}")))
        .collect()
}

pub fn engine(store: FakeStore) -> RetrievalEngine {
    engine_with(store, Arc::new(FixedProvider(vec![1.0, 0.0])))
}

pub fn engine_with(store: FakeStore, provider: Arc<dyn EmbeddingProvider>) -> RetrievalEngine {
    RetrievalEngine::new(
        Arc::new(store),
        Arc::new(ResilientEmbedder::new(provider, 16)),
        PartitionMap::default(),
        RetrievalSettings::default(),
    )
}

/// Labels of the block headings in a retrieval result, in order.
pub fn heading_labels(text: &str) -> Vec<String> {
    text.lines()
        .filter(|line| line.starts_with("# "))
        .filter_map(|line| {
            let open = line.rfind('(')?;
            let close = line.rfind(')')?;
            Some(line[open + 1..close].to_string())
        })
        .collect()
}
