//! Retrieval engine: query embedding, partition fan-out and context assembly.
//!
//! ## Fallback ladder
//!
//! ```text
//! named partition ── similarity index? ── yes ── similarity_search(top N) ── ok ──▶ ranked rows
//!                         │                              │
//!                         no                           error
//!                         └──────────────┬───────────────┘
//!                                        ▼
//!                                  scan(limit N) ── ok ──▶ unranked rows
//!                                        │
//!                                      error ──▶ Failed
//!
//! no / unknown partition ── scan(limit M) on every partition concurrently
//!                           failures are counted and skipped, order is probe order
//! ```
//!
//! The engine never surfaces a store or provider error: callers get a
//! [`RetrievalOutcome`], and the agent-facing wrappers get plain text.

use crate::partition::{Partition, PartitionMap};
use crate::retrieval::format::{BLOCK_SEPARATOR, format_block};
use crate::retrieval::health::{HealthSnapshot, PartitionHealth};
use crate::retrieval::outcome::RetrievalOutcome;
use crate::storage::{DocumentChunk, DocumentStore, StoreError};
use appcoder_embed::{EmbedStats, ResilientEmbedder};
use futures::future::join_all;
use half::f16;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Row limits for the two retrieval paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalSettings {
    /// Rows returned when a single partition is queried
    pub ranked_limit: usize,
    /// Rows taken from each partition when fanning out
    pub fanout_limit: usize,
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        Self {
            ranked_limit: 5,
            fanout_limit: 2,
        }
    }
}

/// A documentation lookup, optionally scoped to one platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetrievalRequest {
    pub query: String,
    /// Platform name as given by the caller; unknown names fan out
    pub partition: Option<String>,
}

impl RetrievalRequest {
    pub fn new<S: Into<String>>(query: S) -> Self {
        Self {
            query: query.into(),
            partition: None,
        }
    }

    pub fn with_partition<S: Into<String>>(self, partition: S) -> Self {
        Self {
            partition: Some(partition.into()),
            ..self
        }
    }

    /// Name used in the not-found sentence.
    fn target(&self) -> String {
        match self.partition.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => "any platform".to_string(),
        }
    }
}

type PartitionRead = (Partition, Result<Vec<DocumentChunk>, StoreError>);

/// Entry point of the retrieval core.
///
/// Built once at process start from an explicit store, embedder and partition
/// map, then cloned into every consumer. Clones share the health counters.
#[derive(Clone)]
pub struct RetrievalEngine {
    pub(crate) store: Arc<dyn DocumentStore>,
    embedder: Arc<ResilientEmbedder>,
    pub(crate) partitions: PartitionMap,
    settings: RetrievalSettings,
    pub(crate) health: Arc<PartitionHealth>,
}

impl std::fmt::Debug for RetrievalEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetrievalEngine")
            .field("embedder", &self.embedder)
            .field("partitions", &self.partitions)
            .field("settings", &self.settings)
            .finish()
    }
}

impl RetrievalEngine {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        embedder: Arc<ResilientEmbedder>,
        partitions: PartitionMap,
        settings: RetrievalSettings,
    ) -> Self {
        Self {
            store,
            embedder,
            partitions,
            settings,
            health: Arc::new(PartitionHealth::default()),
        }
    }

    pub fn partitions(&self) -> &PartitionMap {
        &self.partitions
    }

    pub fn settings(&self) -> RetrievalSettings {
        self.settings
    }

    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }

    /// Failure and fallback counters accumulated so far.
    pub fn health(&self) -> HealthSnapshot {
        self.health.snapshot()
    }

    pub fn embed_stats(&self) -> EmbedStats {
        self.embedder.stats()
    }

    /// Retrieve documentation for a query and render it for the agent.
    ///
    /// Always returns text: the formatted blocks, or the not-found sentence
    /// naming the requested platform.
    pub async fn retrieve_documentation(&self, query: &str, partition: Option<&str>) -> String {
        let mut request = RetrievalRequest::new(query);
        request.partition = partition.map(str::to_string);
        self.retrieve(&request).await.into_text()
    }

    /// Retrieve documentation for a query.
    pub async fn retrieve(&self, request: &RetrievalRequest) -> RetrievalOutcome {
        self.health.record_retrieval();
        let target = request.target();
        info!(
            "Retrieving documentation: query='{}', partition={}",
            request.query, target
        );

        let embedding = self.embedder.embed(&request.query).await;

        let reads = match request.partition.as_deref().and_then(Partition::parse) {
            Some(partition) => vec![(partition, self.read_single(partition, &embedding).await)],
            None => {
                if let Some(name) = &request.partition {
                    debug!("Unrecognised partition '{}', querying all partitions", name);
                }
                self.read_all().await
            }
        };

        self.assemble(target, reads)
    }

    /// Ranked read of one partition, degrading to an unranked scan.
    async fn read_single(
        &self,
        partition: Partition,
        embedding: &[f16],
    ) -> Result<Vec<DocumentChunk>, StoreError> {
        let limit = self.settings.ranked_limit;

        if self.store.supports_similarity(partition) {
            match self
                .store
                .similarity_search(partition, embedding, limit)
                .await
            {
                Ok(mut scored) => {
                    scored.truncate(limit);
                    debug!("Similarity search on {} returned {} rows", partition, scored.len());
                    return Ok(scored.into_iter().map(|s| s.chunk).collect());
                }
                Err(e) => {
                    warn!(
                        "Similarity search failed on {}: {}; falling back to unranked scan",
                        partition, e
                    );
                }
            }
        } else {
            debug!("Partition {} has no similarity index, using unranked scan", partition);
        }
        self.health.record_similarity_fallback(partition);

        let mut rows = self.store.scan(partition, Some(limit)).await?;
        rows.truncate(limit);
        Ok(rows)
    }

    /// Unranked read of every partition, issued concurrently.
    ///
    /// `join_all` yields results in input order, so the merge below keeps
    /// probe order regardless of completion order.
    async fn read_all(&self) -> Vec<PartitionRead> {
        let limit = self.settings.fanout_limit;
        join_all(Partition::ALL.iter().map(|&partition| async move {
            let result = self.store.scan(partition, Some(limit)).await.map(|mut rows| {
                rows.truncate(limit);
                rows
            });
            (partition, result)
        }))
        .await
    }

    fn assemble(&self, target: String, reads: Vec<PartitionRead>) -> RetrievalOutcome {
        let attempted = reads.len();
        let mut blocks = Vec::new();
        let mut causes = Vec::new();

        for (partition, result) in reads {
            match result {
                Ok(rows) => {
                    let label = self.partitions.label(partition);
                    blocks.extend(rows.iter().map(|row| format_block(row, label)));
                }
                Err(e) => {
                    warn!("Error querying {}: {}", self.partitions.table(partition), e);
                    self.health.record_read_failure(partition);
                    causes.push(format!("{partition}: {e}"));
                }
            }
        }

        if !blocks.is_empty() {
            info!(
                "Retrieved {} blocks ({} of {} partitions failed)",
                blocks.len(),
                causes.len(),
                attempted
            );
            return RetrievalOutcome::Found {
                blocks: blocks.len(),
                text: blocks.join(BLOCK_SEPARATOR),
            };
        }

        if attempted > 0 && causes.len() == attempted {
            RetrievalOutcome::Failed {
                target,
                cause: causes.join("; "),
            }
        } else {
            RetrievalOutcome::Empty { target }
        }
    }
}
