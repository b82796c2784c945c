//! Status reporting for the CLI and the MCP `status` tool.
//!
//! A [`StatusReport`] combines what the store holds per partition with the
//! counters the engine keeps for failures it swallowed.

use crate::partition::Partition;
use crate::retrieval::{HealthSnapshot, RetrievalEngine, RetrievalSettings};
use crate::storage::StoreError;
use appcoder_embed::EmbedStats;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashSet;
use std::fmt::Write as _;

/// State of one partition.
#[derive(Debug, Clone, Serialize)]
pub struct PartitionStatus {
    pub partition: Partition,
    pub framework: String,
    pub table: String,
    pub label: String,
    pub similarity_index: bool,
    /// Chunk rows, `None` if the table could not be read
    pub rows: Option<usize>,
    /// Distinct page URLs, `None` if the table could not be read
    pub pages: Option<usize>,
    /// Read error hit while collecting this report
    pub error: Option<String>,
    pub read_failures: u64,
    pub similarity_fallbacks: u64,
}

/// Point-in-time status of the retrieval core.
#[derive(Debug, Clone, Serialize)]
pub struct StatusReport {
    pub generated_at: DateTime<Utc>,
    pub partitions: Vec<PartitionStatus>,
    pub settings: RetrievalSettings,
    pub health: HealthSnapshot,
    pub embedding: EmbedStats,
}

impl StatusReport {
    /// Collect a report from the engine's store and counters.
    ///
    /// Reads go straight to the store, so collecting a report does not move
    /// the engine's own counters.
    pub async fn collect(engine: &RetrievalEngine) -> Self {
        let health = engine.health();
        let store = engine.store();
        let mut partitions = Vec::with_capacity(Partition::ALL.len());

        for (partition, spec) in engine.partitions().iter() {
            let counters = health.partition(partition);
            let contents = async {
                let rows = store.count_rows(partition).await?;
                let urls = store.list_urls(partition).await?;
                let distinct: HashSet<&str> = urls.iter().map(String::as_str).collect();
                Ok::<_, StoreError>((rows, distinct.len()))
            };
            let (rows, pages, error) = match contents.await {
                Ok((rows, pages)) => (Some(rows), Some(pages), None),
                Err(e) => {
                    tracing::warn!("Status: cannot read {}: {}", spec.table, e);
                    (None, None, Some(e.to_string()))
                }
            };

            partitions.push(PartitionStatus {
                partition,
                framework: partition.framework().to_string(),
                table: spec.table.clone(),
                label: spec.label.clone(),
                similarity_index: spec.similarity_index,
                rows,
                pages,
                error,
                read_failures: counters.map_or(0, |c| c.read_failures),
                similarity_fallbacks: counters.map_or(0, |c| c.similarity_fallbacks),
            });
        }

        Self {
            generated_at: Utc::now(),
            partitions,
            settings: engine.settings(),
            health,
            embedding: engine.embed_stats(),
        }
    }

    /// Chunk rows across all readable partitions.
    pub fn total_rows(&self) -> usize {
        self.partitions.iter().filter_map(|p| p.rows).sum()
    }

    /// Whether every partition table could be read.
    pub fn is_healthy(&self) -> bool {
        self.partitions.iter().all(|p| p.error.is_none())
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Human readable summary.
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "AppCoder Documentation Retriever Status");
        let _ = writeln!(out, "=======================================");
        let _ = writeln!(out, "Generated: {}", self.generated_at.to_rfc3339());
        let _ = writeln!(
            out,
            "Overall: {}",
            if self.is_healthy() { "Healthy" } else { "Degraded" }
        );

        let _ = writeln!(out, "\nPartitions:");
        for p in &self.partitions {
            let contents = match (p.rows, p.pages) {
                (Some(rows), Some(pages)) => format!("{rows} chunks, {pages} pages"),
                _ => format!("unreadable ({})", p.error.as_deref().unwrap_or("unknown error")),
            };
            let _ = writeln!(
                out,
                "  {} [{}] {} table={} similarity={}: {}",
                p.label,
                p.partition,
                p.framework,
                p.table,
                if p.similarity_index { "yes" } else { "no" },
                contents
            );
            if p.read_failures > 0 || p.similarity_fallbacks > 0 {
                let _ = writeln!(
                    out,
                    "    read failures: {}, similarity fallbacks: {}",
                    p.read_failures, p.similarity_fallbacks
                );
            }
        }
        let _ = writeln!(out, "  Total chunks: {}", self.total_rows());

        let _ = writeln!(out, "\nRequests:");
        let _ = writeln!(out, "  Retrievals: {}", self.health.retrievals);
        let _ = writeln!(out, "  Page reads: {}", self.health.page_reads);
        let _ = writeln!(out, "  Page listings: {}", self.health.page_listings);
        let _ = writeln!(
            out,
            "  Limits: {} ranked, {} per partition on fan-out",
            self.settings.ranked_limit, self.settings.fanout_limit
        );

        let _ = writeln!(out, "\nEmbedding:");
        let _ = writeln!(out, "  Provider: {}", self.embedding.provider);
        let _ = writeln!(out, "  Dimensions: {}", self.embedding.dimension);
        let _ = writeln!(
            out,
            "  Requests: {} ({} cached, {} fallbacks)",
            self.embedding.requests, self.embedding.cache_hits, self.embedding.fallbacks
        );
        out
    }
}

impl std::fmt::Display for StatusReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.render_text())
    }
}
