//! Per-partition failure counters.
//!
//! Partition failures are swallowed by the retrieval operations so the agent
//! always gets text back. These counters are where they remain visible; the
//! status report and the MCP `status` tool read them.

use crate::partition::Partition;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Default)]
struct PartitionCounters {
    read_failures: AtomicU64,
    similarity_fallbacks: AtomicU64,
}

/// Lock-free counters shared by every clone of an engine.
#[derive(Debug, Default)]
pub struct PartitionHealth {
    partitions: [PartitionCounters; 4],
    retrievals: AtomicU64,
    page_reads: AtomicU64,
    page_listings: AtomicU64,
}

/// Counters of one partition at a point in time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PartitionHealthSnapshot {
    pub partition: Partition,
    pub read_failures: u64,
    pub similarity_fallbacks: u64,
}

/// Point-in-time view of [`PartitionHealth`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthSnapshot {
    pub retrievals: u64,
    pub page_reads: u64,
    pub page_listings: u64,
    pub partitions: Vec<PartitionHealthSnapshot>,
}

impl HealthSnapshot {
    /// Counters of a single partition.
    pub fn partition(&self, partition: Partition) -> Option<&PartitionHealthSnapshot> {
        self.partitions.iter().find(|p| p.partition == partition)
    }

    /// Read failures across all partitions.
    pub fn total_read_failures(&self) -> u64 {
        self.partitions.iter().map(|p| p.read_failures).sum()
    }
}

impl PartitionHealth {
    fn counters(&self, partition: Partition) -> &PartitionCounters {
        &self.partitions[partition.index()]
    }

    pub(crate) fn record_read_failure(&self, partition: Partition) {
        self.counters(partition)
            .read_failures
            .fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_similarity_fallback(&self, partition: Partition) {
        self.counters(partition)
            .similarity_fallbacks
            .fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_retrieval(&self) {
        self.retrievals.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_page_read(&self) {
        self.page_reads.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_page_listing(&self) {
        self.page_listings.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> HealthSnapshot {
        HealthSnapshot {
            retrievals: self.retrievals.load(Ordering::Relaxed),
            page_reads: self.page_reads.load(Ordering::Relaxed),
            page_listings: self.page_listings.load(Ordering::Relaxed),
            partitions: Partition::ALL
                .iter()
                .map(|&partition| {
                    let c = self.counters(partition);
                    PartitionHealthSnapshot {
                        partition,
                        read_failures: c.read_failures.load(Ordering::Relaxed),
                        similarity_fallbacks: c.similarity_fallbacks.load(Ordering::Relaxed),
                    }
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_are_per_partition() {
        let health = PartitionHealth::default();
        health.record_read_failure(Partition::Server);
        health.record_read_failure(Partition::Server);
        health.record_similarity_fallback(Partition::Web);
        health.record_retrieval();

        let snap = health.snapshot();
        assert_eq!(snap.retrievals, 1);
        assert_eq!(snap.partition(Partition::Server).unwrap().read_failures, 2);
        assert_eq!(snap.partition(Partition::Web).unwrap().similarity_fallbacks, 1);
        assert_eq!(snap.partition(Partition::Mobile).unwrap().read_failures, 0);
        assert_eq!(snap.total_read_failures(), 2);
        assert_eq!(snap.partitions.len(), 4);
    }
}
