//! Listing of the documentation pages held by the store.

use crate::partition::Partition;
use crate::retrieval::engine::RetrievalEngine;
use futures::future::join_all;
use std::collections::BTreeSet;
use tracing::{debug, warn};

impl RetrievalEngine {
    /// Distinct `"Label: url"` entries for one partition, or all of them.
    ///
    /// An unrecognised partition name lists every partition. A partition that
    /// cannot be read is skipped and counted; the others are still listed.
    pub async fn list_pages(&self, partition: Option<&str>) -> BTreeSet<String> {
        self.health.record_page_listing();

        let targets = match partition.and_then(Partition::parse) {
            Some(p) => vec![p],
            None => Partition::ALL.to_vec(),
        };

        let reads = join_all(
            targets
                .iter()
                .map(|&p| async move { (p, self.store.list_urls(p).await) }),
        )
        .await;

        let mut pages = BTreeSet::new();
        for (p, result) in reads {
            match result {
                Ok(urls) => {
                    let label = self.partitions.label(p);
                    debug!("Listed {} rows from {}", urls.len(), self.partitions.table(p));
                    pages.extend(urls.into_iter().map(|url| format!("{label}: {url}")));
                }
                Err(e) => {
                    warn!("Error listing pages of {}: {}", self.partitions.table(p), e);
                    self.health.record_read_failure(p);
                }
            }
        }
        pages
    }

    /// [`RetrievalEngine::list_pages`] as a sorted list, for the agent.
    pub async fn list_documentation_pages(&self, partition: Option<&str>) -> Vec<String> {
        self.list_pages(partition).await.into_iter().collect()
    }
}
