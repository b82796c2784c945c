//! Reconstruction of a whole page from its stored chunks.

use crate::partition::Partition;
use crate::retrieval::engine::RetrievalEngine;
use crate::retrieval::format::format_page;
use crate::retrieval::outcome::PageOutcome;
use tracing::{debug, info, warn};

impl RetrievalEngine {
    /// Reassemble the page stored under `url`.
    ///
    /// Partitions are probed in [`Partition::ALL`] order and the first one
    /// holding rows for the URL wins; later partitions are not consulted.
    /// A failed probe is counted and probing continues.
    pub async fn read_page(&self, url: &str) -> PageOutcome {
        self.health.record_page_read();
        let mut causes = Vec::new();

        for partition in Partition::ALL {
            let mut rows = match self.store.scan_by_url(partition, url).await {
                Ok(rows) => rows,
                Err(e) => {
                    warn!("Error reading {} from {}: {}", url, self.partitions.table(partition), e);
                    self.health.record_read_failure(partition);
                    causes.push(format!("{partition}: {e}"));
                    continue;
                }
            };

            // stable, so equal indices keep store order
            rows.sort_by_key(|row| row.chunk_index);
            let Some(first) = rows.first() else {
                debug!("{} not in {}", url, self.partitions.table(partition));
                continue;
            };

            info!("Read {} chunks of {} from {}", rows.len(), url, partition);
            let text = format_page(
                &first.title,
                self.partitions.label(partition),
                url,
                rows.iter().map(|row| row.content.as_str()),
            );
            return PageOutcome::Found {
                text,
                partition,
                chunks: rows.len(),
            };
        }

        if causes.len() == Partition::ALL.len() {
            PageOutcome::Failed {
                url: url.to_string(),
                cause: causes.join("; "),
            }
        } else {
            PageOutcome::NotFound {
                url: url.to_string(),
            }
        }
    }

    /// Page text for the agent, or the not-found sentence.
    pub async fn get_page_content(&self, url: &str) -> String {
        self.read_page(url).await.into_text()
    }
}
