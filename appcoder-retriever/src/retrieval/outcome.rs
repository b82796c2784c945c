//! Typed results of the retrieval operations.
//!
//! The engine reports what actually happened; the agent-facing tools collapse
//! an outcome to plain text with `into_text()` as the very last step. Both
//! "nothing stored" and "every read failed" render as the same sentinel
//! sentence, but code holding the outcome can tell them apart.

use crate::partition::Partition;
use std::fmt;

/// Result of `retrieve`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetrievalOutcome {
    /// At least one block was produced.
    Found { text: String, blocks: usize },
    /// Every read succeeded but returned no rows.
    Empty { target: String },
    /// No rows, and every partition read failed.
    Failed { target: String, cause: String },
}

impl RetrievalOutcome {
    /// Text handed to the agent.
    pub fn into_text(self) -> String {
        match self {
            Self::Found { text, .. } => text,
            Self::Empty { target } | Self::Failed { target, .. } => not_found_message(&target),
        }
    }

    /// Number of formatted blocks (0 unless found).
    pub fn blocks(&self) -> usize {
        match self {
            Self::Found { blocks, .. } => *blocks,
            _ => 0,
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, Self::Found { .. })
    }
}

impl fmt::Display for RetrievalOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.clone().into_text())
    }
}

/// Result of `read_page`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageOutcome {
    /// The page was reconstructed from `chunks` rows of `partition`.
    Found {
        text: String,
        partition: Partition,
        chunks: usize,
    },
    /// No partition holds the URL.
    NotFound { url: String },
    /// No partition holds the URL and every probe failed.
    Failed { url: String, cause: String },
}

impl PageOutcome {
    /// Text handed to the agent.
    pub fn into_text(self) -> String {
        match self {
            Self::Found { text, .. } => text,
            Self::NotFound { url } | Self::Failed { url, .. } => format!("No content found for URL: {url}"),
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, Self::Found { .. })
    }
}

impl fmt::Display for PageOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.clone().into_text())
    }
}

/// Sentinel returned when retrieval produced no blocks.
pub fn not_found_message(target: &str) -> String {
    format!("No relevant documentation found for {target}.")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_and_failed_render_identically() {
        let empty = RetrievalOutcome::Empty {
            target: "electron".into(),
        };
        let failed = RetrievalOutcome::Failed {
            target: "electron".into(),
            cause: "no such table".into(),
        };
        assert_ne!(empty, failed);
        assert_eq!(
            empty.into_text(),
            "No relevant documentation found for electron."
        );
        assert_eq!(
            failed.into_text(),
            "No relevant documentation found for electron."
        );
    }

    #[test]
    fn test_found_passes_text_through() {
        let found = RetrievalOutcome::Found {
            text: "# T (Web)".into(),
            blocks: 1,
        };
        assert!(found.is_found());
        assert_eq!(found.blocks(), 1);
        assert_eq!(found.to_string(), "# T (Web)");
    }

    #[test]
    fn test_page_sentinel() {
        let outcome = PageOutcome::NotFound {
            url: "https://x.dev/missing".into(),
        };
        assert!(!outcome.is_found());
        assert_eq!(
            outcome.into_text(),
            "No content found for URL: https://x.dev/missing"
        );
    }
}
