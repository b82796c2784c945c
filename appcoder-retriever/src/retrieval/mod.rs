//! The retrieval core.
//!
//! - [`engine`]: query embedding, single partition and fan-out retrieval
//! - [`page_index`]: listing of stored pages
//! - [`page_reader`]: whole-page reconstruction
//! - [`format`]: text rendering of blocks and pages
//! - [`outcome`]: typed results collapsed to text at the tool boundary
//! - [`health`]: counters for failures the operations swallow

pub mod engine;
pub mod format;
pub mod health;
pub mod outcome;
pub mod page_index;
pub mod page_reader;

pub use engine::{RetrievalEngine, RetrievalRequest, RetrievalSettings};
pub use health::{HealthSnapshot, PartitionHealth, PartitionHealthSnapshot};
pub use outcome::{PageOutcome, RetrievalOutcome, not_found_message};
