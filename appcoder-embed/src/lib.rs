//! # appcoder-embed
//!
//! Query embedding for the appcoder documentation retriever.
//!
//! The documentation tables were embedded at ingestion time with an
//! OpenAI-compatible model (`text-embedding-3-small`, 1536 dimensions). This
//! crate embeds incoming queries with the same model so they can be compared
//! against the stored vectors.
//!
//! ## Quick Start
//!
//! ```no_run
//! use appcoder_embed::{EmbedConfig, OpenAiProvider, ResilientEmbedder};
//! use std::sync::Arc;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = EmbedConfig::from_env();
//! let provider = OpenAiProvider::new(config.clone())?;
//! let embedder = ResilientEmbedder::new(Arc::new(provider), config.cache_capacity);
//!
//! // Never fails: a zero vector comes back if the API is unreachable.
//! let vector = embedder.embed("How do I use React hooks?").await;
//! assert_eq!(vector.len(), 1536);
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - [`config`]: Provider configuration and environment overlay
//! - [`provider`]: The [`EmbeddingProvider`] trait and the OpenAI-compatible HTTP provider
//! - [`resilient`]: Zero-vector fallback and query cache used by the retrieval core
//! - [`error`]: Error types and result handling
//!
//! Vectors are half precision (`f16`) throughout, matching how the store keeps them.

pub mod config;
pub mod error;
pub mod provider;
pub mod resilient;

pub use config::EmbedConfig;
pub use error::{EmbedError, Result};
pub use provider::{EmbeddingProvider, OpenAiProvider};
pub use resilient::{EmbedStats, ResilientEmbedder};
