//! appcoder-retriever: platform documentation retrieval for code-generation agents
//!
//! This crate answers three questions an agent asks while generating an
//! application: "what does the documentation say about X", "which pages exist",
//! and "show me this page". Documentation is stored in four platform
//! partitions (web, desktop, server, mobile), each a table of embedded chunks.
//!
//! ## Key Modules
//!
//! - **[`retrieval`]**: Retrieval engine, page index and page reader
//! - **[`storage`]**: Storage abstraction layer with SQLite implementation
//! - **[`partition`]**: The fixed partition → table/label mapping
//! - **[`config`]**: TOML/environment configuration and the process context
//! - **[`status`]**: Store contents and failure counters for diagnostics
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use appcoder_retriever::config::{AppConfig, AppContext};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let context = AppContext::build(AppConfig::load(None)?).await?;
//! let engine = &context.engine;
//!
//! let docs = engine
//!     .retrieve_documentation("How do I open a window?", Some("electron"))
//!     .await;
//! let pages = engine.list_documentation_pages(None).await;
//! let page = engine.get_page_content("https://react.dev/learn").await;
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! query → ResilientEmbedder → RetrievalEngine ─┬─ one partition: similarity → scan fallback
//!                                              └─ all partitions: concurrent scans
//!                                                     ↓
//!                                   formatted blocks / not-found sentence → agent
//! ```
//!
//! The three agent-facing operations never fail: store and provider errors are
//! logged, counted in [`retrieval::PartitionHealth`], and turned into the
//! documented not-found text.

pub mod config;
pub mod partition;
pub mod retrieval;
pub mod status;
pub mod storage;
