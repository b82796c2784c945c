//! # appcoder-mcp
//!
//! A Model Context Protocol (MCP) server exposing the appcoder documentation
//! retriever to code-generation agents. Agents call it while writing web,
//! desktop, server and mobile applications to pull in the relevant React,
//! Electron, Node.js and NativeScript documentation.
//!
//! ## Architecture
//!
//! The server is a thin adapter over two crates:
//! - [`appcoder-retriever`] for the partitioned documentation store and the retrieval engine
//! - [`appcoder-embed`] for embedding queries
//!
//! ## Quick Start
//!
//! ### 1. Load documentation
//! ```bash
//! # Import ingestion records into a partition
//! appcoder-retriever import react.jsonl --platform web
//! ```
//!
//! ### 2. Start the MCP server
//! ```bash
//! appcoder-mcp --config appcoder.toml
//! ```
//!
//! ### 3. Use as a library
//! ```no_run
//! use appcoder_mcp::{ServerConfig, run_server};
//! use std::path::PathBuf;
//!
//! # async fn example() -> anyhow::Result<()> {
//! run_server(ServerConfig::new(Some(PathBuf::from("appcoder.toml")))).await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## MCP Tools
//!
//! ### `retrieve_relevant_documentation`
//! Up to five ranked blocks from one platform, or two unranked blocks from
//! each platform when none (or an unknown one) is named.
//!
//! ### `list_documentation_pages`
//! Sorted, duplicate-free `"Label: url"` entries.
//!
//! ### `get_page_content`
//! A whole page reassembled from its chunks.
//!
//! ### `status`
//! Rows and pages per platform, swallowed-failure counters, embedding statistics.
//!
//! None of the tools report errors: store and provider failures end up in
//! the logs and the `status` counters, and the agent gets the documented
//! not-found text.
//!
//! ## Integration with Claude Desktop
//!
//! ```json
//! {
//!   "mcpServers": {
//!     "appcoder-docs": {
//!       "command": "appcoder-mcp",
//!       "args": ["--config", "/path/to/appcoder.toml"]
//!     }
//!   }
//! }
//! ```

mod server;
pub mod tools;

pub use server::DocsMcpServer;

use anyhow::Result;
use appcoder_retriever::config::{AppConfig, AppContext};
use std::path::PathBuf;
use tracing::info;

/// Configuration for the appcoder MCP server.
#[derive(Debug, Clone, Default)]
pub struct ServerConfig {
    /// Configuration file; `appcoder.toml` in the working directory when absent
    pub config_path: Option<PathBuf>,
    /// Database file overriding the configuration
    pub database: Option<PathBuf>,
}

impl ServerConfig {
    pub fn new(config_path: Option<PathBuf>) -> Self {
        Self {
            config_path,
            database: None,
        }
    }

    /// Set the database override (builder style)
    pub fn with_database(self, database: PathBuf) -> Self {
        Self {
            database: Some(database),
            ..self
        }
    }

    /// Resolve the retriever configuration this server runs with.
    pub fn app_config(&self) -> Result<AppConfig> {
        let mut config = AppConfig::load(self.config_path.as_deref())?;
        if let Some(database) = &self.database {
            config = config.with_database_path(database.clone());
        }
        Ok(config)
    }
}

/// Run the appcoder MCP server over stdio until the client disconnects.
///
/// # Errors
/// - Configuration that cannot be read or is invalid
/// - A database that cannot be opened
/// - MCP transport failures
pub async fn run_server(config: ServerConfig) -> Result<()> {
    info!("Starting appcoder MCP server");

    let context = AppContext::build(config.app_config()?).await?;
    info!(
        "Documentation store opened at {}",
        context.config.database_path.display()
    );

    DocsMcpServer::new(context.engine).serve_stdio().await
}
