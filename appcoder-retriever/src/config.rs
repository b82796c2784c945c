//! Process configuration and the context built from it.
//!
//! Configuration is a TOML file, every section optional:
//!
//! ```toml
//! database_path = "docs.db"
//!
//! [embedding]
//! model = "text-embedding-3-small"
//! dimension = 1536
//!
//! [retrieval]
//! ranked_limit = 5
//! fanout_limit = 2
//!
//! [partitions.mobile]
//! table = "native_script_pages"
//! similarity_index = false
//! ```
//!
//! Environment variables override the file: `APPCODER_DB` for the database
//! path, plus the embedding variables read by [`EmbedConfig::apply_env`].

use crate::partition::{Partition, PartitionError, PartitionMap, PartitionOverride};
use crate::retrieval::{RetrievalEngine, RetrievalSettings};
use crate::storage::StoreError;
use crate::storage::sqlite_store::SqliteDocStore;
use appcoder_embed::{EmbedConfig, EmbedError, OpenAiProvider, ResilientEmbedder};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// Database file used when neither the config file nor the environment names one.
pub const DEFAULT_DATABASE_PATH: &str = "appcoder-docs.db";

/// Config file picked up from the working directory when no path is given.
pub const DEFAULT_CONFIG_FILE: &str = "appcoder.toml";

/// Errors loading configuration or building the context from it.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid retrieval settings: {0}")]
    InvalidSettings(String),

    #[error(transparent)]
    Partition(#[from] PartitionError),

    #[error(transparent)]
    Embed(#[from] EmbedError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Top level configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// SQLite file holding the partition tables
    pub database_path: PathBuf,
    pub embedding: EmbedConfig,
    pub retrieval: RetrievalSettings,
    /// Per-partition table, label and similarity overrides
    pub partitions: BTreeMap<Partition, PartitionOverride>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from(DEFAULT_DATABASE_PATH),
            embedding: EmbedConfig::default(),
            retrieval: RetrievalSettings::default(),
            partitions: BTreeMap::new(),
        }
    }
}

impl AppConfig {
    /// Load configuration from `path`, or from [`DEFAULT_CONFIG_FILE`] if it
    /// exists, then overlay the process environment.
    ///
    /// An explicit path that cannot be read is an error; a missing default
    /// file just means defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config = match path {
            Some(path) => Self::from_file(path)?,
            None => {
                let default = Path::new(DEFAULT_CONFIG_FILE);
                if default.is_file() {
                    Self::from_file(default)?
                } else {
                    debug!("No {} found, using defaults", DEFAULT_CONFIG_FILE);
                    Self::default()
                }
            }
        };
        Ok(config.apply_env(|key| std::env::var(key).ok()))
    }

    /// Parse a config file without consulting the environment.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Overlay values from an environment lookup.
    pub fn apply_env<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(db) = lookup("APPCODER_DB").filter(|v| !v.trim().is_empty()) {
            self.database_path = PathBuf::from(db);
        }
        self.embedding = self.embedding.apply_env(lookup);
        self
    }

    /// Set the database path (builder style)
    pub fn with_database_path<P: Into<PathBuf>>(self, database_path: P) -> Self {
        Self {
            database_path: database_path.into(),
            ..self
        }
    }

    /// The partition map: defaults plus the configured overrides.
    pub fn partition_map(&self) -> Result<PartitionMap, ConfigError> {
        Ok(PartitionMap::with_overrides(
            self.partitions.iter().map(|(p, o)| (*p, o)),
        )?)
    }

    /// Check values that would make every retrieval come back empty.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.retrieval.ranked_limit == 0 {
            return Err(ConfigError::InvalidSettings(
                "ranked_limit must be positive".into(),
            ));
        }
        if self.retrieval.fanout_limit == 0 {
            return Err(ConfigError::InvalidSettings(
                "fanout_limit must be positive".into(),
            ));
        }
        self.embedding.validate()?;
        Ok(())
    }
}

/// Everything a process needs to serve retrieval requests, built once at
/// start-up and passed to whoever needs it.
#[derive(Debug, Clone)]
pub struct AppContext {
    pub config: AppConfig,
    pub store: SqliteDocStore,
    pub engine: RetrievalEngine,
}

impl AppContext {
    /// Open the configured database and wire the engine to it.
    pub async fn build(config: AppConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let partitions = config.partition_map()?;
        info!("Opening documentation store at {}", config.database_path.display());
        let store = SqliteDocStore::open(&config.database_path, partitions).await?;
        Self::with_store(config, store)
    }

    /// Wire the engine to an already opened store.
    pub fn with_store(config: AppConfig, store: SqliteDocStore) -> Result<Self, ConfigError> {
        let provider = OpenAiProvider::new(config.embedding.clone())?;
        if config.embedding.api_key.is_none() {
            tracing::warn!("No embedding API key configured; queries will embed to zero vectors");
        }
        let embedder = Arc::new(ResilientEmbedder::new(
            Arc::new(provider),
            config.embedding.cache_capacity,
        ));
        let engine = RetrievalEngine::new(
            Arc::new(store.clone()),
            embedder,
            store.partitions().clone(),
            config.retrieval,
        );
        Ok(Self {
            config,
            store,
            engine,
        })
    }
}
