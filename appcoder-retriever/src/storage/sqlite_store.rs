//! SQLite implementation of the documentation store.
//!
//! Each partition is its own table, laid out the way the ingestion pipeline
//! writes it:
//!
//! ```sql
//! CREATE TABLE react_pages (
//!     id INTEGER PRIMARY KEY AUTOINCREMENT,
//!     url TEXT NOT NULL,
//!     chunk_number INTEGER NOT NULL,     -- zero-based position in the page
//!     title TEXT NOT NULL,
//!     summary TEXT NOT NULL DEFAULT '',
//!     content TEXT NOT NULL,
//!     metadata TEXT NOT NULL DEFAULT '{}',  -- JSON
//!     embedding BLOB,                    -- f16 vector, native endian
//!     created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
//!     UNIQUE(url, chunk_number)
//! );
//! ```
//!
//! Similarity is computed in process: every embedded row of the partition is
//! scored by cosine similarity against the query and the best `limit` are
//! returned, with rows that carry no embedding ranked after all of them.
//! Store-native order for unranked scans is insertion order. A malformed row
//! (negative `chunk_number`, odd-length embedding blob) is logged and skipped
//! rather than failing the read of its partition.

use super::{DocumentChunk, DocumentStore, Result, ScoredChunk, StoreError, cosine_similarity};
use crate::partition::{Partition, PartitionMap};
use async_trait::async_trait;
use half::f16;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow};
use sqlx::{Row, SqlitePool};
use std::path::Path;
use std::time::Duration;

const COLUMNS: &str = "url, chunk_number, title, summary, content, metadata";

/// SQLite-backed [`DocumentStore`] with one table per partition.
#[derive(Clone, Debug)]
pub struct SqliteDocStore {
    pool: SqlitePool,
    partitions: PartitionMap,
}

impl SqliteDocStore {
    /// Opens (creating if needed) a database file and ensures every partition table exists.
    pub async fn open(path: &Path, partitions: PartitionMap) -> Result<Self> {
        let pool = SqlitePool::connect_with(
            SqliteConnectOptions::new()
                .filename(path)
                .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
                .synchronous(sqlx::sqlite::SqliteSynchronous::Normal)
                .busy_timeout(Duration::from_secs(5))
                .create_if_missing(true),
        )
        .await?;
        Self::new_with_pool(pool, partitions).await
    }

    /// Opens an in-memory database for testing.
    ///
    /// The pool holds a single connection that never expires, so every query
    /// sees the same memory database.
    pub async fn open_memory(partitions: PartitionMap) -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await?;
        Self::new_with_pool(pool, partitions).await
    }

    async fn new_with_pool(pool: SqlitePool, partitions: PartitionMap) -> Result<Self> {
        let store = Self { pool, partitions };
        store.create_tables().await?;
        Ok(store)
    }

    /// Underlying connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Partition configuration this store was opened with.
    pub fn partitions(&self) -> &PartitionMap {
        &self.partitions
    }

    async fn create_tables(&self) -> Result<()> {
        for (partition, spec) in self.partitions.iter() {
            let table = &spec.table;
            sqlx::query(&format!(
                r#"
                CREATE TABLE IF NOT EXISTS {table} (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    url TEXT NOT NULL,
                    chunk_number INTEGER NOT NULL,
                    title TEXT NOT NULL,
                    summary TEXT NOT NULL DEFAULT '',
                    content TEXT NOT NULL,
                    metadata TEXT NOT NULL DEFAULT '{{}}',
                    embedding BLOB,
                    created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
                    UNIQUE(url, chunk_number)
                )
                "#
            ))
            .execute(&self.pool)
            .await?;

            sqlx::query(&format!(
                "CREATE INDEX IF NOT EXISTS idx_{table}_url ON {table}(url)"
            ))
            .execute(&self.pool)
            .await?;

            tracing::debug!("Ensured table {} for partition {}", table, partition);
        }
        Ok(())
    }

    /// Inserts or replaces chunks of one partition in a single transaction.
    ///
    /// This is the ingestion write path; the retrieval core never calls it.
    pub async fn upsert_chunks(&self, partition: Partition, chunks: &[DocumentChunk]) -> Result<usize> {
        let table = self.partitions.table(partition);
        let sql = format!(
            r#"
            INSERT INTO {table} (url, chunk_number, title, summary, content, metadata, embedding)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            ON CONFLICT(url, chunk_number) DO UPDATE SET
                title = excluded.title,
                summary = excluded.summary,
                content = excluded.content,
                metadata = excluded.metadata,
                embedding = excluded.embedding
            "#
        );

        let mut tx = self.pool.begin().await?;
        for chunk in chunks {
            let metadata = serde_json::to_string(&chunk.metadata)?;
            let embedding_bytes = chunk
                .embedding
                .as_ref()
                .map(|e| bytemuck::cast_slice::<f16, u8>(e));

            sqlx::query(&sql)
                .bind(&chunk.url)
                .bind(i64::from(chunk.chunk_index))
                .bind(&chunk.title)
                .bind(&chunk.summary)
                .bind(&chunk.content)
                .bind(metadata)
                .bind(embedding_bytes)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;

        tracing::debug!("Upserted {} chunks into {}", chunks.len(), table);
        Ok(chunks.len())
    }

    /// Decode fetched rows, skipping individual malformed records.
    ///
    /// Column access errors still fail the whole read.
    fn decode_rows(
        table: &str,
        rows: &[SqliteRow],
        with_embedding: bool,
    ) -> Result<Vec<DocumentChunk>> {
        let mut chunks = Vec::with_capacity(rows.len());
        for row in rows {
            match Self::row_to_chunk(row, with_embedding) {
                Ok(chunk) => chunks.push(chunk),
                Err(StoreError::InvalidRecord(reason)) => {
                    tracing::warn!("Skipping malformed row in {}: {}", table, reason);
                }
                Err(e) => return Err(e),
            }
        }
        Ok(chunks)
    }

    fn row_to_chunk(row: &SqliteRow, with_embedding: bool) -> Result<DocumentChunk> {
        let url: String = row.try_get("url")?;
        let chunk_number: i64 = row.try_get("chunk_number")?;
        let chunk_index = u32::try_from(chunk_number).map_err(|_| {
            StoreError::InvalidRecord(format!("chunk_number {chunk_number} out of range for {url}"))
        })?;
        let metadata: String = row.try_get("metadata")?;
        // Metadata is opaque to the core; keep unparseable values as raw text.
        let metadata = serde_json::from_str(&metadata).unwrap_or(serde_json::Value::String(metadata));

        let embedding = if with_embedding {
            let bytes: Option<Vec<u8>> = row.try_get("embedding")?;
            bytes.map(|b| decode_embedding(&b)).transpose()?
        } else {
            None
        };

        Ok(DocumentChunk {
            url,
            chunk_index,
            title: row.try_get("title")?,
            summary: row.try_get("summary")?,
            content: row.try_get("content")?,
            metadata,
            embedding,
        })
    }
}

fn decode_embedding(bytes: &[u8]) -> Result<Vec<f16>> {
    if bytes.len() % 2 != 0 {
        return Err(StoreError::InvalidRecord(format!(
            "embedding blob of {} bytes is not a f16 vector",
            bytes.len()
        )));
    }
    Ok(bytes
        .chunks_exact(2)
        .map(|pair| f16::from_ne_bytes([pair[0], pair[1]]))
        .collect())
}

#[async_trait]
impl DocumentStore for SqliteDocStore {
    fn supports_similarity(&self, partition: Partition) -> bool {
        self.partitions.spec(partition).similarity_index
    }

    async fn similarity_search(
        &self,
        partition: Partition,
        query: &[f16],
        limit: usize,
    ) -> Result<Vec<ScoredChunk>> {
        if !self.supports_similarity(partition) {
            return Err(StoreError::SimilarityUnavailable(partition));
        }

        let table = self.partitions.table(partition);
        let rows = sqlx::query(&format!(
            "SELECT {COLUMNS}, embedding FROM {table} ORDER BY id"
        ))
        .fetch_all(&self.pool)
        .await?;

        let mut scored = Vec::with_capacity(rows.len());
        let mut unembedded = Vec::new();
        for mut chunk in Self::decode_rows(table, &rows, true)? {
            match chunk.embedding.take() {
                Some(embedding) => scored.push(ScoredChunk {
                    similarity: cosine_similarity(query, &embedding),
                    chunk,
                }),
                None => unembedded.push(ScoredChunk {
                    chunk,
                    similarity: 0.0,
                }),
            }
        }

        // Stable sort keeps insertion order among equal scores. Rows without
        // an embedding rank after every embedded row.
        scored.sort_by(|a, b| {
            b.similarity
                .partial_cmp(&a.similarity)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        scored.extend(unembedded);
        scored.truncate(limit);
        Ok(scored)
    }

    async fn scan(&self, partition: Partition, limit: Option<usize>) -> Result<Vec<DocumentChunk>> {
        let table = self.partitions.table(partition);
        // SQLite treats a negative LIMIT as unbounded.
        let limit = limit.map_or(-1, |l| i64::try_from(l).unwrap_or(i64::MAX));
        let rows = sqlx::query(&format!("SELECT {COLUMNS} FROM {table} ORDER BY id LIMIT ?1"))
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;
        Self::decode_rows(table, &rows, false)
    }

    async fn scan_by_url(&self, partition: Partition, url: &str) -> Result<Vec<DocumentChunk>> {
        let table = self.partitions.table(partition);
        let rows = sqlx::query(&format!(
            "SELECT {COLUMNS} FROM {table} WHERE url = ?1 ORDER BY chunk_number"
        ))
        .bind(url)
        .fetch_all(&self.pool)
        .await?;
        Self::decode_rows(table, &rows, false)
    }

    async fn list_urls(&self, partition: Partition) -> Result<Vec<String>> {
        let table = self.partitions.table(partition);
        let urls = sqlx::query_scalar::<_, String>(&format!("SELECT url FROM {table} ORDER BY id"))
            .fetch_all(&self.pool)
            .await?;
        Ok(urls)
    }

    async fn count_rows(&self, partition: Partition) -> Result<usize> {
        let table = self.partitions.table(partition);
        let count = sqlx::query_scalar::<_, i64>(&format!("SELECT COUNT(*) FROM {table}"))
            .fetch_one(&self.pool)
            .await?;
        Ok(usize::try_from(count).unwrap_or(0))
    }
}
