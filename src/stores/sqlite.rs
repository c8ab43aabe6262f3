//! SQLite record store.
//!
//! A file-based backend over `sqlx`. Collections are named partitions in a
//! single `records` table and persist across process restarts. Similarity
//! is ranked in process; embeddings are stored as JSON text.

use std::sync::Arc;

use async_trait::async_trait;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use sqlx::FromRow;
use tracing::warn;
use uuid::Uuid;

use crate::error::{AnnotationError, Result};
use crate::traits::embedder::EmbeddingModel;
use crate::traits::store::{cosine_similarity, RecordStore};
use crate::types::record::Record;

/// SQLite-backed record collection.
pub struct SqliteStore {
    pool: SqlitePool,
    collection: String,
    embedder: Arc<dyn EmbeddingModel>,
}

impl SqliteStore {
    /// Open (or create) a store at the given connection URL.
    ///
    /// # Example URLs
    /// - `sqlite::memory:` - ephemeral, for testing
    /// - `sqlite:file:annotations.db?mode=rwc` - create if not exists
    pub async fn new(
        database_url: &str,
        collection: impl Into<String>,
        embedder: Arc<dyn EmbeddingModel>,
    ) -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await
            .map_err(|e| AnnotationError::Storage(Box::new(e)))?;

        let store = Self {
            pool,
            collection: collection.into(),
            embedder,
        };
        store.run_migrations().await?;
        Ok(store)
    }

    /// Create an in-memory store (for testing).
    pub async fn in_memory(
        collection: impl Into<String>,
        embedder: Arc<dyn EmbeddingModel>,
    ) -> Result<Self> {
        Self::new("sqlite::memory:", collection, embedder).await
    }

    async fn run_migrations(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS records (
                collection TEXT NOT NULL,
                id TEXT NOT NULL,
                input TEXT NOT NULL,
                output TEXT NOT NULL,
                split TEXT NOT NULL,
                reasoning TEXT,
                embedding TEXT NOT NULL,
                position INTEGER NOT NULL,
                PRIMARY KEY (collection, id)
            );

            CREATE INDEX IF NOT EXISTS idx_records_split ON records(collection, split);
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| AnnotationError::Storage(Box::new(e)))?;
        Ok(())
    }

    /// Underlying connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    fn validate_batch(records: &[Record]) -> Result<()> {
        for (i, record) in records.iter().enumerate() {
            if record.input.is_empty() {
                return Err(AnnotationError::validation(format!(
                    "record {} is missing required field 'input'",
                    i
                )));
            }
            if record.output.is_empty() {
                return Err(AnnotationError::validation(format!(
                    "record {} is missing required field 'output'",
                    i
                )));
            }
        }
        Ok(())
    }

    async fn embed_inputs(&self, records: &[Record]) -> Result<Vec<Vec<f32>>> {
        let inputs: Vec<&str> = records.iter().map(|r| r.input.as_str()).collect();
        self.embedder.embed_batch(&inputs).await
    }

    async fn next_position(&self) -> Result<i64> {
        let row: (i64,) = sqlx::query_as(
            "SELECT COALESCE(MAX(position), 0) FROM records WHERE collection = ?",
        )
        .bind(&self.collection)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AnnotationError::Storage(Box::new(e)))?;
        Ok(row.0 + 1)
    }

    async fn upsert_rows(&self, records: Vec<Record>, embeddings: Vec<Vec<f32>>) -> Result<()> {
        let base_position = self.next_position().await?;

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| AnnotationError::Storage(Box::new(e)))?;

        for (i, (record, embedding)) in records.into_iter().zip(embeddings).enumerate() {
            let embedding_json = serde_json::to_string(&embedding)?;
            sqlx::query(
                r#"
                INSERT INTO records (collection, id, input, output, split, reasoning, embedding, position)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?)
                ON CONFLICT (collection, id) DO UPDATE SET
                    input = excluded.input,
                    output = excluded.output,
                    split = excluded.split,
                    reasoning = excluded.reasoning,
                    embedding = excluded.embedding
                "#,
            )
            .bind(&self.collection)
            .bind(record.id.as_deref().unwrap_or_default())
            .bind(&record.input)
            .bind(&record.output)
            .bind(&record.split)
            .bind(record.reasoning.as_deref())
            .bind(&embedding_json)
            .bind(base_position + i as i64)
            .execute(&mut *tx)
            .await
            .map_err(|e| AnnotationError::Storage(Box::new(e)))?;
        }

        tx.commit()
            .await
            .map_err(|e| AnnotationError::Storage(Box::new(e)))
    }
}

#[derive(Debug, FromRow)]
struct RecordRow {
    id: String,
    input: String,
    output: String,
    split: String,
    reasoning: Option<String>,
    embedding: String,
}

impl RecordRow {
    fn into_record(self, include_embedding: bool) -> Result<Record> {
        let embedding = if include_embedding {
            Some(serde_json::from_str(&self.embedding)?)
        } else {
            None
        };
        Ok(Record {
            id: Some(self.id),
            input: self.input,
            output: self.output,
            split: self.split,
            reasoning: self.reasoning,
            embedding,
        })
    }
}

#[async_trait]
impl RecordStore for SqliteStore {
    async fn insert(&self, mut records: Vec<Record>) -> Result<()> {
        if records.is_empty() {
            return Ok(());
        }
        Self::validate_batch(&records)?;

        let embeddings = self.embed_inputs(&records).await?;

        let missing_ids = records.iter().filter(|r| r.id.is_none()).count();
        if missing_ids > 0 {
            warn!(
                count = missing_ids,
                collection = %self.collection,
                "records inserted without ids; assigning generated ids that are \
                 not portable source identifiers"
            );
        }
        for record in &mut records {
            record.id.get_or_insert_with(|| Uuid::new_v4().to_string());
        }

        self.upsert_rows(records, embeddings).await
    }

    async fn update(&self, records: Vec<Record>) -> Result<()> {
        if records.is_empty() {
            return Ok(());
        }
        if records.iter().any(|r| r.id.is_none()) {
            return Err(AnnotationError::config(
                "update requires an id on every record",
            ));
        }
        Self::validate_batch(&records)?;

        let embeddings = self.embed_inputs(&records).await?;
        self.upsert_rows(records, embeddings).await
    }

    async fn query(&self, text: &str, k: usize, split: &str) -> Result<Vec<Record>> {
        if k == 0 {
            return Ok(Vec::new());
        }

        let query_embedding = self.embedder.embed(text).await?;

        let rows: Vec<RecordRow> = sqlx::query_as(
            "SELECT id, input, output, split, reasoning, embedding
             FROM records WHERE collection = ? AND split = ?",
        )
        .bind(&self.collection)
        .bind(split)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AnnotationError::Storage(Box::new(e)))?;

        let mut scored = Vec::with_capacity(rows.len());
        for row in rows {
            let embedding: Vec<f32> = serde_json::from_str(&row.embedding)?;
            let score = cosine_similarity(&query_embedding, &embedding);
            scored.push((score, row.into_record(false)?));
        }

        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(k);

        Ok(scored.into_iter().map(|(_, r)| r).collect())
    }

    async fn full_extraction(&self, include_embeddings: bool) -> Result<Vec<Record>> {
        let rows: Vec<RecordRow> = sqlx::query_as(
            "SELECT id, input, output, split, reasoning, embedding
             FROM records WHERE collection = ? ORDER BY position",
        )
        .bind(&self.collection)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AnnotationError::Storage(Box::new(e)))?;

        rows.into_iter()
            .map(|row| row.into_record(include_embeddings))
            .collect()
    }
}
