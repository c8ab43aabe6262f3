//! In-memory record store for testing and development.

use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use indexmap::IndexMap;
use tracing::warn;
use uuid::Uuid;

use crate::error::{AnnotationError, Result};
use crate::traits::embedder::EmbeddingModel;
use crate::traits::store::{cosine_similarity, RecordStore};
use crate::types::record::Record;

/// In-memory vector-indexed record collection.
///
/// Owns its embedding collaborator: record inputs are embedded on insert
/// and update, query text on retrieval. Data is lost on restart; use a
/// persistent backend for anything beyond tests and experiments.
pub struct MemoryStore {
    embedder: Arc<dyn EmbeddingModel>,
    records: RwLock<IndexMap<String, Record>>,
}

impl MemoryStore {
    /// Create an empty store around an embedding collaborator.
    pub fn new(embedder: Arc<dyn EmbeddingModel>) -> Self {
        Self {
            embedder,
            records: RwLock::new(IndexMap::new()),
        }
    }

    /// Number of stored records.
    pub fn len(&self) -> usize {
        self.records.read().unwrap().len()
    }

    /// Whether the store holds no records.
    pub fn is_empty(&self) -> bool {
        self.records.read().unwrap().is_empty()
    }

    /// Remove all records.
    pub fn clear(&self) {
        self.records.write().unwrap().clear();
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
}

#[async_trait]
impl RecordStore for MemoryStore {
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
                "records inserted without ids; assigning generated ids that are \
                 not portable source identifiers"
            );
        }

        let mut map = self.records.write().unwrap();
        for (record, embedding) in records.iter_mut().zip(embeddings) {
            let id = record
                .id
                .get_or_insert_with(|| Uuid::new_v4().to_string())
                .clone();
            record.embedding = Some(embedding);
            map.insert(id, record.clone());
        }
        Ok(())
    }

    async fn update(&self, mut records: Vec<Record>) -> Result<()> {
        if records.is_empty() {
            return Ok(());
        }
        // Reject the whole batch before touching anything.
        if records.iter().any(|r| r.id.is_none()) {
            return Err(AnnotationError::config(
                "update requires an id on every record",
            ));
        }
        Self::validate_batch(&records)?;

        let embeddings = self.embed_inputs(&records).await?;

        let mut map = self.records.write().unwrap();
        for (record, embedding) in records.iter_mut().zip(embeddings) {
            record.embedding = Some(embedding);
            let id = record.id.clone().unwrap();
            map.insert(id, record.clone());
        }
        Ok(())
    }

    async fn query(&self, text: &str, k: usize, split: &str) -> Result<Vec<Record>> {
        if k == 0 {
            return Ok(Vec::new());
        }

        let query_embedding = self.embedder.embed(text).await?;

        let map = self.records.read().unwrap();
        let mut scored: Vec<(f32, Record)> = map
            .values()
            .filter(|r| r.split == split)
            .map(|r| {
                let score = r
                    .embedding
                    .as_deref()
                    .map(|e| cosine_similarity(&query_embedding, e))
                    .unwrap_or(0.0);
                (score, r.clone())
            })
            .collect();

        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(k);

        Ok(scored
            .into_iter()
            .map(|(_, mut r)| {
                r.embedding = None;
                r
            })
            .collect())
    }

    async fn full_extraction(&self, include_embeddings: bool) -> Result<Vec<Record>> {
        let map = self.records.read().unwrap();
        Ok(map
            .values()
            .map(|r| {
                let mut record = r.clone();
                if !include_embeddings {
                    record.embedding = None;
                }
                record
            })
            .collect())
    }
}
