//! Record store trait: a named, vector-indexed collection of records.
//!
//! Any backend satisfying this contract can serve the pipeline; the core
//! never branches on backend identity. The store owns embedding: it embeds
//! `input` text through its embedding collaborator on insert, update, and
//! query, and callers never supply vectors directly.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::record::Record;

/// A vector-indexed record collection.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Insert a batch of records.
    ///
    /// Every record must carry non-empty `input` and `output`; otherwise
    /// the whole batch is rejected with a data validation error and
    /// nothing is stored. Records without an id are assigned a generated
    /// one (with a warning that generated ids are not portable source
    /// identifiers).
    async fn insert(&self, records: Vec<Record>) -> Result<()>;

    /// Upsert records by id.
    ///
    /// Every record in the call must carry an id; if any is missing the
    /// call fails with a configuration error and the store is left
    /// unchanged. Upsert without a key would be a silent-overwrite risk.
    async fn update(&self, records: Vec<Record>) -> Result<()>;

    /// Return the `k` records most similar to `text` within `split`,
    /// most-similar first. `k == 0` returns an empty list. No ordering
    /// guarantee is made among equidistant ties.
    async fn query(&self, text: &str, k: usize, split: &str) -> Result<Vec<Record>>;

    /// Return every record in the collection in its standard shape.
    /// Embedding vectors are included only when `include_embeddings` is
    /// set.
    async fn full_extraction(&self, include_embeddings: bool) -> Result<Vec<Record>>;
}

/// Cosine similarity between two vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot / (norm_a * norm_b)
}
