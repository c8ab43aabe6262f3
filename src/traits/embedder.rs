//! Embedding model trait.

use async_trait::async_trait;

use crate::error::Result;

/// A model mapping texts to dense vectors for similarity search.
#[async_trait]
pub trait EmbeddingModel: Send + Sync {
    /// Generate embeddings for multiple texts, one vector per text, in
    /// input order.
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>>;

    /// Generate an embedding for a single text.
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut vectors = self.embed_batch(&[text]).await?;
        Ok(vectors.pop().unwrap_or_default())
    }
}
