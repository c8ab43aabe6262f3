//! Testing utilities including mock collaborators.
//!
//! Useful for testing applications built on the library without making
//! real model or embedding calls.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Duration;

use async_trait::async_trait;

use crate::error::{AnnotationError, Result};
use crate::traits::embedder::EmbeddingModel;
use crate::traits::model::LanguageModel;
use crate::types::record::Turn;

/// A scripted language model for tests.
///
/// Replies come from a queue; once exhausted, deterministic fallback
/// replies (`reply-1`, `reply-2`, ...) are generated. Every conversation
/// received is logged for assertions, and failures or latency can be
/// injected.
#[derive(Default)]
pub struct MockLanguageModel {
    replies: RwLock<VecDeque<String>>,
    conversations: RwLock<Vec<Vec<Turn>>>,
    calls: AtomicUsize,
    fail_on_call: RwLock<Option<usize>>,
    delay: RwLock<Option<Duration>>,
}

impl MockLanguageModel {
    /// Create a mock with default behavior.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a scripted reply.
    pub fn with_reply(self, reply: impl Into<String>) -> Self {
        self.replies.write().unwrap().push_back(reply.into());
        self
    }

    /// Fail the n-th call (1-based) with a model error.
    pub fn fail_on_call(self, n: usize) -> Self {
        *self.fail_on_call.write().unwrap() = Some(n);
        self
    }

    /// Sleep before every reply (for deadline tests).
    pub fn with_delay(self, delay: Duration) -> Self {
        *self.delay.write().unwrap() = Some(delay);
        self
    }

    /// Number of generate calls made.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::Relaxed)
    }

    /// Every conversation this mock has received, in call order.
    pub fn conversations(&self) -> Vec<Vec<Turn>> {
        self.conversations.read().unwrap().clone()
    }
}

#[async_trait]
impl LanguageModel for MockLanguageModel {
    async fn generate(&self, conversation: &[Turn]) -> Result<String> {
        let call = self.calls.fetch_add(1, Ordering::Relaxed) + 1;
        self.conversations
            .write()
            .unwrap()
            .push(conversation.to_vec());

        // Copy the duration out so no lock guard is held across the await.
        let delay = *self.delay.read().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if *self.fail_on_call.read().unwrap() == Some(call) {
            return Err(AnnotationError::Model(Box::new(std::io::Error::new(
                std::io::ErrorKind::ConnectionRefused,
                "mock model failure",
            ))));
        }

        Ok(self
            .replies
            .write()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| format!("reply-{}", call)))
    }
}

/// A deterministic embedding model for tests.
///
/// Preset vectors take precedence; unknown texts get a deterministic
/// hash-seeded vector, so equal texts always embed equally.
pub struct MockEmbeddingModel {
    presets: RwLock<HashMap<String, Vec<f32>>>,
    dimension: usize,
    calls: Arc<AtomicUsize>,
}

impl Default for MockEmbeddingModel {
    fn default() -> Self {
        Self::new()
    }
}

impl MockEmbeddingModel {
    /// Create a mock with a 32-dimensional fallback embedding.
    pub fn new() -> Self {
        Self {
            presets: RwLock::new(HashMap::new()),
            dimension: 32,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Set the fallback embedding dimension.
    pub fn with_dimension(mut self, dimension: usize) -> Self {
        self.dimension = dimension;
        self
    }

    /// Preset the embedding for a text.
    pub fn with_embedding(self, text: impl Into<String>, embedding: Vec<f32>) -> Self {
        self.presets.write().unwrap().insert(text.into(), embedding);
        self
    }

    /// Number of embed_batch calls made.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::Relaxed)
    }

    fn deterministic_embedding(&self, text: &str) -> Vec<f32> {
        use sha2::{Digest, Sha256};

        let mut hasher = Sha256::new();
        hasher.update(text.as_bytes());
        let hash = hasher.finalize();

        (0..self.dimension)
            .map(|i| {
                let byte = hash[i % 32] as f32;
                // Normalize to [-1, 1] range
                (byte / 127.5) - 1.0
            })
            .collect()
    }
}

#[async_trait]
impl EmbeddingModel for MockEmbeddingModel {
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        let presets = self.presets.read().unwrap();
        Ok(texts
            .iter()
            .map(|text| {
                presets
                    .get(*text)
                    .cloned()
                    .unwrap_or_else(|| self.deterministic_embedding(text))
            })
            .collect())
    }
}
