//! Language model trait.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::record::Turn;

/// A text-generation model consuming a role-tagged conversation.
///
/// Implementations wrap specific providers (OpenAI, local servers, etc.)
/// and return only the generated text. Failures propagate verbatim; the
/// pipeline adds no retry or backoff masking.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Generate a completion for the conversation.
    ///
    /// The conversation is consumed in order; the final turn is the live
    /// request and everything before it is few-shot context.
    async fn generate(&self, conversation: &[Turn]) -> Result<String>;
}
