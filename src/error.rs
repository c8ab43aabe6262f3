//! Typed errors for the annotation library.
//!
//! Uses `thiserror` for library errors (not `anyhow`) to provide
//! strongly-typed, composable error handling.

use thiserror::Error;

/// Errors that can occur during annotation operations.
#[derive(Debug, Error)]
pub enum AnnotationError {
    /// Missing or invalid configuration: absent collaborator, update
    /// without ids, or an invalid reasoning prompt template.
    #[error("configuration error: {reason}")]
    Config { reason: String },

    /// Import data is missing a required field mapping.
    #[error("data validation error: {reason}")]
    DataValidation { reason: String },

    /// Prediction input is not a supported shape.
    #[error("unsupported input type: {reason}")]
    InputType { reason: String },

    /// Language model collaborator failed.
    #[error("model error: {0}")]
    Model(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Embedding model collaborator failed.
    #[error("embedding error: {0}")]
    Embedding(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Storage backend failed.
    #[error("storage error: {0}")]
    Storage(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// A collaborator call exceeded its deadline.
    #[error("call timed out after {millis}ms")]
    Timeout { millis: u64 },

    /// Operation was cancelled.
    #[error("operation cancelled")]
    Cancelled,

    /// File I/O failed (import/export).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl AnnotationError {
    /// Shorthand for a configuration error.
    pub fn config(reason: impl Into<String>) -> Self {
        Self::Config {
            reason: reason.into(),
        }
    }

    /// Shorthand for a data validation error.
    pub fn validation(reason: impl Into<String>) -> Self {
        Self::DataValidation {
            reason: reason.into(),
        }
    }

    /// Whether the operation may succeed if retried by the caller.
    ///
    /// Only deadline expiry qualifies; collaborator failures propagate
    /// verbatim and are never retried by the library.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

/// Result type alias for annotation operations.
pub type Result<T> = std::result::Result<T, AnnotationError>;
