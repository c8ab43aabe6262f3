//! Configuration and option types for the annotation pipeline.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::error::{AnnotationError, Result};
use crate::types::record::DEFAULT_SPLIT;

/// Number of demonstrations retrieved when the caller does not say otherwise.
pub const DEFAULT_DEMONSTRATIONS: i64 = 3;

/// Immutable per-project settings.
///
/// Constructed once when the project is built; collaborator references
/// (models, store) live on the project itself and are validated there.
#[derive(Debug, Clone)]
pub struct ProjectConfig {
    /// Fixed instruction text prefixed to every user turn.
    pub task_description: String,

    /// Name of the store collection this project operates on.
    pub collection: String,

    /// Split assigned to imported rows that carry none.
    pub default_split: String,
}

impl ProjectConfig {
    /// Create a config with the given task description.
    pub fn new(task_description: impl Into<String>) -> Self {
        Self {
            task_description: task_description.into(),
            collection: "default".to_string(),
            default_split: DEFAULT_SPLIT.to_string(),
        }
    }

    /// Set the collection name.
    pub fn with_collection(mut self, collection: impl Into<String>) -> Self {
        self.collection = collection.into();
        self
    }

    /// Set the default split for imported rows.
    pub fn with_default_split(mut self, split: impl Into<String>) -> Self {
        self.default_split = split.into();
        self
    }
}

/// What to do when prediction requests reasoning but no reasoning traces
/// have been generated yet.
///
/// Replaces interactive terminal prompts: the decision is either pre-set
/// or delegated to a caller-supplied callback invoked synchronously.
#[derive(Clone, Default)]
pub enum MissingReasoning {
    /// Proceed without reasoning for this call (with a warning).
    #[default]
    Disable,

    /// Run a full reasoning-generation pass first.
    Generate,

    /// Ask the caller; `true` means generate first, `false` means proceed
    /// without reasoning.
    Confirm(Arc<dyn Fn() -> bool + Send + Sync>),
}

impl fmt::Debug for MissingReasoning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disable => write!(f, "Disable"),
            Self::Generate => write!(f, "Generate"),
            Self::Confirm(_) => write!(f, "Confirm(..)"),
        }
    }
}

/// Options for a prediction call.
#[derive(Debug, Clone)]
pub struct PredictOptions {
    /// How many demonstrations to retrieve. Zero or negative retrieves
    /// none (negative values additionally log a warning).
    pub number_demonstrations: i64,

    /// Include reasoning traces in demonstration turns.
    pub use_reasoning: bool,

    /// Split demonstrations are drawn from.
    pub split: String,

    /// Per-collaborator-call deadline. `None` means no deadline.
    pub timeout: Option<Duration>,

    /// Cooperative cancellation for the whole call.
    pub cancel: Option<CancellationToken>,

    /// Policy when reasoning is requested but unavailable.
    pub missing_reasoning: MissingReasoning,
}

impl Default for PredictOptions {
    fn default() -> Self {
        Self {
            number_demonstrations: DEFAULT_DEMONSTRATIONS,
            use_reasoning: false,
            split: DEFAULT_SPLIT.to_string(),
            timeout: None,
            cancel: None,
            missing_reasoning: MissingReasoning::default(),
        }
    }
}

impl PredictOptions {
    /// Create options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the number of demonstrations.
    pub fn with_demonstrations(mut self, k: i64) -> Self {
        self.number_demonstrations = k;
        self
    }

    /// Enable reasoning-augmented demonstrations.
    pub fn with_reasoning(mut self) -> Self {
        self.use_reasoning = true;
        self
    }

    /// Set the demonstration split.
    pub fn with_split(mut self, split: impl Into<String>) -> Self {
        self.split = split.into();
        self
    }

    /// Set a per-call deadline.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Attach a cancellation token.
    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = Some(cancel);
        self
    }

    /// Set the missing-reasoning policy.
    pub fn on_missing_reasoning(mut self, policy: MissingReasoning) -> Self {
        self.missing_reasoning = policy;
        self
    }
}

/// Options for a reasoning-generation pass.
#[derive(Debug, Clone)]
pub struct ReasoningOptions {
    /// Custom prompt template with `{task_description}`, `{input}` and
    /// `{output}` placeholders. `None` uses the built-in template.
    pub prompt_template: Option<String>,

    /// Splits eligible for generation.
    pub splits: Vec<String>,

    /// Regenerate reasoning for records that already have one.
    pub overwrite: bool,

    /// Per-model-call deadline.
    pub timeout: Option<Duration>,

    /// Cooperative cancellation for the whole pass.
    pub cancel: Option<CancellationToken>,
}

impl Default for ReasoningOptions {
    fn default() -> Self {
        Self {
            prompt_template: None,
            splits: vec![DEFAULT_SPLIT.to_string()],
            overwrite: false,
            timeout: None,
            cancel: None,
        }
    }
}

impl ReasoningOptions {
    /// Create options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a custom prompt template.
    pub fn with_template(mut self, template: impl Into<String>) -> Self {
        self.prompt_template = Some(template.into());
        self
    }

    /// Set the eligible splits.
    pub fn with_splits(mut self, splits: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.splits = splits.into_iter().map(|s| s.into()).collect();
        self
    }

    /// Regenerate existing reasoning.
    pub fn with_overwrite(mut self) -> Self {
        self.overwrite = true;
        self
    }

    /// Set a per-call deadline.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Attach a cancellation token.
    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = Some(cancel);
        self
    }
}

/// Shape of a prediction request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PredictInput {
    /// Predict over the default validation split. Reserved: currently
    /// yields no predictions.
    DefaultSplit,

    /// One input, one prediction.
    Single(String),

    /// Sequential per-item prediction preserving input order.
    Batch(Vec<String>),
}

impl From<&str> for PredictInput {
    fn from(input: &str) -> Self {
        Self::Single(input.to_string())
    }
}

impl From<String> for PredictInput {
    fn from(input: String) -> Self {
        Self::Single(input)
    }
}

impl From<Vec<String>> for PredictInput {
    fn from(inputs: Vec<String>) -> Self {
        Self::Batch(inputs)
    }
}

impl From<Vec<&str>> for PredictInput {
    fn from(inputs: Vec<&str>) -> Self {
        Self::Batch(inputs.into_iter().map(String::from).collect())
    }
}

impl TryFrom<serde_json::Value> for PredictInput {
    type Error = AnnotationError;

    /// Convert loosely-typed input (e.g. deserialized request payloads)
    /// into a prediction shape. Anything other than null, a string, or an
    /// array of strings is rejected.
    fn try_from(value: serde_json::Value) -> Result<Self> {
        match value {
            serde_json::Value::Null => Ok(Self::DefaultSplit),
            serde_json::Value::String(s) => Ok(Self::Single(s)),
            serde_json::Value::Array(items) => {
                let mut inputs = Vec::with_capacity(items.len());
                for item in items {
                    match item {
                        serde_json::Value::String(s) => inputs.push(s),
                        other => {
                            return Err(AnnotationError::InputType {
                                reason: format!("list items must be strings, got {}", other),
                            })
                        }
                    }
                }
                Ok(Self::Batch(inputs))
            }
            other => Err(AnnotationError::InputType {
                reason: format!("expected null, string, or list of strings, got {}", other),
            }),
        }
    }
}
