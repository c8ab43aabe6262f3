//! The record data model and conversation types.

use serde::{Deserialize, Serialize};

/// One labeled annotation example.
///
/// `input` is the text that gets embedded for similarity search; `output`
/// is the gold label. The embedding is derived from `input` by the record
/// store and is never set directly by callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Unique id within a collection. Assigned by the store when absent
    /// at insert time; the sole key for updates.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// The example text. Required.
    pub input: String,

    /// The gold label/text. Required.
    pub output: String,

    /// Partition label (e.g. train/val/test). Always set after insertion.
    pub split: String,

    /// Generated or imported reasoning trace explaining the gold output.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<String>,

    /// Vector derived from `input`. Owned by the store; populated on
    /// extraction only when explicitly requested.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f32>>,
}

/// Default split label used when source data carries none.
pub const DEFAULT_SPLIT: &str = "train";

impl Record {
    /// Create a record in the default split.
    pub fn new(input: impl Into<String>, output: impl Into<String>) -> Self {
        Self {
            id: None,
            input: input.into(),
            output: output.into(),
            split: DEFAULT_SPLIT.to_string(),
            reasoning: None,
            embedding: None,
        }
    }

    /// Set the id.
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Set the split.
    pub fn with_split(mut self, split: impl Into<String>) -> Self {
        self.split = split.into();
        self
    }

    /// Attach a reasoning trace.
    pub fn with_reasoning(mut self, reasoning: impl Into<String>) -> Self {
        self.reasoning = Some(reasoning.into());
        self
    }

    /// Whether the record carries a reasoning trace.
    pub fn has_reasoning(&self) -> bool {
        self.reasoning.is_some()
    }
}

/// Speaker of a conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One role-tagged turn of a synthetic conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub content: String,
}

impl Turn {
    /// Create a user turn.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    /// Create an assistant turn.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_builder() {
        let record = Record::new("Is this spam?", "yes")
            .with_id("a")
            .with_split("val")
            .with_reasoning("Unsolicited bulk wording.");

        assert_eq!(record.id.as_deref(), Some("a"));
        assert_eq!(record.split, "val");
        assert!(record.has_reasoning());
        assert!(record.embedding.is_none());
    }

    #[test]
    fn test_record_defaults_to_train_split() {
        let record = Record::new("x", "y");
        assert_eq!(record.split, DEFAULT_SPLIT);
    }

    #[test]
    fn test_turn_role_serialization() {
        let turn = Turn::user("hello");
        let json = serde_json::to_value(&turn).unwrap();
        assert_eq!(json["role"], "user");
        assert_eq!(json["content"], "hello");
    }
}
