//! Retrieval-Augmented Few-Shot Annotation Library
//!
//! Bootstrap a labeled dataset and use it to drive few-shot,
//! retrieval-augmented annotation with a language model: store labeled
//! examples in a vector-indexed record store, optionally attach generated
//! reasoning traces, retrieve the most similar examples for a new input,
//! assemble them into a synthetic conversation, and obtain a
//! model-produced label.
//!
//! # Design
//!
//! - Pluggable collaborators behind narrow traits: the library consumes a
//!   vector store and generation models, it never implements them.
//! - Explicit configuration: a missing collaborator fails project
//!   construction instead of falling back to ambient credentials.
//! - Strictly sequential execution: batch operations are ordered loops,
//!   demonstration order is preserved into the conversation, and batch
//!   prediction output order matches input order.
//! - Resumable reasoning generation: traces are persisted one record at a
//!   time, so an aborted pass keeps its progress.
//!
//! # Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use annotator::{AnnotationProject, MemoryStore, PredictOptions, ProjectConfig, Record};
//!
//! let store = Arc::new(MemoryStore::new(embedding_model));
//! let project = AnnotationProject::builder()
//!     .config(ProjectConfig::new("Decide whether the message is spam."))
//!     .store(store)
//!     .model(language_model)
//!     .build()?;
//!
//! project.add_records(vec![
//!     Record::new("Is this spam?", "yes").with_id("a"),
//!     Record::new("What's the weather?", "no").with_id("b"),
//! ]).await?;
//!
//! let labels = project.predict("Is this spam email?", PredictOptions::default()).await?;
//! ```
//!
//! # Modules
//!
//! - [`traits`] - Collaborator seams (LanguageModel, EmbeddingModel, RecordStore)
//! - [`types`] - Records, conversations, configuration
//! - [`pipeline`] - Retrieval, prompt assembly, reasoning, prediction
//! - [`stores`] - Store implementations (MemoryStore, etc.)
//! - [`import`] - Column-mapped row import and JSONL export
//! - [`testing`] - Mock collaborators for testing

pub mod error;
pub mod import;
pub mod pipeline;
pub mod project;
pub mod stores;
pub mod testing;
pub mod traits;
pub mod types;

#[cfg(feature = "openai")]
pub mod ai;

// Re-export core types at crate root
pub use error::{AnnotationError, Result};
pub use traits::{
    embedder::EmbeddingModel,
    model::LanguageModel,
    store::{cosine_similarity, RecordStore},
};
pub use types::{
    config::{
        MissingReasoning, PredictInput, PredictOptions, ProjectConfig, ReasoningOptions,
        DEFAULT_DEMONSTRATIONS,
    },
    record::{Record, Role, Turn, DEFAULT_SPLIT},
};

// Re-export the project entry point
pub use project::{AnnotationProject, AnnotationProjectBuilder};

// Re-export pipeline components
pub use pipeline::{
    predict::predict_single,
    prompt::{
        assemble_conversation, render_reasoning_prompt, validate_reasoning_template,
        DEFAULT_REASONING_PROMPT,
    },
    reasoning::{generate_reasoning, ReasoningReport},
    retrieval::retrieve_demonstrations,
};

// Re-export import helpers
pub use import::{
    read_records_jsonl, records_from_rows, write_records_jsonl, ColumnMapping, ImportOutcome, Row,
};

// Re-export stores
pub use stores::MemoryStore;

#[cfg(feature = "sqlite")]
pub use stores::SqliteStore;

#[cfg(feature = "openai")]
pub use ai::OpenAI;

// Re-export testing utilities
pub use testing::{MockEmbeddingModel, MockLanguageModel};
