//! Core trait abstractions.
//!
//! The pipeline consumes its collaborators through these narrow seams:
//! - [`model::LanguageModel`] - conversation in, one string out
//! - [`embedder::EmbeddingModel`] - texts in, vectors out
//! - [`store::RecordStore`] - vector-indexed record collection

pub mod embedder;
pub mod model;
pub mod store;
