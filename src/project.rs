//! The annotation project - main entry point for the library.
//!
//! An [`AnnotationProject`] ties together the record store and the
//! reasoning/annotation models behind one immutable configuration. All
//! collaborators are explicit: construction fails fast when one is
//! missing rather than silently substituting a hosted default that would
//! depend on ambient credentials.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use annotator::{AnnotationProject, MemoryStore, PredictOptions, ProjectConfig, Record};
//!
//! let store = Arc::new(MemoryStore::new(embedder));
//! let project = AnnotationProject::builder()
//!     .config(ProjectConfig::new("Decide whether the message is spam."))
//!     .store(store)
//!     .model(model)
//!     .build()?;
//!
//! project.add_records(vec![Record::new("Is this spam?", "yes")]).await?;
//! let labels = project.predict("Is this spam email?", PredictOptions::default()).await?;
//! ```

use std::fmt;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::error::{AnnotationError, Result};
use crate::import::{records_from_rows, write_records_jsonl, ColumnMapping, Row};
use crate::pipeline::predict::predict_single;
use crate::pipeline::reasoning::{generate_reasoning, ReasoningReport};
use crate::traits::model::LanguageModel;
use crate::traits::store::RecordStore;
use crate::types::config::{
    MissingReasoning, PredictInput, PredictOptions, ProjectConfig, ReasoningOptions,
};
use crate::types::record::Record;

/// A retrieval-augmented annotation project.
pub struct AnnotationProject {
    config: ProjectConfig,
    store: Arc<dyn RecordStore>,
    reasoning_model: Arc<dyn LanguageModel>,
    annotation_model: Arc<dyn LanguageModel>,
    reasoning_available: AtomicBool,
}

impl AnnotationProject {
    /// Start building a project.
    pub fn builder() -> AnnotationProjectBuilder {
        AnnotationProjectBuilder::default()
    }

    /// Project configuration.
    pub fn config(&self) -> &ProjectConfig {
        &self.config
    }

    /// Whether reasoning traces are available for prediction.
    ///
    /// Set by a completed reasoning-generation pass, or by importing rows
    /// that already carry reasoning.
    pub fn reasoning_available(&self) -> bool {
        self.reasoning_available.load(Ordering::Relaxed)
    }

    /// Insert labeled records into the store.
    pub async fn add_records(&self, records: Vec<Record>) -> Result<()> {
        let count = records.len();
        self.store.insert(records).await?;
        info!(count, collection = %self.config.collection, "added records");
        Ok(())
    }

    /// Import column-mapped rows and insert the resulting records.
    ///
    /// Rows missing the input or output mapping reject the whole batch.
    /// When the rows carry reasoning, the project's reasoning-available
    /// flag follows them. Returns the number of records inserted.
    pub async fn import_rows(&self, rows: &[Row], mapping: &ColumnMapping) -> Result<usize> {
        let outcome = records_from_rows(rows, mapping, &self.config.default_split)?;
        let count = outcome.records.len();
        self.store.insert(outcome.records).await?;
        self.reasoning_available
            .store(outcome.reasoning_present, Ordering::Relaxed);
        info!(count, collection = %self.config.collection, "imported rows");
        Ok(count)
    }

    /// All records in the collection, in their standard shape.
    pub async fn records(&self, include_embeddings: bool) -> Result<Vec<Record>> {
        self.store.full_extraction(include_embeddings).await
    }

    /// Serialize the collection to a JSON Lines file.
    pub async fn export_records(&self, path: &Path, include_embeddings: bool) -> Result<()> {
        let records = self.store.full_extraction(include_embeddings).await?;
        write_records_jsonl(path, &records)
    }

    /// Generate missing reasoning traces with the reasoning model.
    ///
    /// Idempotent without `overwrite`: already-reasoned records are
    /// skipped, so a failed pass can simply be rerun.
    pub async fn generate_reasoning(&self, options: &ReasoningOptions) -> Result<ReasoningReport> {
        let report = generate_reasoning(
            self.store.as_ref(),
            self.reasoning_model.as_ref(),
            &self.config.task_description,
            options,
        )
        .await?;
        self.reasoning_available.store(true, Ordering::Relaxed);
        Ok(report)
    }

    /// Predict labels for the given input shape.
    ///
    /// - a single string yields exactly one prediction;
    /// - a list yields one prediction per input, in input order;
    /// - the default-split shape is reserved and yields none.
    ///
    /// When reasoning is requested but unavailable, the configured
    /// [`MissingReasoning`] policy decides between generating it first and
    /// disabling reasoning for this call; the library never blocks on
    /// interactive input.
    pub async fn predict(
        &self,
        input: impl Into<PredictInput>,
        options: PredictOptions,
    ) -> Result<Vec<String>> {
        let mut options = options;

        if options.use_reasoning && !self.reasoning_available() {
            let generate_first = match &options.missing_reasoning {
                MissingReasoning::Disable => false,
                MissingReasoning::Generate => true,
                MissingReasoning::Confirm(decide) => decide(),
            };
            if generate_first {
                info!("reasoning unavailable; generating before prediction");
                let reasoning_options = ReasoningOptions {
                    timeout: options.timeout,
                    cancel: options.cancel.clone(),
                    ..ReasoningOptions::default()
                };
                self.generate_reasoning(&reasoning_options).await?;
            } else {
                warn!("reasoning requested but unavailable; predicting without reasoning");
                options.use_reasoning = false;
            }
        }

        match input.into() {
            PredictInput::DefaultSplit => {
                debug!("default-split prediction is reserved; returning no predictions");
                Ok(Vec::new())
            }
            PredictInput::Single(text) => {
                let label = self.predict_one(&text, &options).await?;
                Ok(vec![label])
            }
            PredictInput::Batch(inputs) => {
                let mut labels = Vec::with_capacity(inputs.len());
                for text in &inputs {
                    labels.push(self.predict_one(text, &options).await?);
                }
                Ok(labels)
            }
        }
    }

    async fn predict_one(&self, input: &str, options: &PredictOptions) -> Result<String> {
        predict_single(
            self.store.as_ref(),
            self.annotation_model.as_ref(),
            &self.config.task_description,
            input,
            options,
        )
        .await
    }
}

// Collaborators are trait objects, so Debug is written by hand.
impl fmt::Debug for AnnotationProject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnnotationProject")
            .field("config", &self.config)
            .field("reasoning_available", &self.reasoning_available)
            .finish_non_exhaustive()
    }
}

/// Builder for [`AnnotationProject`].
///
/// `model` sets one language model for both reasoning and annotation;
/// alternatively set `reasoning_model` and `annotation_model` separately.
#[derive(Default)]
pub struct AnnotationProjectBuilder {
    config: Option<ProjectConfig>,
    store: Option<Arc<dyn RecordStore>>,
    model: Option<Arc<dyn LanguageModel>>,
    reasoning_model: Option<Arc<dyn LanguageModel>>,
    annotation_model: Option<Arc<dyn LanguageModel>>,
}

impl AnnotationProjectBuilder {
    /// Set the project configuration.
    pub fn config(mut self, config: ProjectConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the record store.
    pub fn store(mut self, store: Arc<dyn RecordStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Use one model for both reasoning and annotation.
    pub fn model(mut self, model: Arc<dyn LanguageModel>) -> Self {
        self.model = Some(model);
        self
    }

    /// Set the reasoning model.
    pub fn reasoning_model(mut self, model: Arc<dyn LanguageModel>) -> Self {
        self.reasoning_model = Some(model);
        self
    }

    /// Set the annotation model.
    pub fn annotation_model(mut self, model: Arc<dyn LanguageModel>) -> Self {
        self.annotation_model = Some(model);
        self
    }

    /// Build the project, failing fast on any missing collaborator.
    pub fn build(self) -> Result<AnnotationProject> {
        let config = self
            .config
            .ok_or_else(|| AnnotationError::config("project config is required"))?;
        if config.task_description.is_empty() {
            return Err(AnnotationError::config("task description must not be empty"));
        }
        let store = self
            .store
            .ok_or_else(|| AnnotationError::config("record store is required"))?;

        let (reasoning_model, annotation_model) = match (
            self.model,
            self.reasoning_model,
            self.annotation_model,
        ) {
            (Some(shared), None, None) => (shared.clone(), shared),
            (None, Some(reasoning), Some(annotation)) => (reasoning, annotation),
            _ => {
                return Err(AnnotationError::config(
                    "provide either one shared model or both a reasoning and an \
                     annotation model",
                ))
            }
        };

        Ok(AnnotationProject {
            config,
            store,
            reasoning_model,
            annotation_model,
            reasoning_available: AtomicBool::new(false),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stores::MemoryStore;
    use crate::testing::{MockEmbeddingModel, MockLanguageModel};

    fn store() -> Arc<MemoryStore> {
        Arc::new(MemoryStore::new(Arc::new(MockEmbeddingModel::new())))
    }

    #[test]
    fn test_build_requires_config() {
        let err = AnnotationProject::builder()
            .store(store())
            .model(Arc::new(MockLanguageModel::new()))
            .build()
            .unwrap_err();
        assert!(matches!(err, AnnotationError::Config { .. }));
    }

    #[test]
    fn test_build_requires_both_specific_models() {
        let err = AnnotationProject::builder()
            .config(ProjectConfig::new("classify"))
            .store(store())
            .reasoning_model(Arc::new(MockLanguageModel::new()))
            .build()
            .unwrap_err();
        assert!(matches!(err, AnnotationError::Config { .. }));
    }

    #[test]
    fn test_shared_model_serves_both_roles() {
        let project = AnnotationProject::builder()
            .config(ProjectConfig::new("classify"))
            .store(store())
            .model(Arc::new(MockLanguageModel::new()))
            .build()
            .unwrap();
        assert!(!project.reasoning_available());
    }

    #[test]
    fn test_project_debug_omits_collaborators() {
        let project = AnnotationProject::builder()
            .config(ProjectConfig::new("classify"))
            .store(store())
            .model(Arc::new(MockLanguageModel::new()))
            .build()
            .unwrap();

        let rendered = format!("{:?}", project);
        assert!(rendered.starts_with("AnnotationProject"));
        assert!(rendered.contains("classify"));
    }

    #[test]
    fn test_empty_task_description_is_rejected() {
        let err = AnnotationProject::builder()
            .config(ProjectConfig::new(""))
            .store(store())
            .model(Arc::new(MockLanguageModel::new()))
            .build()
            .unwrap_err();
        assert!(matches!(err, AnnotationError::Config { .. }));
    }
}
