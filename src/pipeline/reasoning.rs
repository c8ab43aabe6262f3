//! Gold-label-induced reasoning generation.
//!
//! Per record the state machine is `{no-reasoning} -> generate ->
//! {has-reasoning}`; a record with reasoning is only regenerated when the
//! caller sets `overwrite`. Each generated trace is persisted immediately
//! via [`RecordStore::update`], so a crash or collaborator failure
//! mid-pass keeps all prior progress durable and a rerun without
//! `overwrite` resumes with the remaining records.

use tracing::{debug, info, warn};

use crate::error::Result;
use crate::pipeline::guarded;
use crate::pipeline::prompt::{
    render_reasoning_prompt, validate_reasoning_template, DEFAULT_REASONING_PROMPT,
};
use crate::traits::model::LanguageModel;
use crate::traits::store::RecordStore;
use crate::types::config::ReasoningOptions;
use crate::types::record::Turn;

/// Summary of one reasoning-generation pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReasoningReport {
    /// Records whose reasoning was generated and persisted.
    pub generated: usize,

    /// Records skipped because reasoning already existed.
    pub skipped: usize,
}

/// Generate missing reasoning traces for every record whose split is in
/// `options.splits`.
///
/// A custom template is validated before any model call; model failures
/// abort the remaining loop and propagate, leaving already-persisted
/// records in place.
pub async fn generate_reasoning(
    store: &dyn RecordStore,
    model: &dyn LanguageModel,
    task_description: &str,
    options: &ReasoningOptions,
) -> Result<ReasoningReport> {
    let template = match &options.prompt_template {
        Some(custom) => {
            validate_reasoning_template(custom)?;
            custom.as_str()
        }
        None => {
            debug!("no reasoning prompt provided; using the built-in template");
            DEFAULT_REASONING_PROMPT
        }
    };

    let records = store.full_extraction(false).await?;
    let mut report = ReasoningReport::default();

    for mut record in records {
        if !options.splits.contains(&record.split) {
            continue;
        }

        if record.has_reasoning() && !options.overwrite {
            warn!(
                id = record.id.as_deref().unwrap_or("<unknown>"),
                "reasoning already exists; skipping (set overwrite to regenerate)"
            );
            report.skipped += 1;
            continue;
        }

        let prompt = render_reasoning_prompt(
            template,
            task_description,
            &record.input,
            &record.output,
        );
        let conversation = [Turn::user(prompt)];
        let reasoning = guarded(
            model.generate(&conversation),
            options.timeout,
            options.cancel.as_ref(),
        )
        .await?;

        record.reasoning = Some(reasoning);
        // Persist one record at a time so partial runs stay resumable.
        store.update(vec![record]).await?;
        report.generated += 1;
    }

    info!(
        generated = report.generated,
        skipped = report.skipped,
        "finished generating reasoning"
    );
    Ok(report)
}
