//! Single-case prediction: retrieve, assemble, generate.

use tracing::debug;

use crate::error::Result;
use crate::pipeline::guarded;
use crate::pipeline::prompt::assemble_conversation;
use crate::pipeline::retrieval::retrieve_demonstrations;
use crate::traits::model::LanguageModel;
use crate::traits::store::RecordStore;
use crate::types::config::PredictOptions;

/// Predict the label for one input.
///
/// Retrieves demonstrations, assembles the synthetic conversation, and
/// calls the annotation model exactly once with the full conversation.
pub async fn predict_single(
    store: &dyn RecordStore,
    model: &dyn LanguageModel,
    task_description: &str,
    input: &str,
    options: &PredictOptions,
) -> Result<String> {
    let demonstrations = guarded(
        retrieve_demonstrations(store, input, options.number_demonstrations, &options.split),
        options.timeout,
        options.cancel.as_ref(),
    )
    .await?;
    debug!(
        demonstrations = demonstrations.len(),
        use_reasoning = options.use_reasoning,
        "assembling prediction conversation"
    );

    let conversation = assemble_conversation(
        task_description,
        &demonstrations,
        input,
        options.use_reasoning,
    );

    guarded(
        model.generate(&conversation),
        options.timeout,
        options.cancel.as_ref(),
    )
    .await
}
