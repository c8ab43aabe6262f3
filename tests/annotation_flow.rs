//! End-to-end tests for the annotation flow: import, reasoning
//! generation, retrieval, and prediction against mock collaborators.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use annotator::{
    AnnotationError, AnnotationProject, MemoryStore, MissingReasoning, MockEmbeddingModel,
    MockLanguageModel, PredictInput, PredictOptions, ProjectConfig, Record, ReasoningOptions, Role,
};

/// Embedder where "spam"-flavored texts cluster away from the rest, so
/// similarity ordering in tests is known in advance.
fn spam_embedder() -> Arc<MockEmbeddingModel> {
    Arc::new(
        MockEmbeddingModel::new()
            .with_embedding("Buy cheap meds now!!!", vec![1.0, 0.0, 0.0])
            .with_embedding("Limited offer, click here", vec![0.9, 0.1, 0.0])
            .with_embedding("Lunch tomorrow?", vec![0.0, 1.0, 0.0])
            .with_embedding("Meeting notes attached", vec![0.0, 0.9, 0.1])
            .with_embedding("CHEAP meds limited offer", vec![0.95, 0.05, 0.0]),
    )
}

fn spam_records() -> Vec<Record> {
    vec![
        Record::new("Buy cheap meds now!!!", "spam").with_id("a"),
        Record::new("Limited offer, click here", "spam").with_id("b"),
        Record::new("Lunch tomorrow?", "ham").with_id("c"),
        Record::new("Meeting notes attached", "ham").with_id("d"),
    ]
}

fn project(
    store: Arc<MemoryStore>,
    model: Arc<MockLanguageModel>,
) -> AnnotationProject {
    AnnotationProject::builder()
        .config(ProjectConfig::new("Classify the message as spam or ham."))
        .store(store)
        .model(model)
        .build()
        .unwrap()
}

#[tokio::test]
async fn test_predict_retrieves_most_similar_demonstrations_in_order() {
    let store = Arc::new(MemoryStore::new(spam_embedder()));
    let model = Arc::new(MockLanguageModel::new().with_reply("spam"));
    let project = project(store, model.clone());

    project.add_records(spam_records()).await.unwrap();

    let labels = project
        .predict(
            "CHEAP meds limited offer",
            PredictOptions::new().with_demonstrations(2),
        )
        .await
        .unwrap();
    assert_eq!(labels, vec!["spam".to_string()]);

    // One model call, fed a 2-demonstration conversation in similarity
    // order: record "a" is closest to the query, then "b".
    let conversations = model.conversations();
    assert_eq!(conversations.len(), 1);
    let turns = &conversations[0];
    assert_eq!(turns.len(), 5);
    assert_eq!(turns[0].role, Role::User);
    assert_eq!(
        turns[0].content,
        "Classify the message as spam or ham.\nBuy cheap meds now!!!"
    );
    assert_eq!(turns[1].content, "spam");
    assert_eq!(
        turns[2].content,
        "Classify the message as spam or ham.\nLimited offer, click here"
    );
    assert_eq!(turns[3].content, "spam");
    assert_eq!(turns[4].role, Role::User);
    assert_eq!(
        turns[4].content,
        "Classify the message as spam or ham.\nCHEAP meds limited offer"
    );
}

#[tokio::test]
async fn test_batch_prediction_preserves_input_order() {
    let store = Arc::new(MemoryStore::new(spam_embedder()));
    let model = Arc::new(
        MockLanguageModel::new()
            .with_reply("spam")
            .with_reply("ham"),
    );
    let project = project(store, model.clone());
    project.add_records(spam_records()).await.unwrap();

    let labels = project
        .predict(
            vec!["CHEAP meds limited offer", "Lunch tomorrow?"],
            PredictOptions::default(),
        )
        .await
        .unwrap();

    assert_eq!(labels, vec!["spam".to_string(), "ham".to_string()]);
    assert_eq!(model.call_count(), 2);
}

#[tokio::test]
async fn test_default_split_input_is_reserved() {
    let store = Arc::new(MemoryStore::new(spam_embedder()));
    let project = project(store, Arc::new(MockLanguageModel::new()));

    let labels = project
        .predict(PredictInput::DefaultSplit, PredictOptions::default())
        .await
        .unwrap();
    assert!(labels.is_empty());
}

#[tokio::test]
async fn test_reasoning_generation_is_idempotent() {
    let store = Arc::new(MemoryStore::new(spam_embedder()));
    let model = Arc::new(MockLanguageModel::new());
    let project = project(store, model.clone());
    project.add_records(spam_records()).await.unwrap();

    let first = project
        .generate_reasoning(&ReasoningOptions::default())
        .await
        .unwrap();
    assert_eq!(first.generated, 4);
    assert_eq!(first.skipped, 0);
    let after_first = project.records(false).await.unwrap();
    assert!(after_first.iter().all(|r| r.has_reasoning()));

    // A rerun without overwrite touches nothing and makes no model calls.
    let calls_before = model.call_count();
    let second = project
        .generate_reasoning(&ReasoningOptions::default())
        .await
        .unwrap();
    assert_eq!(second.generated, 0);
    assert_eq!(second.skipped, 4);
    assert_eq!(model.call_count(), calls_before);
    assert_eq!(project.records(false).await.unwrap(), after_first);

    // Overwrite regenerates every trace.
    let third = project
        .generate_reasoning(&ReasoningOptions::new().with_overwrite())
        .await
        .unwrap();
    assert_eq!(third.generated, 4);
    assert_ne!(project.records(false).await.unwrap(), after_first);
}

#[tokio::test]
async fn test_reasoning_failure_keeps_completed_records() {
    let store = Arc::new(MemoryStore::new(spam_embedder()));
    let model = Arc::new(MockLanguageModel::new().fail_on_call(2));
    let project = project(store, model.clone());
    project.add_records(spam_records()).await.unwrap();

    let err = project
        .generate_reasoning(&ReasoningOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, AnnotationError::Model(_)));

    // The first record was persisted before the failure; a rerun resumes
    // with the remaining three only.
    let records = project.records(false).await.unwrap();
    assert_eq!(records.iter().filter(|r| r.has_reasoning()).count(), 1);

    let report = project
        .generate_reasoning(&ReasoningOptions::default())
        .await
        .unwrap();
    assert_eq!(report.generated, 3);
    assert_eq!(report.skipped, 1);
}

#[tokio::test]
async fn test_invalid_template_fails_before_any_model_call() {
    let store = Arc::new(MemoryStore::new(spam_embedder()));
    let model = Arc::new(MockLanguageModel::new());
    let project = project(store, model.clone());
    project.add_records(spam_records()).await.unwrap();

    let err = project
        .generate_reasoning(&ReasoningOptions::new().with_template("explain {input}"))
        .await
        .unwrap_err();
    assert!(matches!(err, AnnotationError::Config { .. }));
    assert_eq!(model.call_count(), 0);
}

#[tokio::test]
async fn test_missing_reasoning_disable_predicts_without_traces() {
    let store = Arc::new(MemoryStore::new(spam_embedder()));
    let model = Arc::new(MockLanguageModel::new().with_reply("spam"));
    let project = project(store, model.clone());
    project.add_records(spam_records()).await.unwrap();

    let labels = project
        .predict(
            "CHEAP meds limited offer",
            PredictOptions::new().with_demonstrations(1).with_reasoning(),
        )
        .await
        .unwrap();
    assert_eq!(labels, vec!["spam".to_string()]);

    // No reasoning pass ran; the lone demonstration turn carries the
    // output only.
    assert_eq!(model.call_count(), 1);
    assert_eq!(model.conversations()[0][1].content, "spam");
}

#[tokio::test]
async fn test_missing_reasoning_generate_runs_a_pass_first() {
    let store = Arc::new(MemoryStore::new(spam_embedder()));
    let model = Arc::new(MockLanguageModel::new());
    let project = project(store, model.clone());
    project.add_records(spam_records()).await.unwrap();

    project
        .predict(
            "CHEAP meds limited offer",
            PredictOptions::new()
                .with_demonstrations(1)
                .with_reasoning()
                .on_missing_reasoning(MissingReasoning::Generate),
        )
        .await
        .unwrap();

    // Four reasoning calls, then the prediction itself.
    assert_eq!(model.call_count(), 5);
    assert!(project.reasoning_available());
    let prediction_turns = &model.conversations()[4];
    assert!(prediction_turns[1].content.starts_with("Reasoning: "));
}

#[tokio::test]
async fn test_missing_reasoning_confirm_callback_declines() {
    let store = Arc::new(MemoryStore::new(spam_embedder()));
    let model = Arc::new(MockLanguageModel::new());
    let project = project(store, model.clone());
    project.add_records(spam_records()).await.unwrap();

    project
        .predict(
            "CHEAP meds limited offer",
            PredictOptions::new()
                .with_demonstrations(1)
                .with_reasoning()
                .on_missing_reasoning(MissingReasoning::Confirm(Arc::new(|| false))),
        )
        .await
        .unwrap();

    // Declined: only the prediction call happened.
    assert_eq!(model.call_count(), 1);
    assert!(!project.reasoning_available());
}

#[tokio::test]
async fn test_negative_demonstration_count_retrieves_none() {
    let store = Arc::new(MemoryStore::new(spam_embedder()));
    let model = Arc::new(MockLanguageModel::new().with_reply("spam"));
    let project = project(store, model.clone());
    project.add_records(spam_records()).await.unwrap();

    project
        .predict(
            "CHEAP meds limited offer",
            PredictOptions::new().with_demonstrations(-2),
        )
        .await
        .unwrap();

    // Zero-shot conversation: a single user turn.
    assert_eq!(model.conversations()[0].len(), 1);
}

#[tokio::test]
async fn test_slow_model_surfaces_timeout() {
    let store = Arc::new(MemoryStore::new(spam_embedder()));
    let model = Arc::new(
        MockLanguageModel::new().with_delay(Duration::from_millis(200)),
    );
    let project = project(store, model);
    project.add_records(spam_records()).await.unwrap();

    let err = project
        .predict(
            "CHEAP meds limited offer",
            PredictOptions::new().with_timeout(Duration::from_millis(10)),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, AnnotationError::Timeout { .. }));
    assert!(err.is_retryable());
}

#[tokio::test]
async fn test_cancelled_token_aborts_prediction() {
    let store = Arc::new(MemoryStore::new(spam_embedder()));
    let model = Arc::new(
        MockLanguageModel::new().with_delay(Duration::from_millis(200)),
    );
    let project = project(store, model);
    project.add_records(spam_records()).await.unwrap();

    let cancel = CancellationToken::new();
    cancel.cancel();

    let err = project
        .predict(
            "CHEAP meds limited offer",
            PredictOptions::new().with_cancel(cancel),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, AnnotationError::Cancelled));
    assert!(!err.is_retryable());
}

#[tokio::test]
async fn test_import_rows_sets_reasoning_availability() {
    use annotator::{ColumnMapping, Row};
    use serde_json::json;

    let store = Arc::new(MemoryStore::new(Arc::new(MockEmbeddingModel::new())));
    let model = Arc::new(MockLanguageModel::new());
    let project = project(store, model.clone());

    let rows: Vec<Row> = [
        json!({"text": "Buy now!!!", "label": "spam", "why": "Pushy sales wording."}),
        json!({"text": "See you at 5", "label": "ham", "why": "Ordinary scheduling."}),
    ]
    .into_iter()
    .map(|v| v.as_object().unwrap().clone())
    .collect();

    let mapping = ColumnMapping::new()
        .with_input("text")
        .with_output("label")
        .with_reasoning("why");
    let count = project.import_rows(&rows, &mapping).await.unwrap();

    assert_eq!(count, 2);
    assert!(project.reasoning_available());

    let records = project.records(false).await.unwrap();
    assert!(records.iter().all(|r| r.split == "train"));
    assert!(records.iter().all(|r| r.has_reasoning()));

    // Imported reasoning flows straight into prediction without a
    // generation pass.
    project
        .predict(
            "Buy cheap now!!!",
            PredictOptions::new().with_demonstrations(1).with_reasoning(),
        )
        .await
        .unwrap();
    assert_eq!(model.call_count(), 1);
    assert!(model.conversations()[0][1]
        .content
        .starts_with("Reasoning: "));
}

#[tokio::test]
async fn test_export_round_trips_through_jsonl() {
    use annotator::read_records_jsonl;

    let store = Arc::new(MemoryStore::new(spam_embedder()));
    let project = project(store, Arc::new(MockLanguageModel::new()));
    project.add_records(spam_records()).await.unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("export.jsonl");
    project.export_records(&path, false).await.unwrap();

    let exported = read_records_jsonl(&path).unwrap();
    assert_eq!(exported, project.records(false).await.unwrap());
}

#[tokio::test]
async fn test_json_value_inputs_dispatch_by_shape() {
    use serde_json::json;

    let store = Arc::new(MemoryStore::new(spam_embedder()));
    let model = Arc::new(
        MockLanguageModel::new()
            .with_reply("spam")
            .with_reply("ham"),
    );
    let project = project(store, model);
    project.add_records(spam_records()).await.unwrap();

    let single = PredictInput::try_from(json!("CHEAP meds limited offer")).unwrap();
    let labels = project.predict(single, PredictOptions::default()).await.unwrap();
    assert_eq!(labels.len(), 1);

    let batch = PredictInput::try_from(json!(["Lunch tomorrow?"])).unwrap();
    let labels = project.predict(batch, PredictOptions::default()).await.unwrap();
    assert_eq!(labels.len(), 1);

    let err = PredictInput::try_from(json!({"not": "valid"})).unwrap_err();
    assert!(matches!(err, AnnotationError::InputType { .. }));
}
