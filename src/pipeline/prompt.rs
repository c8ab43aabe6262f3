//! Prompt assembly and the reasoning prompt template.

use tracing::warn;

use crate::error::{AnnotationError, Result};
use crate::types::record::{Record, Turn};

/// Built-in template for gold-label-induced reasoning.
///
/// Given an input and the gold label an annotator assigned to it, the
/// model is asked to explain the label rather than re-derive it.
pub const DEFAULT_REASONING_PROMPT: &str = r#"You are given an annotation task, one example input, and the gold label an expert assigned to that input.

Task: {task_description}

Input: {input}

Gold label: {output}

Explain step by step why the gold label is the correct annotation for this input. Ground the explanation in the input text, keep it brief, and do not question the label. Reply with the explanation only."#;

const PLACEHOLDERS: [&str; 3] = ["{task_description}", "{input}", "{output}"];

/// Validate a reasoning prompt template before any model call is made.
///
/// The template must contain all of `{task_description}`, `{input}` and
/// `{output}`; a template that cannot be filled fails here, not mid-batch.
pub fn validate_reasoning_template(template: &str) -> Result<()> {
    for placeholder in PLACEHOLDERS {
        if !template.contains(placeholder) {
            return Err(AnnotationError::config(format!(
                "invalid reasoning prompt template: missing {} placeholder",
                placeholder
            )));
        }
    }
    Ok(())
}

/// Fill a reasoning prompt template.
///
/// Substitution is single-pass over the template: placeholder tokens
/// inside the substituted values stay literal.
pub fn render_reasoning_prompt(
    template: &str,
    task_description: &str,
    input: &str,
    output: &str,
) -> String {
    let values = [
        ("{task_description}", task_description),
        ("{input}", input),
        ("{output}", output),
    ];

    let mut rendered = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(brace) = rest.find('{') {
        rendered.push_str(&rest[..brace]);
        rest = &rest[brace..];
        match values.iter().find(|(token, _)| rest.starts_with(token)) {
            Some((token, value)) => {
                rendered.push_str(value);
                rest = &rest[token.len()..];
            }
            None => {
                rendered.push('{');
                rest = &rest[1..];
            }
        }
    }
    rendered.push_str(rest);
    rendered
}

/// Assemble the synthetic conversation for one prediction.
///
/// Each demonstration contributes a user turn (task description + its
/// input) and an assistant turn (its reasoning, when requested and
/// present, then its output); the new input forms the final user turn.
/// Demonstration order is preserved: the caller passes them most-similar
/// first and the model sees them in that order.
pub fn assemble_conversation(
    task_description: &str,
    demonstrations: &[Record],
    input: &str,
    use_reasoning: bool,
) -> Vec<Turn> {
    let mut conversation = Vec::with_capacity(demonstrations.len() * 2 + 1);

    for demonstration in demonstrations {
        conversation.push(Turn::user(format!(
            "{}\n{}",
            task_description, demonstration.input
        )));

        let mut reply = String::new();
        if use_reasoning {
            match &demonstration.reasoning {
                Some(reasoning) => {
                    reply.push_str("Reasoning: ");
                    reply.push_str(reasoning);
                    reply.push('\n');
                }
                // Partial demonstration sets stay usable; emit the output
                // alone rather than a malformed turn.
                None => warn!(
                    id = demonstration.id.as_deref().unwrap_or("<unknown>"),
                    "demonstration has no reasoning trace; emitting its output only"
                ),
            }
        }
        reply.push_str(&demonstration.output);
        conversation.push(Turn::assistant(reply));
    }

    conversation.push(Turn::user(format!("{}\n{}", task_description, input)));
    conversation
}
