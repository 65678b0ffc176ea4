//! Prompts shipped with the binary.

use crate::types::PromptDefinition;
use docqa_core::{AppError, AppResult};

/// Prompt used by `ask` unless the pipeline config names another.
pub const DEFAULT_ANSWER_PROMPT_ID: &str = "answer.default";

const DEFAULT_ANSWER_PROMPT: &str = r#"
id: answer.default
title: Answer from retrieved context
apiVersion: "1.0"
createdBy: docqa
system: >-
  You are a helpful assistant that answers based only on provided context.{{#if lowConfidence}}
  The retrieved context is only weakly related to the question. If it does not
  contain the answer, say that the documents do not cover it instead of guessing.{{/if}}
template: |-
  Answer the question based only on the text below. Be concise and accurate.

  Context:
  {{context}}

  Question: {{question}}
  Answer:
"#;

/// Ids of every builtin prompt.
pub fn builtin_ids() -> &'static [&'static str] {
    &[DEFAULT_ANSWER_PROMPT_ID]
}

/// Look up a builtin prompt by id.
pub fn builtin_prompt(prompt_id: &str) -> AppResult<Option<PromptDefinition>> {
    let source = match prompt_id {
        DEFAULT_ANSWER_PROMPT_ID => DEFAULT_ANSWER_PROMPT,
        _ => return Ok(None),
    };

    let definition = serde_yaml::from_str(source).map_err(|e| {
        AppError::Prompt(format!("Builtin prompt '{}' is invalid: {}", prompt_id, e))
    })?;
    Ok(Some(definition))
}
