//! Prompt builder for rendering templates.

use crate::types::{BuiltPrompt, BuiltPromptMetadata, PromptDefinition, PromptVariables};
use docqa_core::{AppError, AppResult};
use handlebars::Handlebars;

/// Build a prompt from a definition and input variables.
///
/// Renders the system template (when present) and the user template with
/// the same variables. A system template that renders to whitespace only is
/// dropped.
///
/// # Example
/// ```no_run
/// use docqa_prompt::{build_prompt, load_prompt, PromptVariables};
/// use std::path::Path;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let def = load_prompt(Path::new("."), "answer.default")?;
/// let vars = PromptVariables::new()
///     .text("question", "What is Rust?")
///     .text("context", "Rust is a systems programming language.")
///     .flag("lowConfidence", false);
///
/// let built = build_prompt(&def, &vars)?;
/// println!("User prompt: {}", built.user);
/// # Ok(())
/// # }
/// ```
pub fn build_prompt(
    definition: &PromptDefinition,
    variables: &PromptVariables,
) -> AppResult<BuiltPrompt> {
    tracing::debug!("Building prompt: {}", definition.id);

    let mut handlebars = Handlebars::new();

    // Context is plain text, not HTML
    handlebars.register_escape_fn(handlebars::no_escape);

    handlebars
        .register_template_string("user", &definition.template)
        .map_err(|e| AppError::Prompt(format!("Failed to register template: {}", e)))?;

    let user = handlebars
        .render("user", variables)
        .map_err(|e| AppError::Prompt(format!("Failed to render template: {}", e)))?;

    let system = match &definition.system {
        Some(template) => {
            handlebars
                .register_template_string("system", template)
                .map_err(|e| {
                    AppError::Prompt(format!("Failed to register system template: {}", e))
                })?;
            let rendered = handlebars.render("system", variables).map_err(|e| {
                AppError::Prompt(format!("Failed to render system template: {}", e))
            })?;
            Some(rendered).filter(|s| !s.trim().is_empty())
        }
        None => None,
    };

    Ok(BuiltPrompt {
        system,
        user,
        metadata: BuiltPromptMetadata {
            source_prompt_id: definition.id.clone(),
            resolved_variables: variables.names(),
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtin::{builtin_prompt, DEFAULT_ANSWER_PROMPT_ID};

    fn definition(system: Option<&str>, template: &str) -> PromptDefinition {
        PromptDefinition {
            id: "test.prompt".to_string(),
            title: "Test".to_string(),
            api_version: "1.0".to_string(),
            created_by: "test".to_string(),
            system: system.map(str::to_string),
            template: template.to_string(),
        }
    }

    #[test]
    fn test_render_simple_template() {
        let def = definition(None, "Question: {{question}}");
        let vars = PromptVariables::new().text("question", "Hello, world!");

        let built = build_prompt(&def, &vars).unwrap();
        assert_eq!(built.user, "Question: Hello, world!");
        assert!(built.system.is_none());
        assert_eq!(built.metadata.source_prompt_id, "test.prompt");
    }

    #[test]
    fn test_context_is_not_html_escaped() {
        let def = definition(None, "{{context}}");
        let vars = PromptVariables::new().text("context", "a < b && \"c\"");

        let built = build_prompt(&def, &vars).unwrap();
        assert_eq!(built.user, "a < b && \"c\"");
    }

    #[test]
    fn test_default_prompt_layout() {
        let def = builtin_prompt(DEFAULT_ANSWER_PROMPT_ID).unwrap().unwrap();
        let vars = PromptVariables::new()
            .text("question", "What is X?")
            .text("context", "X is a letter.\n\nY follows X.")
            .flag("lowConfidence", false);

        let built = build_prompt(&def, &vars).unwrap();
        assert_eq!(
            built.user,
            "Answer the question based only on the text below. Be concise and accurate.\n\n\
             Context:\nX is a letter.\n\nY follows X.\n\nQuestion: What is X?\nAnswer:"
        );
        assert_eq!(
            built.system.as_deref(),
            Some("You are a helpful assistant that answers based only on provided context.")
        );
    }

    #[test]
    fn test_low_confidence_adds_caution() {
        let def = builtin_prompt(DEFAULT_ANSWER_PROMPT_ID).unwrap().unwrap();
        let vars = PromptVariables::new()
            .text("question", "q")
            .text("context", "c")
            .flag("lowConfidence", true);

        let system = build_prompt(&def, &vars).unwrap().system.unwrap();
        assert!(system.contains("weakly related"));
    }

    #[test]
    fn test_blank_system_dropped() {
        let def = definition(Some("{{#if strict}}Be strict.{{/if}}"), "x");
        let built = build_prompt(&def, &PromptVariables::new()).unwrap();
        assert!(built.system.is_none());
    }

    #[test]
    fn test_malformed_template_is_prompt_error() {
        let def = definition(None, "{{#if}}unclosed");
        let result = build_prompt(&def, &PromptVariables::new());
        assert!(matches!(result, Err(AppError::Prompt(_))));
    }
}
