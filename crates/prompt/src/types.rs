//! Prompt types for docqa.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A prompt definition loaded from YAML.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptDefinition {
    /// Unique prompt identifier
    pub id: String,

    /// Human-readable title
    pub title: String,

    /// API version for schema evolution
    #[serde(rename = "apiVersion")]
    pub api_version: String,

    /// Creator identifier
    #[serde(rename = "createdBy", default)]
    pub created_by: String,

    /// System message template (Handlebars)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,

    /// User message template (Handlebars)
    pub template: String,
}

/// Template variables for a prompt render.
///
/// Text values render verbatim; flags drive `{{#if}}` blocks.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct PromptVariables(BTreeMap<String, serde_json::Value>);

impl PromptVariables {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a text variable.
    pub fn text(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.0
            .insert(name.into(), serde_json::Value::String(value.into()));
        self
    }

    /// Add a boolean flag.
    pub fn flag(mut self, name: impl Into<String>, value: bool) -> Self {
        self.0.insert(name.into(), serde_json::Value::Bool(value));
        self
    }

    /// Names of all variables, sorted.
    pub fn names(&self) -> Vec<String> {
        self.0.keys().cloned().collect()
    }

    pub fn get(&self, name: &str) -> Option<&serde_json::Value> {
        self.0.get(name)
    }
}

/// A fully built prompt ready for LLM execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuiltPrompt {
    /// System message (optional)
    pub system: Option<String>,

    /// User message (required)
    pub user: String,

    /// Metadata about the built prompt
    pub metadata: BuiltPromptMetadata,
}

/// Metadata about a built prompt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuiltPromptMetadata {
    /// Source prompt ID
    #[serde(rename = "sourcePromptId")]
    pub source_prompt_id: String,

    /// Template variables that were supplied
    #[serde(rename = "resolvedVariables")]
    pub resolved_variables: Vec<String>,
}
