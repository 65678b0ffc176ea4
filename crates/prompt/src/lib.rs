//! Prompt system for docqa.
//!
//! This crate provides the prompt used to turn retrieved context into an
//! answer request:
//! - YAML-based prompt definitions under `.docqa/prompts/`
//! - A builtin `answer.default` prompt used when no override exists
//! - Handlebars rendering of the system and user messages

pub mod builder;
pub mod builtin;
pub mod loader;
pub mod types;

// Re-export main types
pub use builder::build_prompt;
pub use builtin::DEFAULT_ANSWER_PROMPT_ID;
pub use loader::{list_prompts, load_prompt};
pub use types::{BuiltPrompt, BuiltPromptMetadata, PromptDefinition, PromptVariables};
