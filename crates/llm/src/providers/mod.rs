//! Concrete LLM provider clients.

mod ollama;
mod openai;

pub use ollama::{OllamaClient, DEFAULT_OLLAMA_URL};
pub use openai::{OpenAiClient, DEFAULT_OPENAI_URL};

use docqa_core::AppError;

/// Map a transport failure onto the error taxonomy, keeping deadline
/// expiry distinguishable from other failures.
pub(crate) fn transport_error(provider: &str, err: reqwest::Error) -> AppError {
    if err.is_timeout() {
        AppError::Timeout(format!("{} request timed out: {}", provider, err))
    } else {
        AppError::Llm(format!("Failed to send request to {}: {}", provider, err))
    }
}
