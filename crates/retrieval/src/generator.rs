//! Answer Generator capability.
//!
//! The pipeline only needs "question + context in, answer text out". The
//! LLM-backed implementation renders a prompt definition and forwards it to a
//! `docqa-llm` client.

use async_trait::async_trait;
use docqa_core::{AppError, AppResult};
use docqa_llm::{LlmClient, LlmRequest};
use docqa_prompt::{build_prompt, PromptDefinition, PromptVariables};
use std::fmt;
use std::sync::Arc;

#[async_trait]
pub trait AnswerGenerator: Send + Sync {
    /// Produce an answer to `question` using only `context`.
    ///
    /// # Errors
    /// `GenerationService` when the backend fails or returns nothing.
    async fn generate(&self, question: &str, context: &str) -> AppResult<String>;

    /// Like [`generate`](Self::generate), telling the backend the context
    /// matched the question poorly.
    async fn generate_with_confidence(
        &self,
        question: &str,
        context: &str,
        _low_confidence: bool,
    ) -> AppResult<String> {
        self.generate(question, context).await
    }
}

/// Generator that prompts an LLM.
pub struct LlmAnswerGenerator {
    client: Arc<dyn LlmClient>,
    model: String,
    prompt: PromptDefinition,
    temperature: Option<f32>,
    max_tokens: Option<u32>,
}

impl fmt::Debug for LlmAnswerGenerator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LlmAnswerGenerator")
            .field("provider", &self.client.provider_name())
            .field("model", &self.model)
            .field("prompt", &self.prompt.id)
            .finish()
    }
}

impl LlmAnswerGenerator {
    pub fn new(client: Arc<dyn LlmClient>, model: impl Into<String>, prompt: PromptDefinition) -> Self {
        Self {
            client,
            model: model.into(),
            prompt,
            temperature: None,
            max_tokens: None,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    fn request(&self, question: &str, context: &str, low_confidence: bool) -> AppResult<LlmRequest> {
        let variables = PromptVariables::new()
            .text("question", question)
            .text("context", context)
            .flag("lowConfidence", low_confidence);

        let built = build_prompt(&self.prompt, &variables)?;

        let mut request = LlmRequest::new(built.user, &self.model);
        if let Some(system) = built.system {
            request = request.with_system(system);
        }
        if let Some(temperature) = self.temperature {
            request = request.with_temperature(temperature);
        }
        if let Some(max_tokens) = self.max_tokens {
            request = request.with_max_tokens(max_tokens);
        }
        Ok(request)
    }
}

#[async_trait]
impl AnswerGenerator for LlmAnswerGenerator {
    async fn generate(&self, question: &str, context: &str) -> AppResult<String> {
        self.generate_with_confidence(question, context, false).await
    }

    async fn generate_with_confidence(
        &self,
        question: &str,
        context: &str,
        low_confidence: bool,
    ) -> AppResult<String> {
        let request = self.request(question, context, low_confidence)?;

        tracing::debug!(
            provider = self.client.provider_name(),
            model = %self.model,
            prompt = %self.prompt.id,
            low_confidence,
            "Generating answer"
        );

        let response = self.client.complete(&request).await.map_err(|e| match e {
            AppError::Timeout(_) | AppError::GenerationService(_) => e,
            other => AppError::GenerationService(format!(
                "{} completion failed: {}",
                self.client.provider_name(),
                other
            )),
        })?;

        let answer = response.content.trim();
        if answer.is_empty() {
            return Err(AppError::GenerationService(format!(
                "{} returned an empty completion",
                self.client.provider_name()
            )));
        }

        tracing::debug!(
            prompt_tokens = response.usage.prompt_tokens,
            completion_tokens = response.usage.completion_tokens,
            "Answer generated"
        );

        Ok(answer.to_string())
    }
}
