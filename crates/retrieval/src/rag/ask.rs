//! Question answering: retrieve chunks, then generate from them.

use crate::embeddings::EmbeddingProvider;
use crate::generator::AnswerGenerator;
use crate::rag::types::{
    is_low_confidence, AnswerOutcome, AnswerResponse, NO_RELEVANT_DATA_ANSWER,
};
use crate::retrieve::{retrieve, RetrieveOptions};
use crate::store::IndexStore;
use crate::types::{Retrieval, RetrievalStatus};
use docqa_core::AppResult;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct AnswerOptions {
    pub retrieve: RetrieveOptions,

    /// Deadline for the generator call
    pub generation_timeout: Duration,
}

impl Default for AnswerOptions {
    fn default() -> Self {
        Self {
            retrieve: RetrieveOptions::default(),
            generation_timeout: Duration::from_secs(60),
        }
    }
}

/// Join chunk texts into the generator context, separated by a blank line.
pub fn build_context(chunks: &[String]) -> String {
    chunks.join("\n\n")
}

/// Answer `question` from the documents in `doc_ids`.
///
/// When nothing relevant is retrieved the generator is not called and the
/// fixed "No relevant data found." answer is returned. When the generator
/// fails or times out the response has no answer but keeps the retrieved
/// chunks and sources.
///
/// # Errors
/// Only the whole-request errors of [`retrieve`].
pub async fn answer_question(
    store: &IndexStore,
    embedder: &dyn EmbeddingProvider,
    generator: &dyn AnswerGenerator,
    question: &str,
    doc_ids: &[String],
    options: &AnswerOptions,
) -> AppResult<AnswerResponse> {
    tracing::info!(documents = doc_ids.len(), "Answering question: {}", question);

    let retrieval = retrieve(store, embedder, question, doc_ids, &options.retrieve).await?;

    if retrieval.status() == RetrievalStatus::NoRelevantData {
        return Ok(no_relevant_data(retrieval));
    }

    let confidence = retrieval.confidence.unwrap_or(0.0);
    let low_confidence = is_low_confidence(confidence);
    let context = build_context(&retrieval.chunk_texts());

    tracing::debug!(
        chunks = retrieval.candidates.len(),
        context_len = context.len(),
        confidence,
        low_confidence,
        "Calling answer generator"
    );

    let generated = tokio::time::timeout(
        options.generation_timeout,
        generator.generate_with_confidence(question, &context, low_confidence),
    )
    .await;

    let (answer, outcome) = match generated {
        Ok(Ok(answer)) => (Some(answer), AnswerOutcome::Answered),
        Ok(Err(e)) => {
            tracing::warn!("Answer generation failed, returning retrieved chunks: {}", e);
            (
                None,
                AnswerOutcome::GenerationFailed {
                    retryable: e.is_retryable(),
                    reason: e.to_string(),
                },
            )
        }
        Err(_) => {
            tracing::warn!(
                "Answer generation exceeded {:?}, returning retrieved chunks",
                options.generation_timeout
            );
            (
                None,
                AnswerOutcome::GenerationFailed {
                    reason: format!(
                        "generation timed out after {:?}",
                        options.generation_timeout
                    ),
                    retryable: true,
                },
            )
        }
    };

    Ok(AnswerResponse {
        answer,
        outcome,
        sources: retrieval.sources,
        chunks: retrieval.candidates,
        confidence: retrieval.confidence,
        low_confidence,
        not_found_ids: retrieval.not_found_ids,
        corrupt_ids: retrieval.corrupt_ids,
        failures: retrieval.failures,
    })
}

fn no_relevant_data(retrieval: Retrieval) -> AnswerResponse {
    AnswerResponse {
        answer: Some(NO_RELEVANT_DATA_ANSWER.to_string()),
        outcome: AnswerOutcome::NoRelevantData,
        sources: Vec::new(),
        chunks: Vec::new(),
        confidence: None,
        low_confidence: true,
        not_found_ids: retrieval.not_found_ids,
        corrupt_ids: retrieval.corrupt_ids,
        failures: retrieval.failures,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_joined_with_blank_line() {
        let chunks = vec!["First chunk.".to_string(), "Second chunk.".to_string()];
        assert_eq!(build_context(&chunks), "First chunk.\n\nSecond chunk.");
        assert_eq!(build_context(&[]), "");
    }
}
