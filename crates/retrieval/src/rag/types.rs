//! Answer response types.

use crate::types::{DocumentFailure, RetrievalCandidate};
use serde::Serialize;

/// Minimum score for high-confidence answering.
/// Scores below this make the generator answer cautiously.
pub const CONFIDENCE_THRESHOLD: f32 = 0.30;

/// Fixed answer when no chunk was retrieved.
pub const NO_RELEVANT_DATA_ANSWER: &str = "No relevant data found.";

/// How an answer request ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AnswerOutcome {
    Answered,
    NoRelevantData,

    /// Retrieval succeeded but the generator failed or timed out; chunks and
    /// sources are still returned.
    GenerationFailed { reason: String, retryable: bool },
}

/// Response to a question over a set of documents.
#[derive(Debug, Clone, Serialize)]
pub struct AnswerResponse {
    /// Generated answer; `None` when generation failed
    pub answer: Option<String>,

    pub outcome: AnswerOutcome,

    /// Documents the answer draws on, each once, in rank order
    pub sources: Vec<String>,

    /// Chunks given to the generator, best first
    pub chunks: Vec<RetrievalCandidate>,

    /// Score of the best chunk
    pub confidence: Option<f32>,

    pub low_confidence: bool,

    pub not_found_ids: Vec<String>,
    pub corrupt_ids: Vec<String>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<DocumentFailure>,
}

impl AnswerResponse {
    pub fn is_answered(&self) -> bool {
        self.outcome == AnswerOutcome::Answered
    }
}

/// Whether `confidence` calls for a cautious answer.
pub fn is_low_confidence(confidence: f32) -> bool {
    confidence < CONFIDENCE_THRESHOLD
}
