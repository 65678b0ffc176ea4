//! Error types for docqa.
//!
//! One enum covers the whole pipeline: input validation, index construction,
//! index storage, the external embedding and generation services, and the
//! infrastructure underneath them (configuration, I/O, serialization).

use thiserror::Error;

/// Unified error type for docqa.
///
/// All fallible functions return `Result<T, AppError>`.
#[derive(Error, Debug)]
pub enum AppError {
    /// Caller supplied invalid input (segmenter parameters, blank text, bad ids)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Vector lengths disagree with each other or with the index
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// Nothing to build from (e.g. a document that produced zero chunks)
    #[error("Empty input: {0}")]
    EmptyInput(String),

    /// No committed index entry exists for the requested key
    #[error("Not found: {0}")]
    NotFound(String),

    /// A persisted entry exists but is inconsistent; re-ingestion is required
    #[error("Corrupt index entry: {0}")]
    Corrupt(String),

    /// The embedding service failed or returned malformed output
    #[error("Embedding service error: {0}")]
    EmbeddingService(String),

    /// The answer generation service failed or returned nothing usable
    #[error("Generation service error: {0}")]
    GenerationService(String),

    /// An external call exceeded its deadline
    #[error("Timed out: {0}")]
    Timeout(String),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O and filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// LLM provider transport errors
    #[error("LLM error: {0}")]
    Llm(String),

    /// Prompt loading and rendering errors
    #[error("Prompt error: {0}")]
    Prompt(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic errors
    #[error("{0}")]
    Other(String),
}

impl AppError {
    /// Whether retrying the same operation later may succeed.
    ///
    /// Corruption and bad input are permanent until something changes
    /// (re-ingestion, different arguments); service hiccups are not.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            AppError::Timeout(_)
                | AppError::EmbeddingService(_)
                | AppError::GenerationService(_)
                | AppError::Llm(_)
                | AppError::Io(_)
        )
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, AppError::NotFound(_))
    }

    pub fn is_corrupt(&self) -> bool {
        matches!(self, AppError::Corrupt(_))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for AppError {
    fn from(err: serde_yaml::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

/// Convenience type alias for Results with AppError.
pub type AppResult<T> = Result<T, AppError>;
