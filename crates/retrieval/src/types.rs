//! Retrieval and ingest type definitions.

use serde::{Deserialize, Serialize};

/// A scored chunk produced while ranking. Never persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RetrievalCandidate {
    /// Cosine similarity between the question and the chunk
    pub score: f32,

    /// Chunk text
    pub text: String,

    /// Document the chunk belongs to
    pub doc_id: String,

    /// Chunk position within its document
    pub position: usize,

    /// Rank of the chunk within its document's search results (0 = nearest)
    pub doc_rank: usize,

    /// Squared Euclidean distance reported by the index search
    pub distance: f32,
}

/// Whether retrieval produced anything usable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RetrievalStatus {
    Found,
    NoRelevantData,
}

/// A document that could not be searched for a reason other than absence
/// or corruption.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentFailure {
    pub doc_id: String,
    pub error: String,
    pub retryable: bool,
}

/// Result of a retrieval request.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Retrieval {
    /// Top candidates, best first
    pub candidates: Vec<RetrievalCandidate>,

    /// Documents contributing to `candidates`, each once, in rank order
    pub sources: Vec<String>,

    /// Score of the best candidate
    pub confidence: Option<f32>,

    /// Requested documents with no committed index entry
    pub not_found_ids: Vec<String>,

    /// Requested documents whose entry is corrupt and must be re-ingested
    pub corrupt_ids: Vec<String>,

    /// Requested documents that failed for other reasons
    pub failures: Vec<DocumentFailure>,
}

impl Retrieval {
    pub fn status(&self) -> RetrievalStatus {
        if self.candidates.is_empty() {
            RetrievalStatus::NoRelevantData
        } else {
            RetrievalStatus::Found
        }
    }

    /// Chunk texts in rank order. Not deduplicated.
    pub fn chunk_texts(&self) -> Vec<String> {
        self.candidates.iter().map(|c| c.text.clone()).collect()
    }
}

/// How candidates shortlisted by distance are re-scored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RescoreMode {
    /// Cosine against the vector persisted at ingest time
    #[default]
    StoredVectors,

    /// Cosine against a fresh embedding of the chunk text
    ReEmbed,
}

impl RescoreMode {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "stored_vectors" | "stored" => Some(Self::StoredVectors),
            "re_embed" | "reembed" => Some(Self::ReEmbed),
            _ => None,
        }
    }
}

/// A document to ingest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentInput {
    pub doc_id: String,
    pub text: String,
}

impl DocumentInput {
    pub fn new(doc_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            doc_id: doc_id.into(),
            text: text.into(),
        }
    }
}

/// Statistics from ingesting one document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IngestStats {
    pub doc_id: String,
    pub chunks: usize,
    pub dimensions: usize,
    pub words: usize,
    pub generation: String,
    pub duration_secs: f64,
}
