//! Document retrieval and question answering.
//!
//! Documents are segmented into sentence-aligned chunks, embedded, and stored
//! as one exact vector index per document. Questions are answered by
//! searching the requested documents concurrently, ranking the merged
//! candidates by cosine similarity, and handing the best chunks to an answer
//! generator.
//!
//! # Example
//! ```no_run
//! use docqa_retrieval::embeddings::providers::mock::MockProvider;
//! use docqa_retrieval::{ingest_document, retrieve, IndexStore, IngestOptions, RetrieveOptions};
//!
//! # async fn example() -> docqa_core::AppResult<()> {
//! let store = IndexStore::new(".docqa/vectors");
//! let embedder = MockProvider::new(384);
//!
//! ingest_document(&store, &embedder, "zoo", "Cats are mammals.", &IngestOptions::default()).await?;
//!
//! let ids = vec!["zoo".to_string()];
//! let retrieval = retrieve(&store, &embedder, "Are cats mammals?", &ids, &RetrieveOptions::default()).await?;
//! println!("{:?}", retrieval.chunk_texts());
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod embeddings;
pub mod generator;
pub mod ingest;
pub mod progress;
pub mod rag;
pub mod rank;
pub mod retrieve;
pub mod segment;
pub mod store;
pub mod types;
pub mod vector_index;

#[cfg(test)]
mod tests;

pub use config::{load_config, save_config, GenerationConfig, PipelineConfig};
pub use embeddings::{create_provider, EmbeddingConfig, EmbeddingProvider};
pub use generator::{AnswerGenerator, LlmAnswerGenerator};
pub use ingest::{ingest_batch, ingest_document, BatchIngestReport, DocumentIngestOutcome, IngestOptions};
pub use progress::{Phase, ProgressCallback, ProgressEvent, ProgressReporter};
pub use rag::{answer_question, AnswerOptions, AnswerOutcome, AnswerResponse};
pub use retrieve::{retrieve, DocumentOutcome, RetrieveOptions};
pub use segment::{segment, Chunk, SegmentOptions};
pub use store::{IndexStore, StoredEntry};
pub use types::{
    DocumentFailure, DocumentInput, IngestStats, RescoreMode, Retrieval, RetrievalCandidate,
    RetrievalStatus,
};
pub use vector_index::{FlatIndex, Neighbor, VectorIndex};
