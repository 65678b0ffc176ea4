//! Query-time retrieval across documents.
//!
//! The question is embedded once. Each document is then loaded, searched by
//! Euclidean distance and re-scored by cosine similarity on its own task; a
//! failure in one document is recorded and never aborts the others.

use crate::embeddings::{embed_query, embed_with_timeout, EmbeddingProvider};
use crate::rank::{rank_candidates, unique_sources};
use crate::store::{IndexStore, StoredEntry};
use crate::types::{DocumentFailure, RescoreMode, Retrieval, RetrievalCandidate};
use crate::vector_index::{cosine_similarity, VectorIndex};
use docqa_core::{AppError, AppResult};
use futures::stream::{self, StreamExt};
use std::collections::HashSet;
use std::time::Duration;

pub const DEFAULT_PER_DOC_K: usize = 10;
pub const DEFAULT_FINAL_K: usize = 3;
pub const DEFAULT_CONCURRENCY: usize = 4;

/// Parameters for [`retrieve`].
#[derive(Debug, Clone)]
pub struct RetrieveOptions {
    /// Candidates shortlisted per document
    pub per_doc_k: usize,

    /// Candidates kept after merging
    pub final_k: usize,

    /// Documents loaded and searched at the same time
    pub concurrency: usize,

    pub rescore: RescoreMode,

    /// Candidates scoring below this are discarded
    pub min_score: Option<f32>,

    pub embed_timeout: Duration,
}

impl Default for RetrieveOptions {
    fn default() -> Self {
        Self {
            per_doc_k: DEFAULT_PER_DOC_K,
            final_k: DEFAULT_FINAL_K,
            concurrency: DEFAULT_CONCURRENCY,
            rescore: RescoreMode::default(),
            min_score: None,
            embed_timeout: Duration::from_secs(30),
        }
    }
}

/// What happened to one requested document.
#[derive(Debug)]
pub enum DocumentOutcome {
    Hit(Vec<RetrievalCandidate>),
    NotFound,
    Corrupt(String),
    Failed(DocumentFailure),
}

/// Retrieve the best chunks for `question` from `doc_ids`.
///
/// Missing, corrupt and failing documents are reported in the result, not as
/// errors. An empty id list, or one where nothing matches, yields a result
/// with no candidates.
///
/// # Errors
/// `Validation` for a blank question or a zero `per_doc_k`/`final_k`;
/// `EmbeddingService` or `Timeout` when the question cannot be embedded.
pub async fn retrieve(
    store: &IndexStore,
    embedder: &dyn EmbeddingProvider,
    question: &str,
    doc_ids: &[String],
    options: &RetrieveOptions,
) -> AppResult<Retrieval> {
    if question.trim().is_empty() {
        return Err(AppError::Validation("question must not be empty".to_string()));
    }
    if options.per_doc_k == 0 || options.final_k == 0 {
        return Err(AppError::Validation(
            "per_doc_k and final_k must be at least 1".to_string(),
        ));
    }

    let mut seen = HashSet::new();
    let unique_ids: Vec<&String> = doc_ids.iter().filter(|id| seen.insert(*id)).collect();

    if unique_ids.is_empty() {
        tracing::info!("No documents requested, nothing to retrieve");
        return Ok(Retrieval::default());
    }

    let query = embed_query(embedder, question, options.embed_timeout).await?;

    tracing::debug!(
        documents = unique_ids.len(),
        per_doc_k = options.per_doc_k,
        final_k = options.final_k,
        "Searching documents"
    );

    let outcomes: Vec<(&String, DocumentOutcome)> = stream::iter(unique_ids)
        .map(|doc_id| {
            let query = &query;
            async move {
                let outcome = search_document(store, embedder, query, doc_id, options).await;
                (doc_id, outcome)
            }
        })
        .buffered(options.concurrency.max(1))
        .collect()
        .await;

    let mut retrieval = Retrieval::default();
    let mut candidates = Vec::new();

    for (doc_id, outcome) in outcomes {
        match outcome {
            DocumentOutcome::Hit(hits) => candidates.extend(hits),
            DocumentOutcome::NotFound => {
                tracing::debug!(doc_id = %doc_id, "Document has no committed index");
                retrieval.not_found_ids.push(doc_id.clone());
            }
            DocumentOutcome::Corrupt(reason) => {
                tracing::error!(doc_id = %doc_id, "Corrupt index entry, re-ingest required: {}", reason);
                retrieval.corrupt_ids.push(doc_id.clone());
            }
            DocumentOutcome::Failed(failure) => {
                tracing::warn!(
                    doc_id = %doc_id,
                    retryable = failure.retryable,
                    "Document search failed: {}",
                    failure.error
                );
                retrieval.failures.push(failure);
            }
        }
    }

    retrieval.candidates = rank_candidates(&candidates, options.final_k);
    retrieval.sources = unique_sources(&retrieval.candidates);
    retrieval.confidence = retrieval.candidates.first().map(|c| c.score);

    match retrieval.confidence {
        Some(score) => tracing::info!(
            candidates = retrieval.candidates.len(),
            sources = retrieval.sources.len(),
            score,
            "Retrieved chunks"
        ),
        None => tracing::info!("No relevant data found"),
    }

    Ok(retrieval)
}

/// Load, search and re-score one document.
pub async fn search_document(
    store: &IndexStore,
    embedder: &dyn EmbeddingProvider,
    query: &[f32],
    doc_id: &str,
    options: &RetrieveOptions,
) -> DocumentOutcome {
    let loader = store.clone();
    let id = doc_id.to_string();
    let loaded = match tokio::task::spawn_blocking(move || loader.load(&id)).await {
        Ok(result) => result,
        Err(e) => {
            return failed(
                doc_id,
                AppError::Other(format!("index load task failed: {}", e)),
            )
        }
    };

    let entry = match loaded {
        Ok(entry) => entry,
        Err(e) if e.is_not_found() => return DocumentOutcome::NotFound,
        Err(e) if e.is_corrupt() => return DocumentOutcome::Corrupt(e.to_string()),
        Err(e) => return failed(doc_id, e),
    };

    match score_entry(&entry, embedder, query, doc_id, options).await {
        Ok(hits) => DocumentOutcome::Hit(hits),
        Err(e) => failed(doc_id, e),
    }
}

async fn score_entry(
    entry: &StoredEntry,
    embedder: &dyn EmbeddingProvider,
    query: &[f32],
    doc_id: &str,
    options: &RetrieveOptions,
) -> AppResult<Vec<RetrievalCandidate>> {
    let neighbors = entry.index.search(query, options.per_doc_k)?;

    let scores: Vec<f32> = match options.rescore {
        RescoreMode::StoredVectors => neighbors
            .iter()
            .map(|n| {
                entry
                    .index
                    .vector(n.position)
                    .map(|v| cosine_similarity(query, v))
                    .unwrap_or(0.0)
            })
            .collect(),
        RescoreMode::ReEmbed => {
            let texts: Vec<String> = neighbors
                .iter()
                .map(|n| entry.chunks[n.position].clone())
                .collect();
            embed_with_timeout(embedder, &texts, options.embed_timeout)
                .await?
                .iter()
                .map(|v| cosine_similarity(query, v))
                .collect()
        }
    };

    Ok(neighbors
        .iter()
        .zip(scores)
        .enumerate()
        .filter(|(_, (_, score))| options.min_score.map_or(true, |min| *score >= min))
        .map(|(doc_rank, (neighbor, score))| RetrievalCandidate {
            score,
            text: entry.chunks[neighbor.position].clone(),
            doc_id: doc_id.to_string(),
            position: neighbor.position,
            doc_rank,
            distance: neighbor.distance,
        })
        .collect())
}

fn failed(doc_id: &str, error: AppError) -> DocumentOutcome {
    DocumentOutcome::Failed(DocumentFailure {
        doc_id: doc_id.to_string(),
        retryable: error.is_retryable(),
        error: error.to_string(),
    })
}
