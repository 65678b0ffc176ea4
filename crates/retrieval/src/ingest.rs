//! Ingest: segment a document, embed its chunks, build and commit the index.

use crate::embeddings::{embed_with_timeout, EmbeddingProvider};
use crate::progress::ProgressReporter;
use crate::segment::{chunk_texts, segment, SegmentOptions};
use crate::store::{validate_doc_id, IndexStore};
use crate::types::{DocumentInput, IngestStats};
use crate::vector_index::{FlatIndex, VectorIndex};
use docqa_core::{AppError, AppResult};
use futures::stream::{self, StreamExt};
use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
pub struct IngestOptions {
    pub segment: SegmentOptions,

    /// Chunks per embedding call
    pub batch_size: usize,

    /// Deadline for each embedding call
    pub embed_timeout: Duration,

    /// Documents ingested at the same time by [`ingest_batch`]
    pub concurrency: usize,

    pub progress: ProgressReporter,
}

impl Default for IngestOptions {
    fn default() -> Self {
        Self {
            segment: SegmentOptions::default(),
            batch_size: 32,
            embed_timeout: Duration::from_secs(30),
            concurrency: 4,
            progress: ProgressReporter::noop(),
        }
    }
}

/// Ingest one document and commit its index store entry.
///
/// Re-ingesting an existing id replaces the entry; readers see either the old
/// pair or the new one.
pub async fn ingest_document(
    store: &IndexStore,
    embedder: &dyn EmbeddingProvider,
    doc_id: &str,
    text: &str,
    options: &IngestOptions,
) -> AppResult<IngestStats> {
    let started = Instant::now();
    validate_doc_id(doc_id)?;

    if text.trim().is_empty() {
        return Err(AppError::Validation(format!(
            "document '{}' has no text to ingest",
            doc_id
        )));
    }

    let chunks = segment(text, &options.segment)?;
    let words = chunks
        .iter()
        .map(|c| c.word_count() - c.overlap_words())
        .sum::<usize>();
    options.progress.segmented(doc_id, chunks.len(), words);

    let texts = chunk_texts(&chunks);
    let mut vectors = Vec::with_capacity(texts.len());
    for batch in texts.chunks(options.batch_size.max(1)) {
        vectors.extend(embed_with_timeout(embedder, batch, options.embed_timeout).await?);
        options
            .progress
            .embedded(doc_id, vectors.len(), texts.len(), embedder.model_name());
    }

    let index = FlatIndex::build(vectors)?;
    let dimensions = index.dimensions();
    options.progress.indexed(doc_id, index.len(), dimensions);

    let writer = store.clone();
    let id = doc_id.to_string();
    let chunk_count = texts.len();
    let generation = tokio::task::spawn_blocking(move || writer.save(&id, &index, &texts))
        .await
        .map_err(|e| AppError::Other(format!("index save task failed: {}", e)))??;

    let generation = generation.to_string();
    options.progress.committed(doc_id, &generation);

    let stats = IngestStats {
        doc_id: doc_id.to_string(),
        chunks: chunk_count,
        dimensions,
        words,
        generation,
        duration_secs: started.elapsed().as_secs_f64(),
    };

    tracing::info!(
        doc_id = %doc_id,
        chunks = stats.chunks,
        dimensions = stats.dimensions,
        words = stats.words,
        "Ingested document in {:.2}s",
        stats.duration_secs
    );

    Ok(stats)
}

/// Result of ingesting one document from a batch.
#[derive(Debug)]
pub struct DocumentIngestOutcome {
    pub doc_id: String,
    pub result: AppResult<IngestStats>,
}

/// Per-document results of [`ingest_batch`], in input order.
#[derive(Debug, Default)]
pub struct BatchIngestReport {
    pub outcomes: Vec<DocumentIngestOutcome>,
}

impl BatchIngestReport {
    pub fn succeeded(&self) -> Vec<&IngestStats> {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().ok())
            .collect()
    }

    pub fn failed(&self) -> Vec<(&str, &AppError)> {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().err().map(|e| (o.doc_id.as_str(), e)))
            .collect()
    }

    pub fn all_succeeded(&self) -> bool {
        self.outcomes.iter().all(|o| o.result.is_ok())
    }
}

/// Ingest several documents with bounded concurrency.
///
/// A failing document is recorded in the report and does not stop the rest.
pub async fn ingest_batch(
    store: &IndexStore,
    embedder: &dyn EmbeddingProvider,
    documents: Vec<DocumentInput>,
    options: &IngestOptions,
) -> BatchIngestReport {
    let total = documents.len();

    let outcomes: Vec<DocumentIngestOutcome> = stream::iter(documents)
        .map(|document| async move {
            let result =
                ingest_document(store, embedder, &document.doc_id, &document.text, options).await;
            if let Err(e) = &result {
                tracing::warn!(doc_id = %document.doc_id, "Ingest failed: {}", e);
            }
            DocumentIngestOutcome {
                doc_id: document.doc_id,
                result,
            }
        })
        .buffered(options.concurrency.max(1))
        .collect()
        .await;

    let report = BatchIngestReport { outcomes };
    tracing::info!(
        "Batch ingest finished: {}/{} documents committed",
        report.succeeded().len(),
        total
    );
    report
}
