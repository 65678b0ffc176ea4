//! Two-document retrieval with controlled vectors.

use super::support::{ids, TableEmbedder};
use crate::ingest::{ingest_document, IngestOptions};
use crate::retrieve::{retrieve, RetrieveOptions};
use crate::segment::SegmentOptions;
use crate::store::IndexStore;
use crate::types::RetrievalStatus;
use std::fs;
use tempfile::TempDir;

pub const QUESTION: &str = "Which animals purr?";
pub const VAGUE_QUESTION: &str = "Is it raining?";

/// Doc "a" holds the best match; doc "b" the second and third.
pub fn zoo_embedder() -> TableEmbedder {
    TableEmbedder::new(
        4,
        &[
            (QUESTION, vec![1.0, 0.0, 0.0, 0.0]),
            (VAGUE_QUESTION, vec![0.2, 0.0, 0.1, 0.97]),
            ("Cats purr.", vec![1.0, 0.0, 0.0, 0.0]),
            ("Dogs bark.", vec![0.0, 0.0, 1.0, 0.0]),
            ("Lions purr loudly.", vec![0.9, 0.43589, 0.0, 0.0]),
            ("Tigers purr too.", vec![0.8, 0.6, 0.0, 0.0]),
        ],
    )
}

pub async fn ingest_zoo(store: &IndexStore, embedder: &TableEmbedder) {
    let options = IngestOptions {
        segment: SegmentOptions::new(3, 0),
        ..Default::default()
    };
    ingest_document(store, embedder, "a", "Cats purr. Dogs bark.", &options)
        .await
        .unwrap();
    ingest_document(store, embedder, "b", "Lions purr loudly. Tigers purr too.", &options)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_best_chunks_across_documents() {
    let temp = TempDir::new().unwrap();
    let store = IndexStore::new(temp.path());
    let embedder = zoo_embedder();
    ingest_zoo(&store, &embedder).await;

    let result = retrieve(&store, &embedder, QUESTION, &ids(&["a", "b"]), &RetrieveOptions::default())
        .await
        .unwrap();

    assert_eq!(result.status(), RetrievalStatus::Found);
    assert_eq!(
        result.chunk_texts(),
        vec!["Cats purr.", "Lions purr loudly.", "Tigers purr too."]
    );
    assert_eq!(result.sources, vec!["a", "b"]);
    assert!((result.confidence.unwrap() - 1.0).abs() < 1e-5);

    let scores: Vec<f32> = result.candidates.iter().map(|c| c.score).collect();
    assert!(scores.windows(2).all(|w| w[0] >= w[1]));
}

#[tokio::test]
async fn test_final_k_limits_sources() {
    let temp = TempDir::new().unwrap();
    let store = IndexStore::new(temp.path());
    let embedder = zoo_embedder();
    ingest_zoo(&store, &embedder).await;

    let options = RetrieveOptions {
        final_k: 1,
        ..Default::default()
    };
    let result = retrieve(&store, &embedder, QUESTION, &ids(&["b", "a"]), &options)
        .await
        .unwrap();

    assert_eq!(result.chunk_texts(), vec!["Cats purr."]);
    assert_eq!(result.sources, vec!["a"]);
}

#[tokio::test]
async fn test_concurrency_does_not_change_result() {
    let temp = TempDir::new().unwrap();
    let store = IndexStore::new(temp.path());
    let embedder = zoo_embedder();
    ingest_zoo(&store, &embedder).await;

    let mut results = Vec::new();
    for concurrency in [1, 2, 8] {
        let options = RetrieveOptions {
            concurrency,
            ..Default::default()
        };
        let result = retrieve(&store, &embedder, QUESTION, &ids(&["a", "b"]), &options)
            .await
            .unwrap();
        results.push(result.chunk_texts());
    }

    assert_eq!(results[0], results[1]);
    assert_eq!(results[1], results[2]);
}

#[tokio::test]
async fn test_missing_and_corrupt_reported_separately() {
    let temp = TempDir::new().unwrap();
    let store = IndexStore::new(temp.path());
    let embedder = zoo_embedder();
    ingest_zoo(&store, &embedder).await;

    fs::write(temp.path().join("b.chunks"), b"{ not json").unwrap();

    let result = retrieve(
        &store,
        &embedder,
        QUESTION,
        &ids(&["a", "b", "missing"]),
        &RetrieveOptions::default(),
    )
    .await
    .unwrap();

    assert_eq!(result.sources, vec!["a"]);
    assert_eq!(result.corrupt_ids, vec!["b"]);
    assert_eq!(result.not_found_ids, vec!["missing"]);
    assert!(result.failures.is_empty());
}

#[tokio::test]
async fn test_chunks_without_index_is_corrupt() {
    let temp = TempDir::new().unwrap();
    let store = IndexStore::new(temp.path());
    let embedder = zoo_embedder();
    ingest_zoo(&store, &embedder).await;

    fs::remove_file(temp.path().join("a.index")).unwrap();

    let result = retrieve(&store, &embedder, QUESTION, &ids(&["a"]), &RetrieveOptions::default())
        .await
        .unwrap();

    assert_eq!(result.status(), RetrievalStatus::NoRelevantData);
    assert_eq!(result.corrupt_ids, vec!["a"]);
    assert!(result.not_found_ids.is_empty());
}
