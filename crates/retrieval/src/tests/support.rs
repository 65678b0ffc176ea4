//! Shared test doubles.

use crate::embeddings::EmbeddingProvider;
use crate::generator::AnswerGenerator;
use async_trait::async_trait;
use docqa_core::{AppError, AppResult};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// Embedder returning fixed vectors for known texts.
#[derive(Debug)]
pub struct TableEmbedder {
    dimensions: usize,
    table: HashMap<String, Vec<f32>>,
}

impl TableEmbedder {
    pub fn new(dimensions: usize, entries: &[(&str, Vec<f32>)]) -> Self {
        Self {
            dimensions,
            table: entries
                .iter()
                .map(|(text, vector)| (text.to_string(), vector.clone()))
                .collect(),
        }
    }
}

#[async_trait]
impl EmbeddingProvider for TableEmbedder {
    fn provider_name(&self) -> &str {
        "table"
    }

    fn model_name(&self) -> &str {
        "table"
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        texts
            .iter()
            .map(|text| {
                self.table
                    .get(text)
                    .cloned()
                    .ok_or_else(|| AppError::EmbeddingService(format!("no vector for '{}'", text)))
            })
            .collect()
    }
}

/// What [`StubGenerator`] does when called.
pub enum Reply {
    Answer(&'static str),
    Fail,
    Hang,
}

/// Generator with a scripted reply that records its calls.
pub struct StubGenerator {
    reply: Reply,
    calls: AtomicUsize,
    low_confidence: Mutex<Vec<bool>>,
    contexts: Mutex<Vec<String>>,
}

impl StubGenerator {
    pub fn new(reply: Reply) -> Self {
        Self {
            reply,
            calls: AtomicUsize::new(0),
            low_confidence: Mutex::new(Vec::new()),
            contexts: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn low_confidence_flags(&self) -> Vec<bool> {
        self.low_confidence.lock().unwrap().clone()
    }

    pub fn contexts(&self) -> Vec<String> {
        self.contexts.lock().unwrap().clone()
    }
}

#[async_trait]
impl AnswerGenerator for StubGenerator {
    async fn generate(&self, question: &str, context: &str) -> AppResult<String> {
        self.generate_with_confidence(question, context, false).await
    }

    async fn generate_with_confidence(
        &self,
        _question: &str,
        context: &str,
        low_confidence: bool,
    ) -> AppResult<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.low_confidence.lock().unwrap().push(low_confidence);
        self.contexts.lock().unwrap().push(context.to_string());

        match self.reply {
            Reply::Answer(text) => Ok(text.to_string()),
            Reply::Fail => Err(AppError::GenerationService("model unavailable".to_string())),
            Reply::Hang => {
                tokio::time::sleep(Duration::from_secs(30)).await;
                Ok("too late".to_string())
            }
        }
    }
}

pub fn ids(values: &[&str]) -> Vec<String> {
    values.iter().map(|s| s.to_string()).collect()
}
