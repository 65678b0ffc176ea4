//! Embedder capability.
//!
//! The host hands the pipeline an [`EmbeddingProvider`]; this module adds the
//! deadline and output validation every call goes through.

pub mod config;
pub mod provider;
pub mod providers;

pub use config::EmbeddingConfig;
pub use provider::{create_provider, EmbeddingProvider};

use docqa_core::{AppError, AppResult};
use std::time::Duration;

/// Embed `texts` under a deadline and check the output shape.
///
/// # Errors
/// `Timeout` when the deadline passes; `EmbeddingService` for provider
/// failures or when the vectors do not match the input count or the
/// provider's dimensionality.
pub async fn embed_with_timeout(
    provider: &dyn EmbeddingProvider,
    texts: &[String],
    timeout: Duration,
) -> AppResult<Vec<Vec<f32>>> {
    if texts.is_empty() {
        return Ok(Vec::new());
    }

    let vectors = match tokio::time::timeout(timeout, provider.embed_batch(texts)).await {
        Ok(Ok(vectors)) => vectors,
        Ok(Err(e)) => return Err(as_embedding_error(e)),
        Err(_) => {
            return Err(AppError::Timeout(format!(
                "embedding {} texts with '{}' exceeded {:?}",
                texts.len(),
                provider.provider_name(),
                timeout
            )))
        }
    };

    if vectors.len() != texts.len() {
        return Err(AppError::EmbeddingService(format!(
            "provider '{}' returned {} vectors for {} texts",
            provider.provider_name(),
            vectors.len(),
            texts.len()
        )));
    }

    let expected = provider.dimensions();
    if let Some(bad) = vectors.iter().find(|v| v.len() != expected) {
        return Err(AppError::EmbeddingService(format!(
            "provider '{}' returned a {}-dimensional vector, expected {}",
            provider.provider_name(),
            bad.len(),
            expected
        )));
    }

    Ok(vectors)
}

/// Embed a single query string.
pub async fn embed_query(
    provider: &dyn EmbeddingProvider,
    text: &str,
    timeout: Duration,
) -> AppResult<Vec<f32>> {
    embed_with_timeout(provider, &[text.to_string()], timeout)
        .await?
        .pop()
        .ok_or_else(|| AppError::EmbeddingService("No embedding returned".to_string()))
}

fn as_embedding_error(err: AppError) -> AppError {
    match err {
        AppError::Timeout(_) | AppError::EmbeddingService(_) => err,
        other => AppError::EmbeddingService(other.to_string()),
    }
}
