//! Pipeline configuration.
//!
//! Stored as YAML at `<workspace>/.docqa/pipeline.yaml`. Every field has a
//! default, so a missing file or a partial one is fine.

use crate::embeddings::EmbeddingConfig;
use crate::ingest::IngestOptions;
use crate::progress::ProgressReporter;
use crate::rag::AnswerOptions;
use crate::retrieve::{RetrieveOptions, DEFAULT_CONCURRENCY, DEFAULT_FINAL_K, DEFAULT_PER_DOC_K};
use crate::segment::{SegmentOptions, DEFAULT_MAX_WORDS, DEFAULT_OVERLAP_WORDS};
use crate::store::IndexStore;
use crate::types::RescoreMode;
use docqa_core::config::STATE_DIR;
use docqa_core::{AppError, AppResult};
use docqa_prompt::DEFAULT_ANSWER_PROMPT_ID;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

const CONFIG_FILE: &str = "pipeline.yaml";

/// Settings for segmenting, embedding, storing and answering.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PipelineConfig {
    /// Index store root, relative to the workspace unless absolute
    pub store_dir: PathBuf,

    pub max_words: usize,
    pub overlap_words: usize,
    pub per_doc_k: usize,
    pub final_k: usize,

    /// Documents processed at the same time
    pub concurrency: usize,

    pub embedding: EmbeddingConfig,
    pub generation: GenerationConfig,
    pub rescore: RescoreMode,
    pub min_score: Option<f32>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            store_dir: PathBuf::from(STATE_DIR).join("vectors"),
            max_words: DEFAULT_MAX_WORDS,
            overlap_words: DEFAULT_OVERLAP_WORDS,
            per_doc_k: DEFAULT_PER_DOC_K,
            final_k: DEFAULT_FINAL_K,
            concurrency: DEFAULT_CONCURRENCY,
            embedding: EmbeddingConfig::default(),
            generation: GenerationConfig::default(),
            rescore: RescoreMode::default(),
            min_score: None,
        }
    }
}

/// Answer generation settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GenerationConfig {
    pub timeout_secs: u64,
    pub temperature: f32,
    pub max_tokens: Option<u32>,
    pub prompt_id: String,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 60,
            temperature: 0.2,
            max_tokens: Some(512),
            prompt_id: DEFAULT_ANSWER_PROMPT_ID.to_string(),
        }
    }
}

impl GenerationConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl PipelineConfig {
    /// Check values that would otherwise fail deep inside the pipeline.
    pub fn validate(&self) -> AppResult<()> {
        let positive = [
            ("max_words", self.max_words),
            ("per_doc_k", self.per_doc_k),
            ("final_k", self.final_k),
            ("concurrency", self.concurrency),
            ("embedding.dimensions", self.embedding.dimensions),
            ("embedding.batch_size", self.embedding.batch_size),
        ];
        for (name, value) in positive {
            if value == 0 {
                return Err(AppError::Config(format!("{} must be at least 1", name)));
            }
        }

        if self.generation.timeout_secs == 0 || self.embedding.timeout_secs == 0 {
            return Err(AppError::Config("timeouts must be at least 1 second".to_string()));
        }

        if let Some(min) = self.min_score {
            if !(-1.0..=1.0).contains(&min) {
                return Err(AppError::Config(format!(
                    "min_score must be within [-1, 1], got {}",
                    min
                )));
            }
        }

        Ok(())
    }

    pub fn store_path(&self, workspace: &Path) -> PathBuf {
        if self.store_dir.is_absolute() {
            self.store_dir.clone()
        } else {
            workspace.join(&self.store_dir)
        }
    }

    pub fn open_store(&self, workspace: &Path) -> IndexStore {
        IndexStore::new(self.store_path(workspace))
    }

    pub fn segment_options(&self) -> SegmentOptions {
        SegmentOptions::new(self.max_words, self.overlap_words)
    }

    pub fn retrieve_options(&self) -> RetrieveOptions {
        RetrieveOptions {
            per_doc_k: self.per_doc_k,
            final_k: self.final_k,
            concurrency: self.concurrency,
            rescore: self.rescore,
            min_score: self.min_score,
            embed_timeout: self.embedding.timeout(),
        }
    }

    pub fn ingest_options(&self, progress: ProgressReporter) -> IngestOptions {
        IngestOptions {
            segment: self.segment_options(),
            batch_size: self.embedding.batch_size,
            embed_timeout: self.embedding.timeout(),
            concurrency: self.concurrency,
            progress,
        }
    }

    pub fn answer_options(&self) -> AnswerOptions {
        AnswerOptions {
            retrieve: self.retrieve_options(),
            generation_timeout: self.generation.timeout(),
        }
    }
}

/// Load the pipeline configuration, or defaults when no file exists.
pub fn load_config(workspace: &Path) -> AppResult<PipelineConfig> {
    let config_path = get_config_path(workspace);

    if !config_path.exists() {
        tracing::debug!("No pipeline config at {:?}, using defaults", config_path);
        return Ok(PipelineConfig::default());
    }

    let content = fs::read_to_string(&config_path).map_err(|e| {
        AppError::Config(format!("Failed to read config at {:?}: {}", config_path, e))
    })?;

    let config: PipelineConfig = serde_yaml::from_str(&content).map_err(|e| {
        AppError::Config(format!("Failed to parse config at {:?}: {}", config_path, e))
    })?;

    config.validate()?;
    tracing::debug!("Loaded pipeline config from {:?}", config_path);
    Ok(config)
}

/// Write the pipeline configuration, creating the state directory.
pub fn save_config(workspace: &Path, config: &PipelineConfig) -> AppResult<()> {
    let config_path = get_config_path(workspace);

    if let Some(parent) = config_path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| AppError::Config(format!("Failed to create config directory: {}", e)))?;
    }

    let yaml = serde_yaml::to_string(config)
        .map_err(|e| AppError::Serialization(format!("Failed to serialize config: {}", e)))?;

    fs::write(&config_path, yaml).map_err(|e| {
        AppError::Config(format!("Failed to write config to {:?}: {}", config_path, e))
    })?;

    tracing::debug!("Saved pipeline config to {:?}", config_path);
    Ok(())
}

pub fn get_config_path(workspace: &Path) -> PathBuf {
    workspace.join(STATE_DIR).join(CONFIG_FILE)
}
