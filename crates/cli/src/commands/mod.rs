//! Command handlers for the docqa CLI.

pub mod ask;
pub mod ingest;
pub mod retrieve;
pub mod status;

pub use ask::AskCommand;
pub use ingest::IngestCommand;
pub use retrieve::RetrieveCommand;
pub use status::{ListCommand, StatusCommand};

use clap::Args;
use docqa_core::config::AppConfig;
use docqa_core::{AppError, AppResult};
use docqa_retrieval::{create_provider, load_config, EmbeddingProvider, IndexStore, PipelineConfig};
use serde::Serialize;
use std::sync::Arc;

/// Documents a question is asked against.
#[derive(Args, Debug)]
pub struct DocSelection {
    /// Document id to search (repeatable)
    #[arg(long = "doc", value_name = "ID", required_unless_present = "all")]
    pub docs: Vec<String>,

    /// Search every indexed document
    #[arg(long, conflicts_with = "docs")]
    pub all: bool,
}

impl DocSelection {
    pub fn resolve(&self, store: &IndexStore) -> AppResult<Vec<String>> {
        if self.all {
            store.list()
        } else {
            Ok(self.docs.clone())
        }
    }
}

/// Pipeline settings and the store they point at.
pub struct Pipeline {
    pub config: PipelineConfig,
    pub store: IndexStore,
}

impl Pipeline {
    pub fn load(app: &AppConfig) -> AppResult<Self> {
        let config = load_config(&app.workspace)?;
        let store = config.open_store(&app.workspace);
        tracing::debug!("Index store: {:?}", store.root());
        Ok(Self { config, store })
    }

    pub fn embedder(&self) -> AppResult<Arc<dyn EmbeddingProvider>> {
        create_provider(&self.config.embedding)
    }
}

/// Print `value` as pretty JSON on stdout.
pub fn print_json<T: Serialize>(value: &T) -> AppResult<()> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| AppError::Serialization(e.to_string()))?;
    println!("{}", json);
    Ok(())
}

/// Shorten `text` to at most `max_chars` characters for display.
pub fn snippet(text: &str, max_chars: usize) -> String {
    let flat = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= max_chars {
        return flat;
    }
    let cut: String = flat.chars().take(max_chars.saturating_sub(3)).collect();
    format!("{}...", cut.trim_end())
}
