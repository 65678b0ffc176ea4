//! Retrieve command handler.

use super::ask::report_unusable;
use super::{print_json, snippet, DocSelection, Pipeline};
use clap::Args;
use docqa_core::{config::AppConfig, AppResult};
use docqa_retrieval::{retrieve, RescoreMode, RetrievalStatus};

const SNIPPET_CHARS: usize = 120;

/// Show the chunks a question retrieves, without generating
#[derive(Args, Debug)]
pub struct RetrieveCommand {
    /// The question to retrieve for
    pub question: String,

    #[command(flatten)]
    pub selection: DocSelection,

    /// Candidates shortlisted per document
    #[arg(long)]
    pub per_doc_k: Option<usize>,

    /// Chunks to return
    #[arg(long)]
    pub final_k: Option<usize>,

    /// Re-scoring source (stored_vectors, re_embed)
    #[arg(long, value_parser = parse_rescore)]
    pub rescore: Option<RescoreMode>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

fn parse_rescore(value: &str) -> Result<RescoreMode, String> {
    RescoreMode::parse(value)
        .ok_or_else(|| format!("unknown rescore mode '{}', expected stored_vectors or re_embed", value))
}

impl RetrieveCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing retrieve command");

        let pipeline = Pipeline::load(config)?;
        let embedder = pipeline.embedder()?;
        let doc_ids = self.selection.resolve(&pipeline.store)?;

        let mut options = pipeline.config.retrieve_options();
        if let Some(per_doc_k) = self.per_doc_k {
            options.per_doc_k = per_doc_k;
        }
        if let Some(final_k) = self.final_k {
            options.final_k = final_k;
        }
        if let Some(rescore) = self.rescore {
            options.rescore = rescore;
        }

        let retrieval = retrieve(
            &pipeline.store,
            embedder.as_ref(),
            &self.question,
            &doc_ids,
            &options,
        )
        .await?;

        if self.json {
            return print_json(&retrieval);
        }

        if retrieval.status() == RetrievalStatus::NoRelevantData {
            println!("No relevant data found.");
        }
        for (i, candidate) in retrieval.candidates.iter().enumerate() {
            println!(
                "{}. [{:.3}] {}#{}  {}",
                i + 1,
                candidate.score,
                candidate.doc_id,
                candidate.position,
                snippet(&candidate.text, SNIPPET_CHARS)
            );
        }
        for failure in &retrieval.failures {
            eprintln!("Search failed for {}: {}", failure.doc_id, failure.error);
        }
        report_unusable(&retrieval.not_found_ids, &retrieval.corrupt_ids);

        Ok(())
    }
}
