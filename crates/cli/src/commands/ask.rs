//! Ask command handler.
//!
//! Retrieves chunks from the selected documents and generates an answer.

use super::{print_json, snippet, DocSelection, Pipeline};
use clap::Args;
use docqa_core::{config::AppConfig, AppResult};
use docqa_llm::create_client;
use docqa_prompt::load_prompt;
use docqa_retrieval::{answer_question, AnswerOutcome, AnswerResponse, LlmAnswerGenerator};

const SNIPPET_CHARS: usize = 150;

/// Answer a question from indexed documents
#[derive(Args, Debug)]
pub struct AskCommand {
    /// The question to ask
    pub question: String,

    #[command(flatten)]
    pub selection: DocSelection,

    /// Candidates shortlisted per document
    #[arg(long)]
    pub per_doc_k: Option<usize>,

    /// Chunks handed to the generator
    #[arg(long)]
    pub final_k: Option<usize>,

    /// Prompt definition id (default from pipeline config)
    #[arg(long)]
    pub prompt: Option<String>,

    /// Maximum tokens in response
    #[arg(long)]
    pub max_tokens: Option<u32>,

    /// Temperature for response generation (0.0-2.0)
    #[arg(long)]
    pub temperature: Option<f32>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl AskCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing ask command");
        config.validate()?;

        let pipeline = Pipeline::load(config)?;
        let embedder = pipeline.embedder()?;
        let doc_ids = self.selection.resolve(&pipeline.store)?;

        let generation = &pipeline.config.generation;
        let prompt_id = self.prompt.as_deref().unwrap_or(&generation.prompt_id);
        let prompt = load_prompt(&config.workspace, prompt_id)?;

        let endpoint = config.resolve_endpoint(&config.provider);
        let api_key = config.resolve_api_key(&config.provider);
        let client = create_client(
            &config.provider,
            endpoint.as_deref(),
            api_key.as_deref(),
            Some(generation.timeout()),
        )?;

        let mut generator = LlmAnswerGenerator::new(client, &config.model, prompt)
            .with_temperature(self.temperature.unwrap_or(generation.temperature));
        if let Some(max_tokens) = self.max_tokens.or(generation.max_tokens) {
            generator = generator.with_max_tokens(max_tokens);
        }

        let mut options = pipeline.config.answer_options();
        if let Some(per_doc_k) = self.per_doc_k {
            options.retrieve.per_doc_k = per_doc_k;
        }
        if let Some(final_k) = self.final_k {
            options.retrieve.final_k = final_k;
        }

        let response = answer_question(
            &pipeline.store,
            embedder.as_ref(),
            &generator,
            &self.question,
            &doc_ids,
            &options,
        )
        .await?;

        if self.json {
            print_json(&response)
        } else {
            print_answer(&response);
            Ok(())
        }
    }
}

fn print_answer(response: &AnswerResponse) {
    match (&response.outcome, &response.answer) {
        (AnswerOutcome::GenerationFailed { reason, .. }, _) => {
            println!("Answer generation failed: {}", reason);
            println!();
            println!("Retrieved passages:");
            for (i, chunk) in response.chunks.iter().enumerate() {
                println!("  [{}] {}", i + 1, snippet(&chunk.text, SNIPPET_CHARS));
            }
        }
        (_, Some(answer)) => println!("{}", answer),
        (_, None) => {}
    }

    if !response.sources.is_empty() {
        println!();
        println!("Sources:");
        for source in &response.sources {
            println!("  - {}", source);
        }
    }

    if let Some(confidence) = response.confidence {
        tracing::debug!(
            "Confidence: {:.3} (low: {})",
            confidence,
            response.low_confidence
        );
    }

    report_unusable(&response.not_found_ids, &response.corrupt_ids);
}

/// Tell the user about documents that could not be searched.
pub fn report_unusable(not_found_ids: &[String], corrupt_ids: &[String]) {
    if !not_found_ids.is_empty() {
        eprintln!("Not indexed: {}", not_found_ids.join(", "));
    }
    if !corrupt_ids.is_empty() {
        eprintln!(
            "Corrupt index, re-ingest required: {}",
            corrupt_ids.join(", ")
        );
    }
}
