//! docqa CLI
//!
//! Ingest plain-text documents and ask questions answered from them.

mod commands;

use clap::{Parser, Subcommand};
use commands::{AskCommand, IngestCommand, ListCommand, RetrieveCommand, StatusCommand};
use docqa_core::config::{AppConfig, ConfigOverrides};
use docqa_core::{logging, AppResult};
use std::path::PathBuf;

/// docqa - question answering over your own documents
#[derive(Parser, Debug)]
#[command(name = "docqa")]
#[command(about = "Question answering over local documents", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to workspace directory (default: current directory)
    #[arg(short, long, global = true, env = "DOCQA_WORKSPACE")]
    workspace: Option<PathBuf>,

    /// Path to config file
    #[arg(short, long, global = true, env = "DOCQA_CONFIG")]
    config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Enable verbose output (sets log level to debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    /// Emit logs as JSON lines on stderr
    #[arg(long, global = true)]
    log_json: bool,

    /// Answer generation provider (ollama, openai)
    #[arg(short, long, global = true, env = "DOCQA_PROVIDER")]
    provider: Option<String>,

    /// Answer generation model
    #[arg(short, long, global = true, env = "DOCQA_MODEL")]
    model: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Segment, embed and index documents
    Ingest(IngestCommand),

    /// Answer a question from indexed documents
    Ask(AskCommand),

    /// Show the chunks a question retrieves, without generating
    Retrieve(RetrieveCommand),

    /// Show whether documents have a committed index
    Status(StatusCommand),

    /// List indexed documents
    List(ListCommand),
}

impl Commands {
    fn name(&self) -> &'static str {
        match self {
            Self::Ingest(_) => "ingest",
            Self::Ask(_) => "ask",
            Self::Retrieve(_) => "retrieve",
            Self::Status(_) => "status",
            Self::List(_) => "list",
        }
    }
}

#[tokio::main]
async fn main() -> AppResult<()> {
    let cli = Cli::parse();

    let workspace = match cli.workspace {
        Some(workspace) => workspace,
        None => std::env::current_dir()?,
    };

    let config = AppConfig::load_from(&workspace, cli.config.clone())?.with_overrides(
        ConfigOverrides {
            workspace: None,
            config_file: cli.config,
            provider: cli.provider,
            model: cli.model,
            log_level: cli.log_level,
            verbose: cli.verbose,
            no_color: cli.no_color,
            log_json: cli.log_json,
        },
    );

    logging::init_logging(config.log_level.as_deref(), config.no_color, config.log_json)?;

    tracing::debug!("Workspace: {:?}", config.workspace);
    tracing::debug!("Provider: {}", config.provider);
    tracing::debug!("Model: {}", config.model);

    config.ensure_state_dir()?;

    let _span = tracing::info_span!("command", name = cli.command.name()).entered();

    let result = match cli.command {
        Commands::Ingest(cmd) => cmd.execute(&config).await,
        Commands::Ask(cmd) => cmd.execute(&config).await,
        Commands::Retrieve(cmd) => cmd.execute(&config).await,
        Commands::Status(cmd) => cmd.execute(&config),
        Commands::List(cmd) => cmd.execute(&config),
    };

    match &result {
        Ok(_) => tracing::debug!("Command completed successfully"),
        Err(e) => tracing::error!("Command failed: {}", e),
    }

    result
}
