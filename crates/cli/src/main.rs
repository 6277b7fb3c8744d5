//! docqa CLI
//!
//! Main entry point for the docqa command-line tool.
//! Answers questions from a passage corpus with a local language model.

mod commands;

use clap::{Parser, Subcommand};
use commands::{AskCommand, PromptCommand};
use docqa_core::config::{AppConfig, CliOverrides};
use docqa_core::{logging, AppResult};
use std::path::PathBuf;

/// docqa - question answering over retrieved passages
#[derive(Parser, Debug)]
#[command(name = "docqa")]
#[command(about = "Question answering over retrieved passages", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to workspace directory (default: current directory)
    #[arg(short, long, global = true, env = "DOCQA_WORKSPACE")]
    workspace: Option<PathBuf>,

    /// Path to config file
    #[arg(short, long, global = true, env = "DOCQA_CONFIG")]
    config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true, env = "RUST_LOG")]
    log_level: Option<String>,

    /// Enable verbose output (sets log level to debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    no_color: bool,

    /// LLM provider (ollama, mock)
    #[arg(short, long, global = true, env = "DOCQA_PROVIDER")]
    provider: Option<String>,

    /// Model identifier
    #[arg(short, long, global = true, env = "DOCQA_MODEL")]
    model: Option<String>,

    /// Answering strategy (stuff, refine)
    #[arg(long, global = true, env = "DOCQA_CHAIN_TYPE")]
    chain_type: Option<String>,

    /// Answer format (json, text)
    #[arg(long, global = true, env = "DOCQA_RESPONSE_FORMAT")]
    response_format: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Answer a question from the passage corpus
    Ask(AskCommand),

    /// Print the stuffed prompt for a question without calling the model
    Prompt(PromptCommand),
}

#[tokio::main]
async fn main() -> AppResult<()> {
    // Parse command-line arguments first (needed for logging config)
    let cli = Cli::parse();

    // Load configuration for the selected workspace
    let config = AppConfig::load_for(cli.workspace.clone(), cli.config.clone())?;

    // Apply CLI overrides
    let config = config.with_overrides(CliOverrides {
        workspace: cli.workspace,
        config_file: cli.config,
        provider: cli.provider,
        model: cli.model,
        chain_type: cli.chain_type,
        response_format: cli.response_format,
        log_level: cli.log_level,
        verbose: cli.verbose,
        no_color: cli.no_color,
    });

    // Initialize logging with final configuration
    logging::init_logging(config.log_level.as_deref(), config.no_color)?;

    tracing::info!("docqa starting");
    tracing::debug!("Workspace: {:?}", config.workspace);
    tracing::debug!("Provider: {}", config.provider);
    tracing::debug!("Model: {}", config.model);
    tracing::debug!("QA settings: {:?}", config.qa);

    config.validate()?;

    let command_name = match &cli.command {
        Commands::Ask(_) => "ask",
        Commands::Prompt(_) => "prompt",
    };
    let _span = tracing::info_span!("command", name = command_name).entered();

    // Route to command handlers
    let result = match cli.command {
        Commands::Ask(cmd) => cmd.execute(&config).await,
        Commands::Prompt(cmd) => cmd.execute(&config).await,
    };

    match &result {
        Ok(_) => tracing::info!("Command completed successfully"),
        Err(e) => tracing::error!("Command failed: {}", e),
    }

    result
}
