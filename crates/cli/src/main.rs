//! promptops CLI
//!
//! Main entry point for the promptops command-line tool.
//! Validates, diffs and deploys local prompt documents to a prompt service.

mod commands;

use clap::{Parser, Subcommand};
use commands::{DeployCommand, DiffCommand, DocumentsCommand, ShowCommand, ValidateCommand};
use promptops_core::{config::AppConfig, logging, AppResult};
use std::path::PathBuf;
use std::process::ExitCode;

/// promptops - validate and deploy prompt documents
#[derive(Parser, Debug)]
#[command(name = "promptops")]
#[command(about = "Validate, diff and deploy prompt documents", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to workspace directory (default: current directory)
    #[arg(short, long, global = true, env = "PROMPTOPS_WORKSPACE")]
    workspace: Option<PathBuf>,

    /// Path to config file (default: <workspace>/.promptops/config.yaml)
    #[arg(short, long, global = true, env = "PROMPTOPS_CONFIG")]
    config: Option<PathBuf>,

    /// Prompt service base URL
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Remote project identifier
    #[arg(long, global = true)]
    project_id: Option<String>,

    /// Bearer credential for the prompt service
    #[arg(long, global = true)]
    api_key: Option<String>,

    /// Request timeout in seconds
    #[arg(long, global = true)]
    timeout: Option<u64>,

    /// Client backend (http, memory)
    #[arg(long, global = true, env = "PROMPTOPS_BACKEND", default_value = "http")]
    backend: String,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true, env = "RUST_LOG")]
    log_level: Option<String>,

    /// Enable verbose output (sets log level to debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    no_color: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Validate local prompt documents
    Validate(ValidateCommand),

    /// Show the changes a deploy would apply
    Diff(DiffCommand),

    /// Deploy local prompt documents
    Deploy(DeployCommand),

    /// List the documents of a remote version
    Documents(DocumentsCommand),

    /// Print a remote document
    Show(ShowCommand),
}

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run() -> AppResult<()> {
    // Parse command-line arguments first (needed for logging config)
    let cli = Cli::parse();

    // Load configuration from the environment and config file
    let config = AppConfig::load_from(cli.workspace, cli.config)?;

    // Apply CLI overrides
    let config = config.with_overrides(
        None,
        cli.base_url,
        cli.project_id,
        cli.api_key,
        cli.timeout,
        cli.log_level,
        cli.verbose,
        cli.no_color,
    );

    // Initialize logging with final configuration
    logging::init_logging(config.log_level.as_deref(), config.no_color)?;

    tracing::info!("promptops starting");
    tracing::debug!("Workspace: {:?}", config.workspace);
    tracing::debug!("Backend: {}", cli.backend);

    let command_name = match &cli.command {
        Commands::Validate(_) => "validate",
        Commands::Diff(_) => "diff",
        Commands::Deploy(_) => "deploy",
        Commands::Documents(_) => "documents",
        Commands::Show(_) => "show",
    };
    let _span = tracing::info_span!("command", name = command_name).entered();

    // Route to command handlers
    let result = match cli.command {
        Commands::Validate(cmd) => cmd.execute(&config).await,
        Commands::Diff(cmd) => cmd.execute(&config, &cli.backend).await,
        Commands::Deploy(cmd) => cmd.execute(&config, &cli.backend).await,
        Commands::Documents(cmd) => cmd.execute(&config, &cli.backend).await,
        Commands::Show(cmd) => cmd.execute(&config, &cli.backend).await,
    };

    match &result {
        Ok(_) => tracing::info!("Command completed successfully"),
        Err(e) => tracing::error!("Command failed: {}", e.code()),
    }

    result
}
