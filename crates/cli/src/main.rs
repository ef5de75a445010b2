//! Askbook CLI: the main entry point.
//!
//! Commands:
//! - `serve`  : Start the HTTP API server
//! - `ask`    : Ask the book a question
//! - `lucky`  : Ask a random configured question
//! - `corpus` : Load and validate the corpus files
//! - `config` : Print the default configuration
//! - `doctor` : Diagnose configuration, corpus and provider health

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "askbook",
    about = "Askbook — ask a book questions, answered from its own pages",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file (defaults to ~/.askbook/config.toml)
    #[arg(short, long, global = true, env = "ASKBOOK_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP API server
    Serve {
        /// Override the port
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Ask the book a question
    Ask {
        /// The question
        question: String,

        /// Also print the context that was sent to the model
        #[arg(long)]
        show_context: bool,
    },

    /// Ask one of the configured "lucky" questions
    Lucky,

    /// Load and validate the corpus
    Corpus {
        /// Sections CSV (overrides config)
        #[arg(long)]
        sections: Option<PathBuf>,

        /// Embeddings CSV (overrides config)
        #[arg(long)]
        embeddings: Option<PathBuf>,
    },

    /// Print the default configuration
    Config,

    /// Diagnose system health
    Doctor,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config_path = cli.config.as_deref();

    match cli.command {
        Commands::Serve { port } => commands::serve::run(config_path, port).await?,
        Commands::Ask {
            question,
            show_context,
        } => commands::ask::run(config_path, &question, show_context).await?,
        Commands::Lucky => commands::ask::lucky(config_path).await?,
        Commands::Corpus {
            sections,
            embeddings,
        } => commands::corpus::run(config_path, sections, embeddings).await?,
        Commands::Config => commands::config_cmd::show(),
        Commands::Doctor => commands::doctor::run(config_path).await?,
    }

    Ok(())
}
