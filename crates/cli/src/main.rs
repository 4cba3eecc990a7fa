//! repochat CLI, the main entry point.
//!
//! Commands:
//! - `chat`    Interactive chat or single-message mode
//! - `tools`   Print the tool catalog
//! - `config`  Print the effective configuration

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;

#[derive(Parser)]
#[command(
    name = "repochat",
    about = "Chat with a language model that can read the repository you are in",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Chat about a repository
    Chat {
        /// Send a single message instead of entering interactive mode
        #[arg(short, long)]
        message: Option<String>,

        /// Repository the tools may read (default: tools.root from config)
        #[arg(short, long)]
        root: Option<PathBuf>,

        /// Override the configured model
        #[arg(long)]
        model: Option<String>,
    },

    /// List the tools the model can call
    Tools {
        #[arg(short, long)]
        root: Option<PathBuf>,
    },

    /// Print the effective configuration as TOML
    Config,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Logs go to stderr so they never interleave with answers on stdout
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Chat { message, root, model } => commands::chat::run(message, root, model).await?,
        Commands::Tools { root } => commands::tools::run(root)?,
        Commands::Config => commands::config::run()?,
    }

    Ok(())
}
