//! homeclaw CLI: the main entry point.
//!
//! Commands:
//! - `onboard`: Write the default config file
//! - `chat`: Interactive or single-message chat with the home assistant
//! - `prompt`: Show the system prompt a turn would send
//! - `memory`: Show, clear or delete the long-term memory file
//! - `doctor`: Diagnose config and credentials
//! - `models`: List known chat models

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;

#[derive(Parser)]
#[command(
    name = "homeclaw",
    about = "homeclaw — a tool-calling home automation assistant",
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
    /// Initialize configuration
    Onboard,

    /// Chat with the assistant
    Chat {
        /// Send a single message instead of entering interactive mode
        #[arg(short, long)]
        message: Option<String>,

        /// Attach a file (image or PDF) to the message
        #[arg(long = "attach", value_name = "PATH")]
        attachments: Vec<PathBuf>,

        /// Only describe devices in these areas
        #[arg(long = "area", value_name = "AREA")]
        areas: Vec<String>,
    },

    /// Print the system prompt that would be sent
    Prompt {
        /// Override the configured personality (formal, friendly, concise)
        #[arg(long)]
        personality: Option<String>,

        /// Override the configured output language (en, fr, it, de, es)
        #[arg(long)]
        language: Option<String>,
    },

    /// Inspect or reset long-term memory
    Memory {
        #[command(subcommand)]
        action: MemoryAction,
    },

    /// Diagnose config and credentials
    Doctor,

    /// List known chat models
    Models,
}

#[derive(Subcommand)]
enum MemoryAction {
    /// Show remembered preferences and recent requests
    Show,

    /// Forget everything but keep the file
    Clear,

    /// Remove the memory file
    Delete {
        /// Skip the confirmation notice
        #[arg(long)]
        yes: bool,
    },
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

    match cli.command {
        Commands::Onboard => commands::onboard::run().await?,
        Commands::Chat {
            message,
            attachments,
            areas,
        } => commands::chat::run(message, attachments, areas).await?,
        Commands::Prompt {
            personality,
            language,
        } => commands::prompt::run(personality, language).await?,
        Commands::Memory { action } => match action {
            MemoryAction::Show => commands::memory::show().await?,
            MemoryAction::Clear => commands::memory::clear().await?,
            MemoryAction::Delete { yes } => commands::memory::delete(yes).await?,
        },
        Commands::Doctor => commands::doctor::run().await?,
        Commands::Models => commands::models::run().await?,
    }

    Ok(())
}
