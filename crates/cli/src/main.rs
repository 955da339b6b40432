//! AgentFlow CLI — the main entry point.
//!
//! Commands:
//! - `onboard` — Write a default config to `~/.agentflow/config.toml`
//! - `chat`    — Talk to a configured agent, one-shot or interactively
//! - `list`    — Show configured agents, flows, connections and tools

use clap::{Parser, Subcommand};

mod commands;
mod runtime;

#[derive(Parser)]
#[command(
    name = "agentflow",
    about = "AgentFlow — configurable tool-using LLM agents",
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
    /// Create the default configuration file
    Onboard,

    /// Chat with an agent
    Chat {
        /// Agent to talk to (defaults to `default_agent` from the config)
        #[arg(short, long)]
        agent: Option<String>,

        /// Send these messages as one conversation instead of entering interactive mode
        #[arg(short, long)]
        message: Vec<String>,

        /// Print the full conversation after each reply
        #[arg(long)]
        transcript: bool,
    },

    /// List configured agents, flows, connections and tools
    List,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // A missing .env is fine
    dotenv::dotenv().ok();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();

    match cli.command {
        Commands::Onboard => commands::onboard::run().await?,
        Commands::Chat {
            agent,
            message,
            transcript,
        } => commands::chat::run(agent, message, transcript).await?,
        Commands::List => commands::list::run().await?,
    }

    Ok(())
}
