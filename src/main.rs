//! cloud-tutor - terminal client for the cloud tutoring assistant
//!
//! Ask questions about cloud services, attach console screenshots and work
//! through practice questions, from a TUI or one-shot commands.

mod api;
mod config;
mod models;
mod session;
mod tui;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use api::practice::{Difficulty, PracticeRequest};
use config::Config;
use tui::log_pane::LogBuffer;

#[derive(Parser)]
#[command(name = "cloud-tutor")]
#[command(about = "Terminal client for the cloud tutoring assistant", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Backend base URL (overrides config file and CLOUD_TUTOR_API_URL)
    #[arg(long, global = true)]
    api_url: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Launch the terminal user interface (default)
    Tui,

    /// Ask a single question and print the answer
    Ask {
        /// Question text (may be empty when an image is given)
        #[arg(default_value = "")]
        message: String,

        /// Screenshot to attach
        #[arg(short, long)]
        image: Option<PathBuf>,
    },

    /// Fetch a practice question and answer it
    Practice {
        /// Service to ask about (random when omitted)
        #[arg(short, long)]
        service: Option<String>,

        /// Question difficulty
        #[arg(short, long, value_enum, default_value_t = Difficulty::Beginner)]
        difficulty: Difficulty,

        /// Narrow the question to a topic
        #[arg(short, long)]
        topic: Option<String>,
    },

    /// Check that the backend is reachable
    Health,

    /// List the services the assistant knows about
    Services,

    /// Show or update stored configuration
    Config {
        /// Store a new backend URL
        #[arg(long)]
        set_api_url: Option<String>,

        /// Store a new request timeout in seconds
        #[arg(long)]
        set_timeout: Option<u64>,
    },
}

fn env_filter(verbose: bool) -> EnvFilter {
    let default = if verbose { "debug" } else { "info" };
    EnvFilter::try_from_default_env().unwrap_or_else(|_| default.into())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let command = cli.command.unwrap_or(Commands::Tui);

    // The TUI owns the terminal, so its logs go to the in-app log pane.
    let logs = LogBuffer::new();
    if matches!(command, Commands::Tui) {
        tracing_subscriber::registry()
            .with(env_filter(cli.verbose))
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(false)
                    .with_ansi(false)
                    .with_writer(logs.clone()),
            )
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter(cli.verbose))
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(false)
                    .with_writer(std::io::stderr),
            )
            .init();
    }

    match command {
        Commands::Tui => {
            let config = Config::resolve(cli.api_url)?;
            tui::run(config, logs).await?;
        }
        Commands::Ask { message, image } => {
            let config = Config::resolve(cli.api_url)?;
            api::ask(&config, &message, image.as_deref()).await?;
        }
        Commands::Practice {
            service,
            difficulty,
            topic,
        } => {
            let config = Config::resolve(cli.api_url)?;
            let request = PracticeRequest {
                service,
                difficulty,
                topic,
            };
            api::practice(&config, &request).await?;
        }
        Commands::Health => {
            let config = Config::resolve(cli.api_url)?;
            api::health(&config).await?;
        }
        Commands::Services => {
            let config = Config::resolve(cli.api_url)?;
            api::list_services(&config).await?;
        }
        Commands::Config {
            set_api_url,
            set_timeout,
        } => {
            config::show_or_update(set_api_url, set_timeout)?;
        }
    }

    Ok(())
}
