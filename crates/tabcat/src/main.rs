//! tabcat: categorize CSV data with an AI model from the terminal.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tabcat::commands;
use tabcat_core::{GeminiClient, TabcatConfig};
use tracing::debug;

#[derive(Parser)]
#[command(name = "tabcat")]
#[command(about = "AI-assisted CSV categorization", long_about = None)]
#[command(version)]
struct Cli {
    /// Override the configured model id
    #[arg(long, global = true)]
    model: Option<String>,

    /// Request timeout in seconds
    #[arg(long, global = true)]
    timeout: Option<u64>,

    /// Retry timed-out requests up to N times (timeouts only)
    #[arg(long, global = true, value_name = "N")]
    retry_timeouts: Option<u32>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Ask the model to suggest category labels for a CSV file
    Suggest { file: PathBuf },

    /// Assign a category to every row and write the categorized CSV
    Assign {
        file: PathBuf,

        /// File with one category label per line; the last label is the fallback
        #[arg(long)]
        categories_file: Option<PathBuf>,

        /// Category label (repeatable); the last one is the fallback
        #[arg(long = "category")]
        categories: Vec<String>,

        /// Output path (default: categorized_<input name> beside the input)
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Parse a CSV file offline and report whether it fits the prompt budget
    Check { file: PathBuf },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();

    let mut config = TabcatConfig::load()?;
    if let Some(model) = cli.model {
        config.model.model = model;
    }
    if let Some(timeout) = cli.timeout {
        config.model.timeout_secs = timeout;
    }
    if let Some(retries) = cli.retry_timeouts {
        config.retry.timeout_retries = retries;
    }
    debug!(
        "using model {} with {}s timeout",
        config.model.model, config.model.timeout_secs
    );

    match cli.command {
        Commands::Suggest { file } => {
            let gateway = GeminiClient::new(config.gateway_config())?;
            commands::suggest(&gateway, &config, &file).await
        }
        Commands::Assign {
            file,
            categories_file,
            categories,
            output,
        } => {
            let vocabulary = commands::read_categories(categories_file.as_deref(), &categories)?;
            let gateway = GeminiClient::new(config.gateway_config())?;
            commands::assign(&gateway, &config, &file, vocabulary, output).await?;
            Ok(())
        }
        Commands::Check { file } => commands::check(&config, &file),
    }
}
