use std::path::PathBuf;

use clap::{Parser, Subcommand};
use policy_navigator::Result;
use policy_navigator::commands::{run_add, run_ask, run_index, run_list, run_rebuild, run_status};
use policy_navigator::config::{run_interactive_config, show_config};

#[derive(Parser)]
#[command(name = "policy-navigator")]
#[command(about = "Answers questions about government policy documents and executive orders")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Configure Ollama connection and settings
    Config {
        /// Show current configuration
        #[arg(long)]
        show: bool,
    },
    /// Index any new documents in the documents directory
    Index,
    /// Rebuild the index from scratch
    Rebuild,
    /// Upload a document and index it
    Add {
        /// Path to a .csv, .pdf, .json, or .txt file
        file: PathBuf,
    },
    /// List all indexed documents
    List,
    /// Ask a question about the indexed policies
    Ask {
        /// The question to answer
        question: String,
    },
    /// Show index counts and service health
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Config { show } => {
            if show {
                show_config()?;
            } else {
                run_interactive_config()?;
            }
        }
        Commands::Index => {
            run_index().await?;
        }
        Commands::Rebuild => {
            run_rebuild().await?;
        }
        Commands::Add { file } => {
            run_add(&file).await?;
        }
        Commands::List => {
            run_list().await?;
        }
        Commands::Ask { question } => {
            run_ask(&question).await?;
        }
        Commands::Status => {
            run_status().await?;
        }
    }

    Ok(())
}
