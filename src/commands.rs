use std::path::Path;

use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use crate::answer::{SourceKind, answer_question};
use crate::config::{Config, get_config_dir};
use crate::embeddings::ollama::OllamaClient;
use crate::federal_register::FederalRegisterClient;
use crate::indexer::{IndexingService, IndexingStats};
use crate::{PolicyError, Result};

fn load_config() -> Result<Config> {
    let config_dir = get_config_dir().map_err(|e| PolicyError::Config(e.to_string()))?;
    Ok(Config::load(config_dir)?)
}

async fn build_service(config: &Config) -> Result<IndexingService<OllamaClient>> {
    let client = OllamaClient::new(&config.ollama)?;
    IndexingService::new(config, client).await
}

fn spinner(message: &'static str) -> ProgressBar {
    let bar = if console::user_attended_stderr() {
        ProgressBar::new_spinner().with_style(
            ProgressStyle::with_template("{spinner} {msg}").expect("style template is valid"),
        )
    } else {
        ProgressBar::hidden()
    };
    bar.set_message(message);
    bar.enable_steady_tick(std::time::Duration::from_millis(100));
    bar
}

fn print_stats(stats: &IndexingStats) {
    println!("Indexed {} documents ({} chunks)", stats.files_indexed, stats.chunks_created);
    if stats.files_skipped > 0 {
        println!("Skipped {} documents", stats.files_skipped);
    }
    if stats.errors_encountered > 0 {
        println!("{} documents failed; see logs for details", stats.errors_encountered);
    }
}

/// Index any new documents in the documents directory
#[inline]
pub async fn run_index() -> Result<()> {
    let config = load_config()?;
    let service = build_service(&config).await?;

    info!("Indexing documents from {}", config.documents_dir_path().display());
    let bar = spinner("Indexing documents...");
    let stats = service.build_or_load().await;
    bar.finish_and_clear();

    print_stats(&stats?);
    Ok(())
}

/// Rebuild the whole index from scratch
#[inline]
pub async fn run_rebuild() -> Result<()> {
    let config = load_config()?;
    let service = build_service(&config).await?;

    let bar = spinner("Rebuilding index...");
    let stats = service.rebuild().await;
    bar.finish_and_clear();

    println!("Knowledge base rebuilt.");
    print_stats(&stats?);
    Ok(())
}

/// Copy a file into the uploads directory and index it
#[inline]
pub async fn run_add(file: &Path) -> Result<()> {
    let config = load_config()?;
    let service = build_service(&config).await?;

    let bar = spinner("Indexing document...");
    let added = service.add_file(file).await;
    bar.finish_and_clear();

    let added = added?;
    let name = added.stored_path.file_name().and_then(|n| n.to_str()).unwrap_or_default();
    if added.already_indexed {
        println!("'{}' is already indexed.", name);
    } else if added.chunks_added == 0 {
        println!("'{}' contained no indexable text; nothing was added.", name);
    } else {
        println!(
            "'{}' was uploaded and indexed successfully ({} chunks).",
            name, added.chunks_added
        );
    }
    Ok(())
}

/// List all indexed documents
#[inline]
pub async fn run_list() -> Result<()> {
    let config = load_config()?;
    let service = build_service(&config).await?;

    let documents = service.indexed_documents().await;
    if documents.is_empty() {
        println!("No documents have been indexed yet.");
        println!("Use 'policy-navigator index' or 'policy-navigator add <file>' to index documents.");
        return Ok(());
    }

    println!("Indexed Documents ({} total):", documents.len());
    for name in documents {
        println!("  {}", name);
    }
    Ok(())
}

/// Answer a question against the index and the Federal Register
#[inline]
pub async fn run_ask(question: &str) -> Result<()> {
    let config = load_config()?;
    let service = build_service(&config).await?;
    let generator = OllamaClient::new(&config.ollama)?;
    let federal_register = FederalRegisterClient::new(&config.federal_register)?;

    let bar = spinner("Thinking...");
    let answer = answer_question(&service, &generator, &federal_register, question).await;
    bar.finish_and_clear();

    let answer = match answer {
        Ok(answer) => answer,
        Err(PolicyError::EmbeddingUnavailable(e)) => {
            println!("The embedding service is unavailable; please try again later.");
            return Err(PolicyError::EmbeddingUnavailable(e));
        }
        Err(e) => return Err(e),
    };

    println!("{}", answer.text);
    if !answer.sources.is_empty() {
        println!();
        println!("Sources:");
        for source in &answer.sources {
            let kind = match source.kind {
                SourceKind::Document => "Document",
                SourceKind::Api => "API",
            };
            println!("  {} ({})", source.name, kind);
        }
    }
    Ok(())
}

/// Show index counts and embedding-service health
#[inline]
pub async fn run_status() -> Result<()> {
    let config = load_config()?;

    println!("Policy Navigator Status");
    println!("{}", "=".repeat(50));
    println!();

    println!("Ollama:");
    match OllamaClient::new(&config.ollama) {
        Ok(client) => match client.health_check() {
            Ok(()) => {
                println!("  Connected ({}:{})", config.ollama.host, config.ollama.port);
                println!("  Embedding model: {}", config.ollama.embedding_model);
                println!("  Generation model: {}", config.ollama.generation_model);
            }
            Err(e) => println!("  Connected but unhealthy: {}", e),
        },
        Err(e) => println!("  Failed to connect: {}", e),
    }
    println!();

    println!("Vector store:");
    match build_service(&config).await {
        Ok(service) => {
            println!("  Documents: {}", service.document_count().await);
            match service.chunk_count().await {
                Ok(chunks) => println!("  Chunks: {}", chunks),
                Err(e) => println!("  Chunks: unavailable ({})", e),
            }
        }
        Err(e) => println!("  Failed to open: {}", e),
    }

    Ok(())
}
