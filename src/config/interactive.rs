use anyhow::{Context, Result};
use console::style;
use dialoguer::{Confirm, Input};

use super::{Config, OllamaConfig, get_config_dir};
use crate::embeddings::ollama::OllamaClient;

#[inline]
pub fn run_interactive_config() -> Result<()> {
    println!(
        "{}",
        style("🔧 Policy Navigator Configuration Setup").bold().cyan()
    );
    println!();

    let mut config = load_existing_config()?;

    println!("{}", style("Ollama Configuration").bold().yellow());
    println!("Configure your local Ollama instance for embedding and answer generation.");
    println!();

    configure_ollama(&mut config.ollama)?;

    println!();
    println!("{}", style("Testing configuration...").yellow());

    if test_ollama_connection(&config)? {
        println!("{}", style("✓ Ollama connection successful!").green());
    } else {
        println!(
            "{}",
            style("⚠ Warning: Could not connect to Ollama").yellow()
        );
        println!("You can continue, but make sure Ollama is running before indexing.");
    }

    println!();
    if Confirm::new()
        .with_prompt("Save configuration?")
        .default(true)
        .interact()?
    {
        config.save().context("Failed to save configuration")?;
        println!("{}", style("✓ Configuration saved successfully!").green());
        println!(
            "Configuration saved to: {}",
            style(config.config_file_path().display()).cyan()
        );
    } else {
        println!("Configuration not saved.");
    }

    Ok(())
}

#[inline]
pub fn show_config() -> Result<()> {
    let config_dir = get_config_dir().context("Failed to locate config directory")?;
    let config = Config::load(&config_dir).context("Failed to load configuration")?;

    println!("{}", style("📋 Current Configuration").bold().cyan());
    println!();

    println!("{}", style("Ollama Settings:").bold().yellow());
    println!("  Host: {}", style(&config.ollama.host).cyan());
    println!("  Port: {}", style(config.ollama.port).cyan());
    println!(
        "  Embedding Model: {}",
        style(&config.ollama.embedding_model).cyan()
    );
    println!(
        "  Generation Model: {}",
        style(&config.ollama.generation_model).cyan()
    );
    println!("  Batch Size: {}", style(config.ollama.batch_size).cyan());

    println!();
    println!("{}", style("Retrieval Settings:").bold().yellow());
    println!("  Max Results: {}", style(config.retrieval.max_results).cyan());
    println!(
        "  Max Distance: {}",
        style(config.retrieval.max_distance).cyan()
    );

    println!();
    println!("{}", style("Chunking Settings:").bold().yellow());
    println!("  Chunk Size: {}", style(config.chunking.chunk_size).cyan());
    println!("  Overlap: {}", style(config.chunking.overlap).cyan());

    println!();
    match config.ollama_url() {
        Ok(url) => println!("  Ollama URL: {}", style(url).cyan()),
        Err(e) => println!("  Ollama URL: {} ({})", style("Invalid").red(), e),
    }

    println!();
    println!(
        "Config file: {}",
        style(config.config_file_path().display()).dim()
    );

    Ok(())
}

fn load_existing_config() -> Result<Config> {
    let config_dir = get_config_dir().context("Failed to locate config directory")?;
    match Config::load(&config_dir) {
        Ok(config) => {
            println!("{}", style("Found existing configuration.").green());
            Ok(config)
        }
        Err(_) => {
            println!(
                "{}",
                style("No existing configuration found. Using defaults.").yellow()
            );
            Ok(Config {
                ollama: OllamaConfig::default(),
                chunking: super::ChunkingConfig::default(),
                retrieval: super::RetrievalConfig::default(),
                federal_register: super::FederalRegisterConfig::default(),
                base_dir: config_dir,
            })
        }
    }
}

fn configure_ollama(ollama: &mut OllamaConfig) -> Result<()> {
    ollama.host = Input::new()
        .with_prompt("Ollama host")
        .default(ollama.host.clone())
        .interact_text()?;

    ollama.port = Input::new()
        .with_prompt("Ollama port")
        .default(ollama.port)
        .interact_text()?;

    ollama.embedding_model = Input::new()
        .with_prompt("Embedding model")
        .default(ollama.embedding_model.clone())
        .interact_text()?;

    ollama.generation_model = Input::new()
        .with_prompt("Generation model")
        .default(ollama.generation_model.clone())
        .interact_text()?;

    Ok(())
}

fn test_ollama_connection(config: &Config) -> Result<bool> {
    let Ok(client) = OllamaClient::new(&config.ollama) else {
        return Ok(false);
    };
    Ok(client.ping().is_ok())
}
