use thiserror::Error;

pub type Result<T> = std::result::Result<T, PolicyError>;

#[derive(Error, Debug)]
pub enum PolicyError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Vector store error: {0}")]
    Store(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("The embedding service is unavailable: {0}")]
    EmbeddingUnavailable(String),

    #[error("Extraction error: {0}")]
    Extraction(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Other error: {0}")]
    Other(#[from] anyhow::Error),
}

pub mod answer;
pub mod chunking;
pub mod commands;
pub mod config;
pub mod embeddings;
pub mod extractor;
pub mod federal_register;
pub mod indexer;
pub mod store;
