// Embedding and generation clients

pub mod ollama;

use anyhow::Result;

pub use ollama::OllamaClient;

/// Seam for the external embedding model.
///
/// Implementations must preserve order and return exactly one vector per
/// input text, or fail; partial results are a contract violation. The
/// indexing service is generic over this trait so tests can inject
/// deterministic fakes.
pub trait EmbeddingProvider {
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;
}

/// Seam for the external generation model.
pub trait GenerationProvider {
    fn generate(&self, prompt: &str) -> Result<String>;
}
