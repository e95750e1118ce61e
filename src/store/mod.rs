// Vector store module
// LanceDB-backed persistence for embedded document chunks.

pub mod vector_store;

use serde::{Deserialize, Serialize};

pub use vector_store::{SearchResult, VectorStore};

/// The persisted unit: one embedded chunk with its provenance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingRecord {
    /// Globally unique, stable identifier for this entry
    pub id: String,
    /// The embedding vector; dimension is constant across a collection
    pub vector: Vec<f32>,
    /// Metadata about the chunk this embedding represents
    pub metadata: ChunkMetadata,
}

/// Metadata stored alongside each embedding
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkMetadata {
    /// The chunk text
    pub content: String,
    /// Filename the chunk was derived from
    pub source: String,
    /// Ordinal of this chunk within its document, contiguous from 0
    pub chunk_index: u32,
    /// Timestamp when this entry was created
    pub created_at: String,
}
