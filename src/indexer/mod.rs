// Indexing service
// Coordinates extraction, chunking, embedding, and vector storage


use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use chrono::Utc;
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::config::{ChunkingConfig, Config, RetrievalConfig};
use crate::chunking::chunk_text;
use crate::embeddings::EmbeddingProvider;
use crate::extractor::{extract_file, is_supported_file};
use crate::store::{ChunkMetadata, EmbeddingRecord, SearchResult, VectorStore};
use crate::{PolicyError, Result};

/// Service that maintains the policy document index and answers
/// similarity queries against it.
///
/// All mutations take the write lock, so concurrent indexing and
/// querying observe either the old collection or the new one, never a
/// partially rebuilt state.
pub struct IndexingService<E> {
    embedder: E,
    state: RwLock<IndexState>,
    chunking: ChunkingConfig,
    retrieval: RetrievalConfig,
    documents_dir: PathBuf,
    uploads_dir: PathBuf,
}

struct IndexState {
    store: VectorStore,
    indexed: BTreeSet<String>,
}

/// Statistics from an indexing pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexingStats {
    pub files_indexed: usize,
    pub files_skipped: usize,
    pub chunks_created: usize,
    pub errors_encountered: usize,
}

/// Result of indexing a single uploaded file. `chunks_added` is zero both
/// for a duplicate and for a file with no indexable text; `already_indexed`
/// tells the two apart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddedDocument {
    pub stored_path: PathBuf,
    pub chunks_added: usize,
    pub already_indexed: bool,
}

impl<E: EmbeddingProvider> IndexingService<E> {
    /// Create a service backed by the vector store at the configured
    /// database path. The set of indexed filenames is recovered from the
    /// store itself, so a restarted process sees its previous index.
    #[inline]
    pub async fn new(config: &Config, embedder: E) -> Result<Self> {
        let store = VectorStore::open(&config.vector_db_path()).await?;
        let indexed = store.indexed_sources().await?;

        if !indexed.is_empty() {
            info!("Loaded existing index with {} documents", indexed.len());
        }

        Ok(Self {
            embedder,
            state: RwLock::new(IndexState { store, indexed }),
            chunking: config.chunking,
            retrieval: config.retrieval,
            documents_dir: config.documents_dir_path(),
            uploads_dir: config.uploads_dir_path(),
        })
    }

    /// Index every supported file in the documents directory that is not
    /// already present in the collection. Files that fail to embed are
    /// skipped whole; no partial chunk set is ever written for a file.
    #[inline]
    pub async fn build_or_load(&self) -> Result<IndexingStats> {
        let mut state = self.state.write().await;
        let files = self.list_document_files()?;

        let mut stats = IndexingStats::default();
        for path in files {
            let filename = file_name_of(&path)?;
            if state.indexed.contains(&filename) {
                debug!("Skipping already indexed document: {}", filename);
                stats.files_skipped += 1;
                continue;
            }

            match self.index_file(&mut state, &path).await {
                Ok(0) => {
                    warn!("No content extracted from {}, skipping", filename);
                    stats.files_skipped += 1;
                }
                Ok(chunks) => {
                    stats.files_indexed += 1;
                    stats.chunks_created += chunks;
                }
                Err(e) => {
                    error!("Failed to index {}: {}", filename, e);
                    stats.errors_encountered += 1;
                }
            }
        }

        info!(
            "Indexing pass complete: {} indexed, {} skipped, {} errors",
            stats.files_indexed, stats.files_skipped, stats.errors_encountered
        );
        Ok(stats)
    }

    /// Drop the whole collection and index the documents directory from
    /// scratch. Queries issued while the rebuild holds the write lock see
    /// either the old collection or the finished new one.
    #[inline]
    pub async fn rebuild(&self) -> Result<IndexingStats> {
        let mut state = self.state.write().await;

        info!("Rebuilding index from scratch");
        state.store.clear().await?;
        state.indexed.clear();

        let files = self.list_document_files()?;
        let mut stats = IndexingStats::default();
        for path in files {
            let filename = file_name_of(&path)?;
            match self.index_file(&mut state, &path).await {
                Ok(0) => {
                    warn!("No content extracted from {}, skipping", filename);
                    stats.files_skipped += 1;
                }
                Ok(chunks) => {
                    stats.files_indexed += 1;
                    stats.chunks_created += chunks;
                }
                Err(e) => {
                    error!("Failed to index {}: {}", filename, e);
                    stats.errors_encountered += 1;
                }
            }
        }

        info!(
            "Rebuild complete: {} documents, {} chunks",
            stats.files_indexed, stats.chunks_created
        );
        Ok(stats)
    }

    /// Copy a file into the uploads directory and index it immediately.
    /// Re-adding a filename that is already indexed is a no-op for the
    /// collection.
    #[inline]
    pub async fn add_file(&self, source: &Path) -> Result<AddedDocument> {
        if !is_supported_file(source) {
            return Err(PolicyError::Extraction(format!(
                "Unsupported file type: {}",
                source.display()
            )));
        }

        let filename = file_name_of(source)?;
        std::fs::create_dir_all(&self.uploads_dir)?;
        let stored_path = self.uploads_dir.join(&filename);
        std::fs::copy(source, &stored_path)?;

        let mut state = self.state.write().await;
        if state.indexed.contains(&filename) {
            info!("Document {} is already indexed", filename);
            return Ok(AddedDocument {
                stored_path,
                chunks_added: 0,
                already_indexed: true,
            });
        }

        let chunks_added = self.index_file(&mut state, &stored_path).await?;
        Ok(AddedDocument {
            stored_path,
            chunks_added,
            already_indexed: false,
        })
    }

    /// Embed `question` and return the most relevant chunks, nearest
    /// first, dropping any hit at or beyond the configured distance
    /// cutoff.
    #[inline]
    pub async fn query(&self, question: &str) -> Result<Vec<SearchResult>> {
        let question = question.trim();
        if question.is_empty() {
            return Ok(Vec::new());
        }

        // An empty collection answers before the embedding backend is
        // touched, so it stays answerable even when Ollama is down.
        let state = self.state.read().await;
        let total = state.store.count().await?;
        if total == 0 {
            return Ok(Vec::new());
        }

        let query_vector = self
            .embedder
            .embed_batch(&[question.to_string()])
            .map_err(|e| PolicyError::EmbeddingUnavailable(e.to_string()))?
            .into_iter()
            .next()
            .ok_or_else(|| {
                PolicyError::EmbeddingUnavailable("No embedding returned for query".to_string())
            })?;

        let limit = self.retrieval.max_results.min(total);
        let results = state.store.search(&query_vector, limit).await?;

        let relevant: Vec<SearchResult> = results
            .into_iter()
            .filter(|r| r.distance < self.retrieval.max_distance)
            .collect();

        debug!("Query matched {} relevant chunks", relevant.len());
        Ok(relevant)
    }

    /// Filenames currently present in the collection, sorted
    #[inline]
    pub async fn indexed_documents(&self) -> Vec<String> {
        let state = self.state.read().await;
        state.indexed.iter().cloned().collect()
    }

    #[inline]
    pub async fn document_count(&self) -> usize {
        let state = self.state.read().await;
        state.indexed.len()
    }

    #[inline]
    pub async fn chunk_count(&self) -> Result<usize> {
        let state = self.state.read().await;
        state.store.count().await
    }

    /// Extract, chunk, embed, and store one file as a single batch write.
    /// Returns the number of chunks added; 0 means the file produced no
    /// indexable text and was not recorded as indexed.
    async fn index_file(&self, state: &mut IndexState, path: &Path) -> Result<usize> {
        let filename = file_name_of(path)?;
        debug!("Indexing document: {}", filename);

        let text = extract_file(path);
        let chunks = chunk_text(&text, &self.chunking);
        if chunks.is_empty() {
            return Ok(0);
        }

        let embeddings = self.embedder.embed_batch(&chunks)?;
        if embeddings.len() != chunks.len() {
            return Err(PolicyError::EmbeddingUnavailable(format!(
                "Expected {} embeddings, got {}",
                chunks.len(),
                embeddings.len()
            )));
        }

        let created_at = Utc::now().to_rfc3339();
        let records: Vec<EmbeddingRecord> = chunks
            .into_iter()
            .zip(embeddings)
            .enumerate()
            .map(|(chunk_index, (content, vector))| EmbeddingRecord {
                id: Uuid::new_v4().to_string(),
                vector,
                metadata: ChunkMetadata {
                    content,
                    source: filename.clone(),
                    chunk_index: chunk_index as u32,
                    created_at: created_at.clone(),
                },
            })
            .collect();

        let count = records.len();
        state.store.add_entries(records).await?;
        state.indexed.insert(filename.clone());

        info!("Indexed {} chunks from {}", count, filename);
        Ok(count)
    }

    /// Supported files in the documents directory, sorted by name for
    /// deterministic indexing order. A missing directory is created and
    /// yields an empty set.
    fn list_document_files(&self) -> Result<Vec<PathBuf>> {
        if !self.documents_dir.exists() {
            warn!(
                "Documents directory {} does not exist, creating it",
                self.documents_dir.display()
            );
            std::fs::create_dir_all(&self.documents_dir)?;
            return Ok(Vec::new());
        }

        let mut files: Vec<PathBuf> = std::fs::read_dir(&self.documents_dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.is_file() && is_supported_file(p))
            .collect();
        files.sort();
        Ok(files)
    }
}

fn file_name_of(path: &Path) -> Result<String> {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(ToString::to_string)
        .ok_or_else(|| {
            PolicyError::Extraction(format!("Invalid file name: {}", path.display()))
        })
}
