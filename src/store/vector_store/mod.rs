#[cfg(test)]
mod tests;

use super::EmbeddingRecord;
use crate::PolicyError;
use arrow::array::{
    Array, FixedSizeListArray, Float32Array, RecordBatchIterator, StringArray, UInt32Array,
};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use futures::TryStreamExt;
use lancedb::{
    Connection, DistanceType,
    query::{ExecutableQuery, QueryBase},
};
use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

const TABLE_NAME: &str = "policy_documents";

/// Persistent collection of embedded policy chunks with cosine similarity
/// search. The table is created lazily on first insert so its vector
/// dimension always matches the embedding model in use.
pub struct VectorStore {
    connection: Connection,
    vector_dimension: Option<usize>,
}

/// One nearest-neighbor hit, nearest first in any result list
#[derive(Debug, Clone)]
pub struct SearchResult {
    pub content: String,
    pub source: String,
    pub chunk_index: u32,
    pub distance: f32,
}

impl VectorStore {
    /// Open (or create) the store rooted at `db_path`.
    #[inline]
    pub async fn open(db_path: &Path) -> Result<Self, PolicyError> {
        debug!("Initializing LanceDB at path: {:?}", db_path);

        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                PolicyError::Store(format!("Failed to create vector database directory: {}", e))
            })?;
        }

        let uri = format!("file://{}", db_path.display());
        let connection = lancedb::connect(&uri)
            .execute()
            .await
            .map_err(|e| PolicyError::Store(format!("Failed to connect to LanceDB: {}", e)))?;

        let mut store = Self {
            connection,
            vector_dimension: None,
        };

        if store.table_exists().await? {
            match store.detect_existing_vector_dimension().await {
                Ok(dim) => {
                    store.vector_dimension = Some(dim);
                    debug!("Detected existing vector dimension: {}", dim);
                }
                Err(e) => {
                    warn!("Could not detect vector dimension from existing table: {}", e);
                }
            }
        }

        info!("Vector store initialized");
        Ok(store)
    }

    async fn table_exists(&self) -> Result<bool, PolicyError> {
        let table_names = self
            .connection
            .table_names()
            .execute()
            .await
            .map_err(|e| PolicyError::Store(format!("Failed to list tables: {}", e)))?;
        Ok(table_names.contains(&TABLE_NAME.to_string()))
    }

    /// Detect vector dimension from the existing table schema
    async fn detect_existing_vector_dimension(&self) -> Result<usize, PolicyError> {
        let table = self
            .connection
            .open_table(TABLE_NAME)
            .execute()
            .await
            .map_err(|e| PolicyError::Store(format!("Failed to open existing table: {}", e)))?;

        let schema = table
            .schema()
            .await
            .map_err(|e| PolicyError::Store(format!("Failed to get table schema: {}", e)))?;

        for field in schema.fields() {
            if field.name() == "vector" {
                if let DataType::FixedSizeList(_, size) = field.data_type() {
                    return Ok(*size as usize);
                }
            }
        }

        Err(PolicyError::Store(
            "Could not find vector column or determine dimension".to_string(),
        ))
    }

    fn create_schema(vector_dim: usize) -> Arc<Schema> {
        Arc::new(Schema::new(vec![
            Field::new("id", DataType::Utf8, false),
            Field::new(
                "vector",
                DataType::FixedSizeList(
                    Arc::new(Field::new("item", DataType::Float32, false)),
                    vector_dim as i32,
                ),
                false,
            ),
            Field::new("content", DataType::Utf8, false),
            Field::new("source", DataType::Utf8, false),
            Field::new("chunk_index", DataType::UInt32, false),
            Field::new("created_at", DataType::Utf8, false),
        ]))
    }

    /// Insert a batch of records as a single write.
    ///
    /// A vector dimension differing from the collection's established
    /// dimension is a fatal consistency violation for this operation;
    /// nothing is written and previously stored entries are untouched.
    #[inline]
    pub async fn add_entries(&mut self, records: Vec<EmbeddingRecord>) -> Result<(), PolicyError> {
        if records.is_empty() {
            debug!("No embeddings to store");
            return Ok(());
        }

        let batch_dim = records[0].vector.len();
        if records.iter().any(|r| r.vector.len() != batch_dim) {
            return Err(PolicyError::Store(
                "Batch contains vectors of mixed dimensions".to_string(),
            ));
        }

        if let Some(existing_dim) = self.vector_dimension {
            if existing_dim != batch_dim {
                return Err(PolicyError::Store(format!(
                    "Embedding dimension mismatch: collection has {}, batch has {}",
                    existing_dim, batch_dim
                )));
            }
        }

        if !self.table_exists().await? {
            debug!("Creating table {} with dimension {}", TABLE_NAME, batch_dim);
            let schema = Self::create_schema(batch_dim);
            self.connection
                .create_empty_table(TABLE_NAME, schema)
                .execute()
                .await
                .map_err(|e| PolicyError::Store(format!("Failed to create table: {}", e)))?;
        }
        self.vector_dimension = Some(batch_dim);

        debug!("Storing batch of {} embeddings", records.len());

        let record_batch = Self::create_record_batch(&records, batch_dim)?;

        let table = self
            .connection
            .open_table(TABLE_NAME)
            .execute()
            .await
            .map_err(|e| PolicyError::Store(format!("Failed to open table: {}", e)))?;

        let schema = record_batch.schema();
        let reader = RecordBatchIterator::new(std::iter::once(Ok(record_batch)), schema);
        table
            .add(reader)
            .execute()
            .await
            .map_err(|e| PolicyError::Store(format!("Failed to insert embeddings: {}", e)))?;

        debug!("Stored {} embeddings", records.len());
        Ok(())
    }

    fn create_record_batch(
        records: &[EmbeddingRecord],
        vector_dim: usize,
    ) -> Result<RecordBatch, PolicyError> {
        let len = records.len();

        let mut ids = Vec::with_capacity(len);
        let mut contents = Vec::with_capacity(len);
        let mut sources = Vec::with_capacity(len);
        let mut chunk_indices = Vec::with_capacity(len);
        let mut created_ats = Vec::with_capacity(len);
        let mut flat_values = Vec::with_capacity(len * vector_dim);

        for record in records {
            ids.push(record.id.as_str());
            contents.push(record.metadata.content.as_str());
            sources.push(record.metadata.source.as_str());
            chunk_indices.push(record.metadata.chunk_index);
            created_ats.push(record.metadata.created_at.as_str());
            flat_values.extend_from_slice(&record.vector);
        }

        let schema = Self::create_schema(vector_dim);

        let values_array = Float32Array::from(flat_values);
        let field = Arc::new(Field::new("item", DataType::Float32, false));
        let vector_array =
            FixedSizeListArray::try_new(field, vector_dim as i32, Arc::new(values_array), None)
                .map_err(|e| {
                    PolicyError::Store(format!("Failed to create vector array: {}", e))
                })?;

        let arrays: Vec<Arc<dyn arrow::array::Array>> = vec![
            Arc::new(StringArray::from(ids)),
            Arc::new(vector_array),
            Arc::new(StringArray::from(contents)),
            Arc::new(StringArray::from(sources)),
            Arc::new(UInt32Array::from(chunk_indices)),
            Arc::new(StringArray::from(created_ats)),
        ];

        RecordBatch::try_new(schema, arrays)
            .map_err(|e| PolicyError::Store(format!("Failed to create record batch: {}", e)))
    }

    /// Cosine nearest-neighbor search, nearest first.
    #[inline]
    pub async fn search(
        &self,
        query_vector: &[f32],
        limit: usize,
    ) -> Result<Vec<SearchResult>, PolicyError> {
        if !self.table_exists().await? {
            return Ok(Vec::new());
        }

        debug!("Searching for similar vectors with limit: {}", limit);

        let table = self
            .connection
            .open_table(TABLE_NAME)
            .execute()
            .await
            .map_err(|e| PolicyError::Store(format!("Failed to open table: {}", e)))?;

        let mut stream = table
            .vector_search(query_vector)
            .map_err(|e| PolicyError::Store(format!("Failed to create vector search: {}", e)))?
            .column("vector")
            .distance_type(DistanceType::Cosine)
            .limit(limit)
            .execute()
            .await
            .map_err(|e| PolicyError::Store(format!("Failed to execute search: {}", e)))?;

        let mut search_results = Vec::new();
        while let Some(batch) = stream
            .try_next()
            .await
            .map_err(|e| PolicyError::Store(format!("Failed to read result stream: {}", e)))?
        {
            search_results.extend(Self::parse_search_batch(&batch)?);
        }

        debug!("Parsed {} search results", search_results.len());
        Ok(search_results)
    }

    fn parse_search_batch(batch: &RecordBatch) -> Result<Vec<SearchResult>, PolicyError> {
        let contents = string_column(batch, "content")?;
        let sources = string_column(batch, "source")?;

        let chunk_indices = batch
            .column_by_name("chunk_index")
            .ok_or_else(|| PolicyError::Store("Missing chunk_index column".to_string()))?
            .as_any()
            .downcast_ref::<UInt32Array>()
            .ok_or_else(|| PolicyError::Store("Invalid chunk_index column type".to_string()))?;

        let distances = batch
            .column_by_name("_distance")
            .map(|col| col.as_any().downcast_ref::<Float32Array>());

        let mut results = Vec::with_capacity(batch.num_rows());
        for row in 0..batch.num_rows() {
            let distance = distances
                .flatten()
                .map_or(0.0, |d| if d.is_null(row) { 0.0 } else { d.value(row) });

            results.push(SearchResult {
                content: contents.value(row).to_string(),
                source: sources.value(row).to_string(),
                chunk_index: chunk_indices.value(row),
                distance,
            });
        }

        Ok(results)
    }

    /// Distinct source filenames currently present in the collection.
    #[inline]
    pub async fn indexed_sources(&self) -> Result<BTreeSet<String>, PolicyError> {
        if !self.table_exists().await? {
            return Ok(BTreeSet::new());
        }

        let table = self
            .connection
            .open_table(TABLE_NAME)
            .execute()
            .await
            .map_err(|e| PolicyError::Store(format!("Failed to open table: {}", e)))?;

        let mut stream = table
            .query()
            .execute()
            .await
            .map_err(|e| PolicyError::Store(format!("Failed to scan table: {}", e)))?;

        let mut sources = BTreeSet::new();
        while let Some(batch) = stream
            .try_next()
            .await
            .map_err(|e| PolicyError::Store(format!("Failed to read scan stream: {}", e)))?
        {
            let column = string_column(&batch, "source")?;
            for row in 0..batch.num_rows() {
                sources.insert(column.value(row).to_string());
            }
        }

        debug!("Found {} distinct indexed sources", sources.len());
        Ok(sources)
    }

    /// Total number of stored entries; 0 when the table does not exist yet.
    #[inline]
    pub async fn count(&self) -> Result<usize, PolicyError> {
        if !self.table_exists().await? {
            return Ok(0);
        }

        let table = self
            .connection
            .open_table(TABLE_NAME)
            .execute()
            .await
            .map_err(|e| PolicyError::Store(format!("Failed to open table: {}", e)))?;

        table
            .count_rows(None)
            .await
            .map_err(|e| PolicyError::Store(format!("Failed to count rows: {}", e)))
    }

    /// Drop the collection wholesale, ignoring "does not exist".
    ///
    /// The table is recreated with the same similarity configuration on the
    /// next insert; until then the store reports an empty collection.
    #[inline]
    pub async fn clear(&mut self) -> Result<(), PolicyError> {
        if self.table_exists().await? {
            info!("Dropping collection {}", TABLE_NAME);
            self.connection
                .drop_table(TABLE_NAME)
                .await
                .map_err(|e| PolicyError::Store(format!("Failed to drop table: {}", e)))?;
        }
        self.vector_dimension = None;
        Ok(())
    }

    /// Dimension of stored vectors, if any entries exist
    #[inline]
    pub fn vector_dimension(&self) -> Option<usize> {
        self.vector_dimension
    }
}

fn string_column<'a>(
    batch: &'a RecordBatch,
    name: &str,
) -> Result<&'a StringArray, PolicyError> {
    batch
        .column_by_name(name)
        .ok_or_else(|| PolicyError::Store(format!("Missing {} column", name)))?
        .as_any()
        .downcast_ref::<StringArray>()
        .ok_or_else(|| PolicyError::Store(format!("Invalid {} column type", name)))
}
