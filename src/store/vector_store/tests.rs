use super::*;
use crate::store::{ChunkMetadata, EmbeddingRecord};
use tempfile::TempDir;

fn record(id: &str, vector: Vec<f32>, source: &str, chunk_index: u32) -> EmbeddingRecord {
    EmbeddingRecord {
        id: id.to_string(),
        vector,
        metadata: ChunkMetadata {
            content: format!("content for {}", id),
            source: source.to_string(),
            chunk_index,
            created_at: "2025-01-01T00:00:00Z".to_string(),
        },
    }
}

async fn open_store(tmp: &TempDir) -> VectorStore {
    VectorStore::open(&tmp.path().join("vectors"))
        .await
        .unwrap()
}

#[tokio::test]
async fn empty_store_reports_no_entries() {
    let tmp = TempDir::new().unwrap();
    let store = open_store(&tmp).await;

    assert_eq!(store.count().await.unwrap(), 0);
    assert!(store.indexed_sources().await.unwrap().is_empty());
    assert!(store.search(&[1.0, 0.0, 0.0], 5).await.unwrap().is_empty());
    assert_eq!(store.vector_dimension(), None);
}

#[tokio::test]
async fn add_and_count_entries() {
    let tmp = TempDir::new().unwrap();
    let mut store = open_store(&tmp).await;

    store
        .add_entries(vec![
            record("a", vec![1.0, 0.0, 0.0], "one.txt", 0),
            record("b", vec![0.0, 1.0, 0.0], "one.txt", 1),
            record("c", vec![0.0, 0.0, 1.0], "two.txt", 0),
        ])
        .await
        .unwrap();

    assert_eq!(store.count().await.unwrap(), 3);
    assert_eq!(store.vector_dimension(), Some(3));

    let sources = store.indexed_sources().await.unwrap();
    assert_eq!(sources.len(), 2);
    assert!(sources.contains("one.txt"));
    assert!(sources.contains("two.txt"));
}

#[tokio::test]
async fn search_returns_nearest_first() {
    let tmp = TempDir::new().unwrap();
    let mut store = open_store(&tmp).await;

    store
        .add_entries(vec![
            record("x", vec![1.0, 0.0, 0.0], "x.txt", 0),
            record("y", vec![0.0, 1.0, 0.0], "y.txt", 0),
            record("close", vec![0.9, 0.1, 0.0], "close.txt", 0),
        ])
        .await
        .unwrap();

    let results = store.search(&[1.0, 0.0, 0.0], 2).await.unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(results[0].source, "x.txt");
    assert_eq!(results[1].source, "close.txt");
    assert!(results[0].distance <= results[1].distance);
}

#[tokio::test]
async fn search_limit_caps_results() {
    let tmp = TempDir::new().unwrap();
    let mut store = open_store(&tmp).await;

    let records = (0..10)
        .map(|i| {
            record(
                &format!("r{}", i),
                vec![1.0, i as f32 * 0.1],
                "doc.txt",
                i,
            )
        })
        .collect();
    store.add_entries(records).await.unwrap();

    let results = store.search(&[1.0, 0.0], 4).await.unwrap();
    assert_eq!(results.len(), 4);
}

#[tokio::test]
async fn dimension_mismatch_rejected_without_write() {
    let tmp = TempDir::new().unwrap();
    let mut store = open_store(&tmp).await;

    store
        .add_entries(vec![record("a", vec![1.0, 0.0, 0.0], "a.txt", 0)])
        .await
        .unwrap();

    let err = store
        .add_entries(vec![record("b", vec![1.0, 0.0], "b.txt", 0)])
        .await
        .unwrap_err();
    assert!(matches!(err, PolicyError::Store(_)));

    assert_eq!(store.count().await.unwrap(), 1);
    let sources = store.indexed_sources().await.unwrap();
    assert!(!sources.contains("b.txt"));
}

#[tokio::test]
async fn mixed_dimension_batch_rejected() {
    let tmp = TempDir::new().unwrap();
    let mut store = open_store(&tmp).await;

    let err = store
        .add_entries(vec![
            record("a", vec![1.0, 0.0], "a.txt", 0),
            record("b", vec![1.0, 0.0, 0.0], "a.txt", 1),
        ])
        .await
        .unwrap_err();
    assert!(matches!(err, PolicyError::Store(_)));
    assert_eq!(store.count().await.unwrap(), 0);
}

#[tokio::test]
async fn clear_drops_collection_and_allows_new_dimension() {
    let tmp = TempDir::new().unwrap();
    let mut store = open_store(&tmp).await;

    store
        .add_entries(vec![record("a", vec![1.0, 0.0, 0.0], "a.txt", 0)])
        .await
        .unwrap();
    assert_eq!(store.count().await.unwrap(), 1);

    store.clear().await.unwrap();
    assert_eq!(store.count().await.unwrap(), 0);
    assert_eq!(store.vector_dimension(), None);

    // A fresh dimension is accepted after clearing
    store
        .add_entries(vec![record("b", vec![1.0, 0.0], "b.txt", 0)])
        .await
        .unwrap();
    assert_eq!(store.count().await.unwrap(), 1);
    assert_eq!(store.vector_dimension(), Some(2));
}

#[tokio::test]
async fn clear_on_empty_store_is_noop() {
    let tmp = TempDir::new().unwrap();
    let mut store = open_store(&tmp).await;
    store.clear().await.unwrap();
    assert_eq!(store.count().await.unwrap(), 0);
}

#[tokio::test]
async fn reopen_detects_existing_dimension() {
    let tmp = TempDir::new().unwrap();
    let db_path = tmp.path().join("vectors");

    {
        let mut store = VectorStore::open(&db_path).await.unwrap();
        store
            .add_entries(vec![record("a", vec![1.0, 0.0, 0.0, 0.0], "a.txt", 0)])
            .await
            .unwrap();
    }

    let store = VectorStore::open(&db_path).await.unwrap();
    assert_eq!(store.vector_dimension(), Some(4));
    assert_eq!(store.count().await.unwrap(), 1);
}

#[tokio::test]
async fn empty_batch_is_accepted() {
    let tmp = TempDir::new().unwrap();
    let mut store = open_store(&tmp).await;
    store.add_entries(Vec::new()).await.unwrap();
    assert_eq!(store.count().await.unwrap(), 0);
}
