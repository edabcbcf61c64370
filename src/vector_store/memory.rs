//! In-memory vector store implementation.
//!
//! Useful for tests and small local experiments. Mirrors the gateway
//! semantics of the Qdrant backend: idempotent collection provisioning,
//! random record ids, filter-then-rank search.

use super::{cosine_similarity, ChunkPayload, RetrievedContext, SourceKind, VectorStore};
use crate::error::{KorpusError, Result};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::RwLock;
use uuid::Uuid;

struct Record {
    vector: Vec<f32>,
    payload: ChunkPayload,
}

/// In-memory vector store over one unnamed "collection".
pub struct MemoryVectorStore {
    collection_size: RwLock<Option<usize>>,
    records: RwLock<Vec<(String, Record)>>,
    creations: AtomicUsize,
}

impl MemoryVectorStore {
    pub fn new() -> Self {
        Self {
            collection_size: RwLock::new(None),
            records: RwLock::new(Vec::new()),
            creations: AtomicUsize::new(0),
        }
    }

    /// How many times the collection was actually created (not just ensured).
    pub fn creation_count(&self) -> usize {
        self.creations.load(Ordering::SeqCst)
    }

    /// Total stored record count.
    pub fn record_count(&self) -> usize {
        self.records.read().unwrap().len()
    }
}

impl Default for MemoryVectorStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VectorStore for MemoryVectorStore {
    async fn ensure_collection(&self, vector_size: usize) -> Result<()> {
        let mut size = self.collection_size.write().unwrap();
        if size.is_some() {
            // Present: leave it alone, even if the size differs.
            return Ok(());
        }
        *size = Some(vector_size);
        self.creations.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn upsert(&self, records: Vec<(Vec<f32>, ChunkPayload)>) -> Result<usize> {
        if records.is_empty() {
            return Ok(0);
        }
        if self.collection_size.read().unwrap().is_none() {
            return Err(KorpusError::VectorStore(
                "collection does not exist".to_string(),
            ));
        }
        let mut store = self.records.write().unwrap();
        let count = records.len();
        for (vector, payload) in records {
            store.push((Uuid::new_v4().to_string(), Record { vector, payload }));
        }
        Ok(count)
    }

    async fn search(
        &self,
        query_vector: &[f32],
        limit: usize,
        source_filter: Option<SourceKind>,
    ) -> Result<Vec<RetrievedContext>> {
        let records = self.records.read().unwrap();

        let mut results: Vec<RetrievedContext> = records
            .iter()
            .filter(|(_, r)| source_filter.is_none_or(|kind| r.payload.source == kind))
            .map(|(_, r)| RetrievedContext {
                text: r.payload.text.clone(),
                score: cosine_similarity(query_vector, &r.vector),
                source: r.payload.source.to_string(),
                filename: r.payload.filename.clone(),
                chunk_index: r.payload.chunk_index,
            })
            .collect();

        results.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        results.truncate(limit);

        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(source: SourceKind, filename: &str, chunk_index: usize) -> ChunkPayload {
        ChunkPayload {
            text: format!("{} chunk {}", filename, chunk_index),
            source,
            filename: filename.to_string(),
            chunk_index,
        }
    }

    #[tokio::test]
    async fn test_ensure_collection_idempotent() {
        let store = MemoryVectorStore::new();
        store.ensure_collection(3).await.unwrap();
        store.ensure_collection(3).await.unwrap();
        // Size mismatch on a later call is deliberately not validated either.
        store.ensure_collection(7).await.unwrap();
        assert_eq!(store.creation_count(), 1);
    }

    #[tokio::test]
    async fn test_search_empty_collection() {
        let store = MemoryVectorStore::new();
        store.ensure_collection(3).await.unwrap();
        let results = store.search(&[1.0, 0.0, 0.0], 5, None).await.unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn test_upsert_empty_is_noop() {
        let store = MemoryVectorStore::new();
        assert_eq!(store.upsert(Vec::new()).await.unwrap(), 0);
        assert_eq!(store.record_count(), 0);
    }

    #[tokio::test]
    async fn test_search_sorted_and_limited() {
        let store = MemoryVectorStore::new();
        store.ensure_collection(3).await.unwrap();
        store
            .upsert(vec![
                (vec![1.0, 0.0, 0.0], payload(SourceKind::Pdf, "a.pdf", 0)),
                (vec![0.9, 0.1, 0.0], payload(SourceKind::Pdf, "a.pdf", 1)),
                (vec![0.0, 1.0, 0.0], payload(SourceKind::Audio, "b.mp3", 0)),
            ])
            .await
            .unwrap();

        let results = store.search(&[1.0, 0.0, 0.0], 2, None).await.unwrap();
        assert_eq!(results.len(), 2);
        assert!(results[0].score >= results[1].score);
        assert_eq!(results[0].filename, "a.pdf");
        assert_eq!(results[0].chunk_index, 0);
    }

    #[tokio::test]
    async fn test_search_source_filter() {
        let store = MemoryVectorStore::new();
        store.ensure_collection(3).await.unwrap();
        store
            .upsert(vec![
                (vec![1.0, 0.0, 0.0], payload(SourceKind::Pdf, "a.pdf", 0)),
                (vec![1.0, 0.0, 0.0], payload(SourceKind::Audio, "b.mp3", 0)),
            ])
            .await
            .unwrap();

        let results = store
            .search(&[1.0, 0.0, 0.0], 10, Some(SourceKind::Audio))
            .await
            .unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].source, "audio");
        assert_eq!(results[0].filename, "b.mp3");
    }

    #[tokio::test]
    async fn test_fewer_matches_than_limit() {
        let store = MemoryVectorStore::new();
        store.ensure_collection(3).await.unwrap();
        store
            .upsert(vec![
                (vec![1.0, 0.0, 0.0], payload(SourceKind::Pdf, "a.pdf", 0)),
                (vec![0.5, 0.5, 0.0], payload(SourceKind::Pdf, "a.pdf", 1)),
                (vec![0.0, 0.0, 1.0], payload(SourceKind::Pdf, "a.pdf", 2)),
            ])
            .await
            .unwrap();

        let results = store.search(&[1.0, 0.0, 0.0], 5, None).await.unwrap();
        assert_eq!(results.len(), 3);
    }
}
