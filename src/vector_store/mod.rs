//! Vector store abstraction.
//!
//! Provides a trait-based gateway over one named collection: idempotent
//! provisioning, batched upsert of chunk vectors with payload, and top-K
//! similarity search.

mod memory;
mod qdrant;

pub use memory::MemoryVectorStore;
pub use qdrant::QdrantStore;

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// The kind of document a chunk came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Pdf,
    Audio,
}

impl std::str::FromStr for SourceKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pdf" => Ok(SourceKind::Pdf),
            "audio" => Ok(SourceKind::Audio),
            _ => Err(format!("Unknown source kind: {}", s)),
        }
    }
}

impl std::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceKind::Pdf => write!(f, "pdf"),
            SourceKind::Audio => write!(f, "audio"),
        }
    }
}

/// Distance metric for a collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DistanceMetric {
    Cosine,
    Euclid,
    Dot,
}

impl std::str::FromStr for DistanceMetric {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "cosine" => Ok(DistanceMetric::Cosine),
            "euclid" | "euclidean" => Ok(DistanceMetric::Euclid),
            "dot" => Ok(DistanceMetric::Dot),
            _ => Err(format!("Unknown distance metric: {}", s)),
        }
    }
}

/// Non-vector metadata attached to a stored chunk record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkPayload {
    /// Normalized chunk text.
    pub text: String,
    /// Document kind this chunk came from.
    pub source: SourceKind,
    /// Source file name.
    pub filename: String,
    /// 0-based chunk position within its document.
    pub chunk_index: usize,
}

/// A scored fragment returned by similarity search.
///
/// Payload fields missing in the store project to empty string / zero rather
/// than erroring; `source` stays a verbatim string for the same reason.
#[derive(Debug, Clone)]
pub struct RetrievedContext {
    pub text: String,
    pub score: f32,
    pub source: String,
    pub filename: String,
    pub chunk_index: usize,
}

/// Trait for vector store implementations. Each instance owns one named
/// collection.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Create the collection if it does not exist. Idempotent: a second call
    /// with the same name returns without touching the existing collection,
    /// and never validates its dimensionality (a mismatch surfaces later as
    /// an upsert/search failure from the store itself).
    async fn ensure_collection(&self, vector_size: usize) -> Result<()>;

    /// Write all records in one batched call, assigning each a fresh random
    /// id. An empty batch is a no-op. Returns the number of records written.
    async fn upsert(&self, records: Vec<(Vec<f32>, ChunkPayload)>) -> Result<usize>;

    /// Return up to `limit` nearest records by descending similarity score.
    /// A source filter restricts candidates before ranking. Fewer matches
    /// than `limit` (or an empty collection) yields a shorter (or empty)
    /// result, not an error.
    async fn search(
        &self,
        query_vector: &[f32],
        limit: usize,
        source_filter: Option<SourceKind>,
    ) -> Result<Vec<RetrievedContext>>;
}

/// Compute cosine similarity between two vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot_product / (norm_a * norm_b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cosine_similarity() {
        let a = vec![1.0, 0.0, 0.0];
        let b = vec![1.0, 0.0, 0.0];
        assert!((cosine_similarity(&a, &b) - 1.0).abs() < 0.001);

        let c = vec![0.0, 1.0, 0.0];
        assert!((cosine_similarity(&a, &c)).abs() < 0.001);

        let d = vec![-1.0, 0.0, 0.0];
        assert!((cosine_similarity(&a, &d) + 1.0).abs() < 0.001);
    }

    #[test]
    fn test_source_kind_roundtrip() {
        assert_eq!("pdf".parse::<SourceKind>().unwrap(), SourceKind::Pdf);
        assert_eq!("Audio".parse::<SourceKind>().unwrap(), SourceKind::Audio);
        assert!("video".parse::<SourceKind>().is_err());
        assert_eq!(SourceKind::Pdf.to_string(), "pdf");
    }

    #[test]
    fn test_distance_metric_parse() {
        assert_eq!("cosine".parse::<DistanceMetric>().unwrap(), DistanceMetric::Cosine);
        assert_eq!("euclidean".parse::<DistanceMetric>().unwrap(), DistanceMetric::Euclid);
        assert!("hamming".parse::<DistanceMetric>().is_err());
    }
}
