//! Qdrant vector store implementation.

use super::{ChunkPayload, DistanceMetric, RetrievedContext, SourceKind, VectorStore};
use crate::error::{KorpusError, Result};
use async_trait::async_trait;
use qdrant_client::qdrant::{
    Condition, CreateCollectionBuilder, Distance, Filter, PointStruct, SearchPointsBuilder,
    UpsertPointsBuilder, VectorParamsBuilder, VectorsConfig,
};
use qdrant_client::Qdrant;
use std::collections::HashMap;
use tracing::{info, instrument};
use uuid::Uuid;

/// Qdrant-backed store owning one named collection.
pub struct QdrantStore {
    client: Qdrant,
    collection_name: String,
    distance: DistanceMetric,
}

impl QdrantStore {
    /// Connect to a Qdrant endpoint.
    pub fn new(url: &str, collection_name: &str, distance: DistanceMetric) -> Result<Self> {
        let client = Qdrant::from_url(url)
            .build()
            .map_err(|e| KorpusError::VectorStore(format!("connection failed: {e}")))?;

        Ok(Self {
            client,
            collection_name: collection_name.to_string(),
            distance,
        })
    }

    fn map_distance(metric: DistanceMetric) -> Distance {
        match metric {
            DistanceMetric::Cosine => Distance::Cosine,
            DistanceMetric::Euclid => Distance::Euclid,
            DistanceMetric::Dot => Distance::Dot,
        }
    }
}

#[async_trait]
impl VectorStore for QdrantStore {
    #[instrument(skip(self), fields(collection = %self.collection_name))]
    async fn ensure_collection(&self, vector_size: usize) -> Result<()> {
        let exists = self
            .client
            .collection_exists(&self.collection_name)
            .await
            .map_err(|e| KorpusError::VectorStore(format!("existence check failed: {e}")))?;

        if exists {
            // Present: return as-is. Dimensionality is deliberately not
            // re-validated; a mismatch surfaces as an upsert/search error.
            info!(collection = %self.collection_name, "collection already exists");
            return Ok(());
        }

        let vectors_config = VectorsConfig::from(VectorParamsBuilder::new(
            vector_size as u64,
            Self::map_distance(self.distance),
        ));

        self.client
            .create_collection(
                CreateCollectionBuilder::new(&self.collection_name).vectors_config(vectors_config),
            )
            .await
            .map_err(|e| KorpusError::VectorStore(format!("collection creation failed: {e}")))?;

        info!(collection = %self.collection_name, "collection created");
        Ok(())
    }

    #[instrument(skip(self, records), fields(collection = %self.collection_name, count = records.len()))]
    async fn upsert(&self, records: Vec<(Vec<f32>, ChunkPayload)>) -> Result<usize> {
        if records.is_empty() {
            return Ok(0);
        }

        let count = records.len();
        let points: Vec<PointStruct> = records
            .into_iter()
            .map(|(vector, chunk)| {
                let mut payload: HashMap<String, serde_json::Value> = HashMap::new();
                payload.insert(
                    "text".to_string(),
                    serde_json::Value::String(chunk.text),
                );
                payload.insert(
                    "source".to_string(),
                    serde_json::Value::String(chunk.source.to_string()),
                );
                payload.insert(
                    "filename".to_string(),
                    serde_json::Value::String(chunk.filename),
                );
                payload.insert(
                    "chunk_index".to_string(),
                    serde_json::Value::Number((chunk.chunk_index as u64).into()),
                );

                // Identity is the generated id, not content: re-ingesting
                // identical text creates a new record.
                PointStruct::new(Uuid::new_v4().to_string(), vector, payload)
            })
            .collect();

        self.client
            .upsert_points(UpsertPointsBuilder::new(&self.collection_name, points))
            .await
            .map_err(|e| KorpusError::VectorStore(format!("upsert failed: {e}")))?;

        info!(collection = %self.collection_name, count, "points upserted");
        Ok(count)
    }

    #[instrument(skip(self, query_vector), fields(collection = %self.collection_name, limit = limit))]
    async fn search(
        &self,
        query_vector: &[f32],
        limit: usize,
        source_filter: Option<SourceKind>,
    ) -> Result<Vec<RetrievedContext>> {
        let mut builder = SearchPointsBuilder::new(
            &self.collection_name,
            query_vector.to_vec(),
            limit as u64,
        )
        .with_payload(true);

        if let Some(kind) = source_filter {
            builder = builder.filter(Filter::must([Condition::matches(
                "source",
                kind.to_string(),
            )]));
        }

        let response = self
            .client
            .search_points(builder)
            .await
            .map_err(|e| KorpusError::VectorStore(format!("search failed: {e}")))?;

        let results = response
            .result
            .into_iter()
            .map(|point| {
                let payload = point.payload;
                // Missing payload fields default rather than error.
                RetrievedContext {
                    text: payload
                        .get("text")
                        .and_then(|v| v.as_str()).map(|s| s.as_str())
                        .unwrap_or_default()
                        .to_string(),
                    score: point.score,
                    source: payload
                        .get("source")
                        .and_then(|v| v.as_str()).map(|s| s.as_str())
                        .unwrap_or_default()
                        .to_string(),
                    filename: payload
                        .get("filename")
                        .and_then(|v| v.as_str()).map(|s| s.as_str())
                        .unwrap_or_default()
                        .to_string(),
                    chunk_index: payload
                        .get("chunk_index")
                        .and_then(|v| v.as_integer())
                        .unwrap_or(0) as usize,
                }
            })
            .collect();

        Ok(results)
    }
}
