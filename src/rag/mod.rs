//! Retrieval of scored context fragments.
//!
//! Embeds a query as a one-element batch, searches the store, and returns
//! the hits as read-only projections carrying their similarity score.

use crate::embedding::Embedder;
use crate::error::Result;
use crate::vector_store::{RetrievedContext, SourceKind, VectorStore};
use std::sync::Arc;
use tracing::instrument;

/// Retrieves the most relevant stored fragments for a query.
pub struct Retriever {
    embedder: Arc<dyn Embedder>,
    vector_store: Arc<dyn VectorStore>,
}

impl Retriever {
    pub fn new(embedder: Arc<dyn Embedder>, vector_store: Arc<dyn VectorStore>) -> Self {
        Self {
            embedder,
            vector_store,
        }
    }

    /// Return up to `limit` fragments ordered by descending similarity.
    ///
    /// An optional source filter restricts results to one document kind.
    /// Fewer matches than `limit` yields a shorter result, never padding.
    #[instrument(skip(self), fields(limit = limit))]
    pub async fn retrieve(
        &self,
        query: &str,
        limit: usize,
        source_filter: Option<SourceKind>,
    ) -> Result<Vec<RetrievedContext>> {
        let query_embedding = self.embedder.embed(query).await?;
        self.vector_store
            .search(&query_embedding, limit, source_filter)
            .await
    }
}
