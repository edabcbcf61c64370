//! Ingestion pipeline orchestrator.
//!
//! Drives load -> normalize -> chunk -> embed -> store for both document
//! kinds. PDF and audio ingestion run as independent concurrent pipelines;
//! their chunks are then flattened into a single embedding batch and stored
//! in one upsert. A failure anywhere fails the whole run.

use crate::chunking::{normalize_text, TokenChunker};
use crate::config::Settings;
use crate::embedding::{Embedder, OpenAIEmbedder};
use crate::error::{KorpusError, Result};
use crate::openai::create_client;
use crate::pdf::{load_pdfs, PdfExtractor, PdftotextExtractor};
use crate::transcription::{OpenAiTranscriber, Transcriber};
use crate::vector_store::{ChunkPayload, DistanceMetric, QdrantStore, SourceKind, VectorStore};
use futures::future::try_join_all;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, instrument};

/// Chunks of one ingested document, tagged with their origin.
#[derive(Debug)]
struct DocumentChunks {
    source: SourceKind,
    filename: String,
    chunks: Vec<crate::chunking::Chunk>,
}

/// Outcome of one ingestion run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestReport {
    /// Number of PDF documents ingested.
    pub pdf_documents: usize,
    /// Number of audio documents ingested.
    pub audio_documents: usize,
    /// Total chunks embedded and stored across both kinds.
    pub chunks_indexed: usize,
}

/// Coordinates extraction, chunking, embedding, and storage.
pub struct Orchestrator {
    chunker: TokenChunker,
    pdf_extractor: Arc<dyn PdfExtractor>,
    transcriber: Arc<dyn Transcriber>,
    embedder: Arc<dyn Embedder>,
    vector_store: Arc<dyn VectorStore>,
}

impl Orchestrator {
    /// Wire up production components from settings.
    pub fn new(settings: Settings) -> Result<Self> {
        settings.validate()?;

        let chunker = TokenChunker::new(
            settings.chunking.max_tokens,
            settings.chunking.overlap_tokens,
        )?;

        let client = create_client(settings.openai.request_timeout_seconds);

        let transcriber = Arc::new(OpenAiTranscriber::new(
            client.clone(),
            &settings.transcription.model,
            settings.segmentation.max_segment_seconds,
            settings.segmentation.overlap_seconds,
        ));

        let embedder = Arc::new(OpenAIEmbedder::new(
            client,
            &settings.embedding.model,
            settings.embedding.dimensions as usize,
        ));

        let distance: DistanceMetric = settings
            .qdrant
            .distance
            .parse()
            .map_err(KorpusError::Config)?;
        let vector_store = Arc::new(QdrantStore::new(
            &settings.qdrant.url,
            &settings.qdrant.collection,
            distance,
        )?);

        Ok(Self {
            chunker,
            pdf_extractor: Arc::new(PdftotextExtractor::new()),
            transcriber,
            embedder,
            vector_store,
        })
    }

    /// Build an orchestrator from injected components.
    pub fn with_components(
        chunker: TokenChunker,
        pdf_extractor: Arc<dyn PdfExtractor>,
        transcriber: Arc<dyn Transcriber>,
        embedder: Arc<dyn Embedder>,
        vector_store: Arc<dyn VectorStore>,
    ) -> Self {
        Self {
            chunker,
            pdf_extractor,
            transcriber,
            embedder,
            vector_store,
        }
    }

    /// Get a reference to the vector store (as trait object).
    pub fn vector_store(&self) -> Arc<dyn VectorStore> {
        self.vector_store.clone()
    }

    /// Get a reference to the embedder.
    pub fn embedder(&self) -> Arc<dyn Embedder> {
        self.embedder.clone()
    }

    /// Ingest PDFs and audio files into the collection.
    ///
    /// The two kinds run concurrently. All chunks from all documents go out
    /// as one embedding batch and one store upsert; if nothing chunked, the
    /// store is never touched.
    #[instrument(skip_all, fields(pdfs = pdf_paths.len(), audios = audio_paths.len()))]
    pub async fn ingest_all(
        &self,
        pdf_paths: &[PathBuf],
        audio_paths: &[PathBuf],
    ) -> Result<IngestReport> {
        let (pdf_docs, audio_docs) = tokio::try_join!(
            self.collect_pdf_chunks(pdf_paths),
            self.collect_audio_chunks(audio_paths),
        )?;

        let report = IngestReport {
            pdf_documents: pdf_docs.len(),
            audio_documents: audio_docs.len(),
            chunks_indexed: self.store_chunks(pdf_docs, audio_docs).await?,
        };

        info!(
            "Ingested {} PDF and {} audio documents ({} chunks)",
            report.pdf_documents, report.audio_documents, report.chunks_indexed
        );
        Ok(report)
    }

    /// Extract, normalize, and chunk all PDFs.
    async fn collect_pdf_chunks(&self, paths: &[PathBuf]) -> Result<Vec<DocumentChunks>> {
        let loaded = load_pdfs(self.pdf_extractor.as_ref(), paths).await?;

        loaded
            .into_iter()
            .map(|(path, text)| self.chunk_document(SourceKind::Pdf, &path, &text))
            .collect()
    }

    /// Transcribe (fanned out across files), normalize, and chunk all audio.
    /// Segment transcription within one file stays sequential inside the
    /// transcriber.
    async fn collect_audio_chunks(&self, paths: &[PathBuf]) -> Result<Vec<DocumentChunks>> {
        let transcripts = try_join_all(paths.iter().map(|path| async move {
            let text = self.transcriber.transcribe(path).await?;
            Ok::<_, KorpusError>((path.clone(), text))
        }))
        .await?;

        transcripts
            .into_iter()
            .map(|(path, text)| self.chunk_document(SourceKind::Audio, &path, &text))
            .collect()
    }

    fn chunk_document(
        &self,
        source: SourceKind,
        path: &Path,
        text: &str,
    ) -> Result<DocumentChunks> {
        let filename = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("unknown")
            .to_string();
        let normalized = normalize_text(text);
        let chunks = self.chunker.chunk(&normalized)?;
        Ok(DocumentChunks {
            source,
            filename,
            chunks,
        })
    }

    /// Flatten all chunks, embed them in one batch, and upsert in one call.
    async fn store_chunks(
        &self,
        pdf_docs: Vec<DocumentChunks>,
        audio_docs: Vec<DocumentChunks>,
    ) -> Result<usize> {
        let mut texts: Vec<String> = Vec::new();
        let mut payloads: Vec<ChunkPayload> = Vec::new();
        for doc in pdf_docs.into_iter().chain(audio_docs) {
            for chunk in doc.chunks {
                texts.push(chunk.text.clone());
                payloads.push(ChunkPayload {
                    text: chunk.text,
                    source: doc.source,
                    filename: doc.filename.clone(),
                    chunk_index: chunk.index,
                });
            }
        }

        if texts.is_empty() {
            info!("No chunks produced, skipping storage");
            return Ok(0);
        }

        let embeddings = self.embedder.embed_batch(&texts).await?;
        let vector_size = embeddings
            .first()
            .map(|e| e.len())
            .ok_or_else(|| KorpusError::Embedding("Empty embedding response".to_string()))?;

        self.vector_store.ensure_collection(vector_size).await?;
        self.vector_store
            .upsert(embeddings.into_iter().zip(payloads).collect())
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vector_store::MemoryVectorStore;
    use async_trait::async_trait;

    struct FakeExtractor {
        text: String,
    }

    #[async_trait]
    impl PdfExtractor for FakeExtractor {
        async fn extract(&self, _path: &Path) -> Result<String> {
            Ok(self.text.clone())
        }
    }

    struct FakeTranscriber {
        text: String,
    }

    #[async_trait]
    impl Transcriber for FakeTranscriber {
        async fn transcribe(&self, _path: &Path) -> Result<String> {
            Ok(self.text.clone())
        }
    }

    /// Embeds each text as a unit vector whose direction depends on length.
    struct FakeEmbedder;

    #[async_trait]
    impl Embedder for FakeEmbedder {
        async fn embed(&self, text: &str) -> Result<Vec<f32>> {
            let batch = self.embed_batch(&[text.to_string()]).await?;
            Ok(batch.into_iter().next().unwrap())
        }

        async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            Ok(texts
                .iter()
                .map(|t| {
                    let x = (t.len() % 7) as f32 + 1.0;
                    vec![x, 1.0, 0.0]
                })
                .collect())
        }

        fn dimensions(&self) -> usize {
            3
        }
    }

    fn test_orchestrator(
        pdf_text: &str,
        audio_text: &str,
    ) -> (Orchestrator, Arc<MemoryVectorStore>) {
        let store = Arc::new(MemoryVectorStore::new());
        let orchestrator = Orchestrator::with_components(
            TokenChunker::new(50, 10).unwrap(),
            Arc::new(FakeExtractor {
                text: pdf_text.to_string(),
            }),
            Arc::new(FakeTranscriber {
                text: audio_text.to_string(),
            }),
            Arc::new(FakeEmbedder),
            store.clone(),
        );
        (orchestrator, store)
    }

    #[tokio::test]
    async fn test_ingest_counts_by_kind() {
        let (orchestrator, store) = test_orchestrator(
            "a short pdf document about vectors",
            "a short lecture transcript about audio",
        );

        let report = orchestrator
            .ingest_all(&["a.pdf".into(), "b.pdf".into()], &["c.mp3".into()])
            .await
            .unwrap();

        assert_eq!(report.pdf_documents, 2);
        assert_eq!(report.audio_documents, 1);
        assert_eq!(report.chunks_indexed, 3);
        assert_eq!(store.record_count(), 3);
        assert_eq!(store.creation_count(), 1);
    }

    #[tokio::test]
    async fn test_empty_run_skips_storage() {
        let (orchestrator, store) = test_orchestrator("", "");

        let report = orchestrator.ingest_all(&[], &[]).await.unwrap();
        assert_eq!(report.chunks_indexed, 0);
        // No collection side effects when nothing chunked.
        assert_eq!(store.creation_count(), 0);
    }

    #[tokio::test]
    async fn test_whitespace_only_documents_produce_no_chunks() {
        let (orchestrator, store) = test_orchestrator("   \n\t ", "  ");

        let report = orchestrator
            .ingest_all(&["a.pdf".into()], &["b.mp3".into()])
            .await
            .unwrap();

        assert_eq!(report.pdf_documents, 1);
        assert_eq!(report.audio_documents, 1);
        assert_eq!(report.chunks_indexed, 0);
        assert_eq!(store.creation_count(), 0);
    }

    #[tokio::test]
    async fn test_chunk_indices_are_per_document() {
        let long_text = vec!["word"; 120].join(" ");
        let (orchestrator, store) = test_orchestrator(&long_text, "short transcript");

        orchestrator
            .ingest_all(&["long.pdf".into()], &["a.mp3".into()])
            .await
            .unwrap();

        let results = store
            .search(&[1.0, 1.0, 0.0], 50, Some(SourceKind::Pdf))
            .await
            .unwrap();
        let mut indices: Vec<usize> = results.iter().map(|r| r.chunk_index).collect();
        indices.sort_unstable();
        // Dense 0-based indices within the document.
        assert_eq!(indices, (0..indices.len()).collect::<Vec<_>>());
        assert!(indices.len() > 1);
    }
}
