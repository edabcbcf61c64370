//! Korpus - Document Ingestion and Retrieval
//!
//! A CLI tool for ingesting heterogeneous documents (PDFs, audio recordings)
//! into a vector index and retrieving the most relevant fragments for a query.
//!
//! # Overview
//!
//! Korpus allows you to:
//! - Extract text from PDFs and transcribe audio files
//! - Split long recordings into transcribable segments
//! - Chunk text into overlapping, token-bounded pieces
//! - Embed chunks in batch and store them in a Qdrant collection
//! - Search the collection semantically, optionally filtered by source kind
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - `config` - Configuration management
//! - `pdf` - PDF text extraction
//! - `audio` - Duration probing and segmentation of long audio
//! - `transcription` - Speech-to-text transcription
//! - `chunking` - Whitespace normalization and token-window chunking
//! - `embedding` - Batched embedding generation
//! - `vector_store` - Vector database abstraction (Qdrant, in-memory)
//! - `rag` - Retrieval of scored context fragments
//! - `orchestrator` - Ingestion pipeline coordination
//!
//! # Example
//!
//! ```rust,no_run
//! use korpus::config::Settings;
//! use korpus::orchestrator::Orchestrator;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let orchestrator = Orchestrator::new(settings)?;
//!
//!     let report = orchestrator
//!         .ingest_all(&["paper.pdf".into()], &["lecture.mp3".into()])
//!         .await?;
//!     println!("Indexed {} chunks", report.chunks_indexed);
//!
//!     Ok(())
//! }
//! ```

pub mod audio;
pub mod chunking;
pub mod cli;
pub mod config;
pub mod embedding;
pub mod error;
pub mod openai;
pub mod orchestrator;
pub mod pdf;
pub mod rag;
pub mod transcription;
pub mod vector_store;

pub use error::{KorpusError, Result};
