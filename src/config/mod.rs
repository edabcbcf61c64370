//! Configuration module for Korpus.
//!
//! Handles loading, validating, and persisting application settings.

mod settings;

pub use settings::{
    ChunkingSettings, EmbeddingSettings, GeneralSettings, OpenAiSettings, QdrantSettings,
    SegmentationSettings, Settings, TranscriptionSettings,
};
