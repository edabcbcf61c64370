//! Configuration settings for Korpus.

use crate::error::{KorpusError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub openai: OpenAiSettings,
    pub chunking: ChunkingSettings,
    pub segmentation: SegmentationSettings,
    pub transcription: TranscriptionSettings,
    pub embedding: EmbeddingSettings,
    pub qdrant: QdrantSettings,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

/// OpenAI client settings. The API key itself comes from `OPENAI_API_KEY`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OpenAiSettings {
    /// Request timeout in seconds for transcription and embedding calls.
    pub request_timeout_seconds: u64,
}

impl Default for OpenAiSettings {
    fn default() -> Self {
        Self {
            request_timeout_seconds: 300,
        }
    }
}

/// Token-window chunking settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingSettings {
    /// Maximum tokens per chunk.
    pub max_tokens: usize,
    /// Tokens shared between adjacent chunks. Must be less than `max_tokens`.
    pub overlap_tokens: usize,
}

impl Default for ChunkingSettings {
    fn default() -> Self {
        Self {
            max_tokens: 400,
            overlap_tokens: 60,
        }
    }
}

/// Audio segmentation settings for long recordings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmentationSettings {
    /// Maximum duration a single transcription call may carry, in seconds.
    pub max_segment_seconds: f64,
    /// Seconds of audio shared between adjacent segments so boundary words
    /// are not lost between calls.
    pub overlap_seconds: f64,
}

impl Default for SegmentationSettings {
    fn default() -> Self {
        Self {
            max_segment_seconds: 1250.0,
            overlap_seconds: 10.0,
        }
    }
}

/// Transcription service settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranscriptionSettings {
    /// Speech-to-text model to use.
    pub model: String,
}

impl Default for TranscriptionSettings {
    fn default() -> Self {
        Self {
            model: "gpt-4o-transcribe".to_string(),
        }
    }
}

/// Embedding generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingSettings {
    /// Embedding model to use.
    pub model: String,
    /// Embedding dimensions.
    pub dimensions: u32,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            model: "text-embedding-3-large".to_string(),
            dimensions: 3072,
        }
    }
}

/// Qdrant vector store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QdrantSettings {
    /// Qdrant gRPC endpoint.
    pub url: String,
    /// Collection to ingest into and search.
    pub collection: String,
    /// Distance metric (cosine, euclid, dot).
    pub distance: String,
}

impl Default for QdrantSettings {
    fn default() -> Self {
        Self {
            url: "http://localhost:6334".to_string(),
            collection: "korpus-collection".to_string(),
            distance: "cosine".to_string(),
        }
    }
}

impl Settings {
    /// Load settings from the default configuration file.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from a specific path, or the default location if None.
    ///
    /// A missing file yields defaults; a present file must parse and the
    /// resulting windows must validate before any I/O is attempted.
    pub fn load_from(path: Option<&PathBuf>) -> Result<Self> {
        let config_path = match path {
            Some(p) => p.clone(),
            None => Self::default_config_path(),
        };

        let settings = if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            toml::from_str(&content)?
        } else {
            Settings::default()
        };

        settings.validate()?;
        Ok(settings)
    }

    /// Validate window configuration. Fails fast with a configuration error
    /// before any network or subprocess work.
    pub fn validate(&self) -> Result<()> {
        if self.chunking.max_tokens == 0 {
            return Err(KorpusError::Config(
                "chunking.max_tokens must be positive".to_string(),
            ));
        }
        if self.chunking.overlap_tokens >= self.chunking.max_tokens {
            return Err(KorpusError::Config(format!(
                "chunking.overlap_tokens ({}) must be less than chunking.max_tokens ({})",
                self.chunking.overlap_tokens, self.chunking.max_tokens
            )));
        }
        if self.segmentation.max_segment_seconds <= 0.0 {
            return Err(KorpusError::Config(
                "segmentation.max_segment_seconds must be positive".to_string(),
            ));
        }
        if self.segmentation.overlap_seconds < 0.0 {
            return Err(KorpusError::Config(
                "segmentation.overlap_seconds must not be negative".to_string(),
            ));
        }
        Ok(())
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("korpus")
            .join("config.toml")
    }
}
