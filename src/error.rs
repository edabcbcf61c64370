//! Error types for Korpus.

use thiserror::Error;

/// Library-level error type for Korpus operations.
#[derive(Error, Debug)]
pub enum KorpusError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("PDF extraction failed: {0}")]
    PdfExtraction(String),

    #[error("Audio duration could not be determined: {0}")]
    DurationUnknown(String),

    #[error("Transcription rejected by provider: {0}")]
    TranscriptionRejected(String),

    #[error("Transcription failed: {0}")]
    Transcription(String),

    #[error("Embedding generation failed: {0}")]
    Embedding(String),

    #[error("Vector store error: {0}")]
    VectorStore(String),

    #[error("OpenAI API error: {0}")]
    OpenAI(String),

    #[error("External tool not found: {0}. Please install it and ensure it's in your PATH.")]
    ToolNotFound(String),

    #[error("External tool failed: {0}")]
    ToolFailed(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),
}

/// Result type alias for Korpus operations.
pub type Result<T> = std::result::Result<T, KorpusError>;
