//! Pre-flight checks before expensive operations.
//!
//! Validates that required tools and configuration are available before
//! starting operations that would otherwise fail midway.

use crate::error::{KorpusError, Result};
use std::process::Command;

/// Requirements for different operations.
#[derive(Debug, Clone, Copy)]
pub enum Operation {
    /// PDF ingestion requires the API key and pdftotext.
    IngestPdf,
    /// Audio ingestion requires the API key; ffmpeg/ffprobe are checked
    /// separately since short files transcribe without segmentation.
    IngestAudio,
    /// Search requires the API key (query embedding).
    Search,
}

/// Run pre-flight checks for the given operation.
///
/// Returns Ok(()) if all checks pass, or an error describing what's missing.
pub fn check(operation: Operation) -> Result<()> {
    match operation {
        Operation::IngestPdf => {
            check_api_key()?;
            check_tool("pdftotext")?;
        }
        Operation::IngestAudio => {
            check_api_key()?;
        }
        Operation::Search => {
            check_api_key()?;
        }
    }
    Ok(())
}

/// Check if OpenAI API key is configured.
pub fn check_api_key() -> Result<()> {
    match std::env::var("OPENAI_API_KEY") {
        Ok(key) if !key.is_empty() => Ok(()),
        Ok(_) => Err(KorpusError::Config(
            "OPENAI_API_KEY is empty. Set it with: export OPENAI_API_KEY='sk-...'".to_string(),
        )),
        Err(_) => Err(KorpusError::Config(
            "OPENAI_API_KEY not set. Set it with: export OPENAI_API_KEY='sk-...'".to_string(),
        )),
    }
}

/// Check if an external tool is available.
pub fn check_tool(name: &str) -> Result<()> {
    // ffmpeg/ffprobe/pdftotext use -v style flags (single dash)
    let version_arg = match name {
        "ffmpeg" | "ffprobe" => "-version",
        "pdftotext" => "-v",
        _ => "--version",
    };
    match Command::new(name).arg(version_arg).output() {
        Ok(output) if output.status.success() => Ok(()),
        Ok(_) => Err(KorpusError::ToolNotFound(format!(
            "{} is installed but not working correctly",
            name
        ))),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(KorpusError::ToolNotFound(name.to_string()))
        }
        Err(e) => Err(KorpusError::ToolNotFound(format!("{}: {}", name, e))),
    }
}
