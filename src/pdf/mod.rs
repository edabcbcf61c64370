//! PDF text extraction.
//!
//! Extraction is delegated to the external `pdftotext` tool (poppler-utils).
//! A scanned PDF with no text layer legitimately extracts to an empty string;
//! that is not an error here.

use crate::error::{KorpusError, Result};
use async_trait::async_trait;
use futures::future::try_join_all;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, instrument};

/// Trait for PDF text extraction backends.
#[async_trait]
pub trait PdfExtractor: Send + Sync {
    /// Extract the full text of a PDF. May return an empty string.
    async fn extract(&self, path: &Path) -> Result<String>;
}

/// `pdftotext`-backed extractor.
pub struct PdftotextExtractor;

impl PdftotextExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for PdftotextExtractor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PdfExtractor for PdftotextExtractor {
    #[instrument(skip(self), fields(path = %path.display()))]
    async fn extract(&self, path: &Path) -> Result<String> {
        // "-" writes the extracted text to stdout
        let result = Command::new("pdftotext")
            .arg("-layout")
            .arg(path)
            .arg("-")
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await;

        let output = match result {
            Ok(o) => o,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(KorpusError::ToolNotFound("pdftotext".into()));
            }
            Err(e) => {
                return Err(KorpusError::PdfExtraction(format!(
                    "pdftotext execution failed for {}: {}",
                    path.display(),
                    e
                )));
            }
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(KorpusError::PdfExtraction(format!(
                "pdftotext failed for {}: {}",
                path.display(),
                stderr
            )));
        }

        let text = String::from_utf8_lossy(&output.stdout).to_string();
        debug!("Extracted {} bytes of text", text.len());
        Ok(text)
    }
}

/// Extract text from several PDFs concurrently, preserving input order.
pub async fn load_pdfs(
    extractor: &dyn PdfExtractor,
    paths: &[PathBuf],
) -> Result<Vec<(PathBuf, String)>> {
    let tasks = paths.iter().map(|path| async move {
        let text = extractor.extract(path).await?;
        Ok::<_, KorpusError>((path.clone(), text))
    });
    try_join_all(tasks).await
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedExtractor;

    #[async_trait]
    impl PdfExtractor for FixedExtractor {
        async fn extract(&self, path: &Path) -> Result<String> {
            Ok(format!("text of {}", path.display()))
        }
    }

    #[tokio::test]
    async fn test_load_pdfs_preserves_order() {
        let paths: Vec<PathBuf> = vec!["b.pdf".into(), "a.pdf".into(), "c.pdf".into()];
        let loaded = load_pdfs(&FixedExtractor, &paths).await.unwrap();
        assert_eq!(loaded.len(), 3);
        for (path, text) in &loaded {
            assert_eq!(text, &format!("text of {}", path.display()));
        }
        assert_eq!(loaded[0].0, PathBuf::from("b.pdf"));
    }

    #[tokio::test]
    async fn test_load_pdfs_empty_input() {
        let loaded = load_pdfs(&FixedExtractor, &[]).await.unwrap();
        assert!(loaded.is_empty());
    }
}
