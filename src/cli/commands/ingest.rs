//! Ingest command implementation.

use crate::audio::segmentation_available;
use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use anyhow::Result;
use std::path::PathBuf;

/// Run the ingest command.
pub async fn run_ingest(
    pdfs: &[PathBuf],
    audios: &[PathBuf],
    settings: Settings,
) -> Result<()> {
    if pdfs.is_empty() && audios.is_empty() {
        Output::warning("Nothing to ingest. Pass --pdf and/or --audio paths.");
        return Ok(());
    }

    if !pdfs.is_empty() {
        preflight::check(Operation::IngestPdf)?;
    }
    if !audios.is_empty() {
        preflight::check(Operation::IngestAudio)?;
        if !segmentation_available() {
            Output::warning(
                "ffmpeg/ffprobe not found: recordings over the segment ceiling cannot be split.",
            );
        }
    }

    for path in pdfs.iter().chain(audios.iter()) {
        if !path.exists() {
            anyhow::bail!("File not found: {}", path.display());
        }
    }

    let orchestrator = Orchestrator::new(settings)?;

    let spinner = Output::spinner(&format!(
        "Ingesting {} PDF(s) and {} audio file(s)...",
        pdfs.len(),
        audios.len()
    ));
    let result = orchestrator.ingest_all(pdfs, audios).await;
    spinner.finish_and_clear();

    match result {
        Ok(report) => {
            Output::success(&format!(
                "Ingested {} PDF and {} audio document(s)",
                report.pdf_documents, report.audio_documents
            ));
            Output::kv("chunks indexed", &report.chunks_indexed.to_string());
            Ok(())
        }
        Err(e) => {
            Output::error(&format!("Ingestion failed: {}", e));
            Err(e.into())
        }
    }
}
