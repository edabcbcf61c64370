//! Doctor command - verify system requirements and configuration.

use crate::cli::preflight::{check_api_key, check_tool};
use crate::cli::Output;
use crate::config::Settings;
use anyhow::Result;

/// Run the doctor command.
pub fn run_doctor(settings: &Settings) -> Result<()> {
    Output::info("Checking system requirements...");

    report_check("OPENAI_API_KEY", check_api_key().err().map(|e| e.to_string()));
    for tool in ["pdftotext", "ffmpeg", "ffprobe"] {
        report_check(tool, check_tool(tool).err().map(|e| e.to_string()));
    }

    Output::info("Configuration:");
    Output::kv("config file", &Settings::default_config_path().display().to_string());
    Output::kv("qdrant url", &settings.qdrant.url);
    Output::kv("collection", &settings.qdrant.collection);
    Output::kv(
        "chunking",
        &format!(
            "{} tokens, {} overlap",
            settings.chunking.max_tokens, settings.chunking.overlap_tokens
        ),
    );
    Output::kv(
        "segmentation",
        &format!(
            "{:.0}s ceiling, {:.0}s overlap",
            settings.segmentation.max_segment_seconds, settings.segmentation.overlap_seconds
        ),
    );
    Output::kv("embedding model", &settings.embedding.model);
    Output::kv("transcription model", &settings.transcription.model);

    Ok(())
}

fn report_check(name: &str, problem: Option<String>) {
    match problem {
        None => Output::success(&format!("{} ok", name)),
        Some(msg) => Output::warning(&format!("{}: {}", name, msg)),
    }
}
