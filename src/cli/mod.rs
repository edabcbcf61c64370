//! CLI module for Korpus.

pub mod commands;
mod output;
pub mod preflight;

pub use output::Output;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Korpus - Document Ingestion and Retrieval
///
/// Ingest PDFs and audio recordings into a vector index and search them
/// semantically.
#[derive(Parser, Debug)]
#[command(name = "korpus")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Ingest documents into the vector collection
    Ingest {
        /// PDF files to ingest
        #[arg(long = "pdf", value_name = "PATH")]
        pdfs: Vec<PathBuf>,

        /// Audio files to ingest
        #[arg(long = "audio", value_name = "PATH")]
        audios: Vec<PathBuf>,
    },

    /// Search for relevant fragments
    Search {
        /// Search query
        query: String,

        /// Maximum number of results
        #[arg(short, long, default_value = "5")]
        limit: usize,

        /// Restrict results to one source kind (pdf, audio)
        #[arg(short, long)]
        source: Option<String>,
    },

    /// Check system requirements and configuration
    Doctor,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Show configuration file path
    Path,
}
