//! Search command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use crate::rag::Retriever;
use crate::vector_store::SourceKind;
use anyhow::Result;

/// Run the search command.
pub async fn run_search(
    query: &str,
    limit: usize,
    source: Option<&str>,
    settings: Settings,
) -> Result<()> {
    preflight::check(Operation::Search)?;

    let source_filter = source
        .map(|s| s.parse::<SourceKind>())
        .transpose()
        .map_err(|e| anyhow::anyhow!(e))?;

    let orchestrator = Orchestrator::new(settings)?;
    let retriever = Retriever::new(orchestrator.embedder(), orchestrator.vector_store());

    let spinner = Output::spinner("Searching...");
    let results = retriever.retrieve(query, limit, source_filter).await;
    spinner.finish_and_clear();

    match results {
        Ok(contexts) => {
            if contexts.is_empty() {
                Output::warning("No results found matching your query.");
            } else {
                Output::success(&format!("Found {} results", contexts.len()));
                for context in &contexts {
                    Output::search_result(
                        &context.source,
                        &context.filename,
                        context.chunk_index,
                        context.score,
                        &context.text,
                    );
                }
            }
            Ok(())
        }
        Err(e) => {
            Output::error(&format!("Search failed: {}", e));
            Err(e.into())
        }
    }
}
