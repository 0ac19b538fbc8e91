//! Search command implementation.

use super::load_knowledge_base;
use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::pipeline::Pipeline;
use anyhow::Result;

/// Run the search command.
pub async fn run_search(query: &str, k: Option<usize>, settings: Settings) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Search, &settings) {
        Output::error(&format!("{}", e));
        return Err(e.into());
    }

    let k = k.unwrap_or(settings.answer.top_k);
    let pipeline = Pipeline::new(&settings)?;
    let kb = load_knowledge_base(&pipeline, false).await?;

    let spinner = Output::spinner("Searching...");
    let results = pipeline.search(&kb, query, k).await;
    spinner.finish_and_clear();

    match results {
        Ok(hits) => {
            if hits.is_empty() {
                Output::warning("The index is empty.");
            } else {
                Output::success(&format!("Found {} results", hits.len()));

                for hit in &hits {
                    Output::search_result(hit.chunk.ordinal, hit.score, &hit.chunk.text);
                }
            }
        }
        Err(e) => {
            Output::error(&format!("Search failed: {}", e));
            return Err(e.into());
        }
    }

    Ok(())
}
