//! Ask command implementation.

use super::load_knowledge_base;
use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::pipeline::Pipeline;
use anyhow::Result;

/// Run the ask command.
pub async fn run_ask(
    question: &str,
    k: Option<usize>,
    refresh: bool,
    model: Option<String>,
    mut settings: Settings,
) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Ask, &settings) {
        Output::error(&format!("{}", e));
        return Err(e.into());
    }

    if let Some(model) = model {
        settings.answer.model = model;
    }
    let k = k.unwrap_or(settings.answer.top_k);

    let pipeline = Pipeline::new(&settings)?;
    let kb = load_knowledge_base(&pipeline, refresh).await?;

    let spinner = Output::spinner("Searching the report...");
    let result = pipeline.ask(&kb, question, k).await;
    spinner.finish_and_clear();

    match result {
        Ok(result) => {
            println!("\n{}\n", result.answer.text.trim());

            if !result.hits.is_empty() && !result.answer.is_not_available() {
                Output::header("Sources");
                for hit in &result.hits {
                    Output::search_result(hit.chunk.ordinal, hit.score, &hit.chunk.text);
                }
            }
        }
        Err(e) => {
            Output::error(&format!("Failed to generate answer: {}", e));
            return Err(e.into());
        }
    }

    Ok(())
}
