//! Refresh command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::pipeline::Pipeline;
use anyhow::Result;

/// Run the refresh command.
pub async fn run_refresh(settings: Settings) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Refresh, &settings) {
        Output::error(&format!("{}", e));
        return Err(e.into());
    }

    let pipeline = Pipeline::new(&settings)?;

    let spinner = Output::spinner("Fetching the latest report...");
    let result = pipeline.refresh().await;
    spinner.finish_and_clear();

    match result {
        Ok(kb) => {
            Output::success(&format!(
                "Indexed {} excerpts from {}",
                kb.index.len(),
                kb.source()
            ));
            Output::kv("Created time", kb.created_time());
            if let Some(upload_time) = &kb.metadata.upload_time {
                Output::kv("Upload time", upload_time);
            }
            Output::kv("Index", &pipeline.index_path().display().to_string());
        }
        Err(e) => {
            Output::error(&format!("Refresh failed: {}", e));
            return Err(e.into());
        }
    }

    Ok(())
}
