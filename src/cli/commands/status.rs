//! Status command implementation.

use crate::cli::Output;
use crate::config::Settings;
use crate::index::VectorIndex;
use anyhow::Result;

/// Run the status command.
pub fn run_status(settings: Settings) -> Result<()> {
    let path = settings.index_path();

    if !path.exists() {
        Output::info("No index yet. Use 'watchpost refresh' to build one.");
        return Ok(());
    }

    let index = VectorIndex::load(&path)?;
    let metadata = index.metadata();

    Output::header("Index");
    Output::kv("Path", &path.display().to_string());
    Output::kv("Report", &metadata.source);
    Output::kv("Fetched at", &metadata.fetched_at.to_rfc3339());
    Output::kv("Built at", &metadata.built_at.to_rfc3339());
    Output::kv("Created time", &metadata.created_time);
    if let Some(upload_time) = &metadata.upload_time {
        Output::kv("Upload time", upload_time);
    }
    Output::kv("Excerpts", &index.len().to_string());
    Output::kv("Dimensions", &metadata.dimensions.to_string());

    Ok(())
}
