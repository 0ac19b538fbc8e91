//! Download command implementation.

use crate::cli::Output;
use crate::config::Settings;
use crate::storage::{self, create_blob_store};
use anyhow::Result;

/// Run the download command.
pub async fn run_download(name: &str, output: Option<String>, settings: Settings) -> Result<()> {
    let store = create_blob_store(&settings.storage)?;
    let dest = match output {
        Some(path) => Settings::expand_path(&path),
        None => storage::default_download_path(&settings.data_dir().join("downloads"), name),
    };

    let spinner = Output::spinner(&format!("Downloading {}...", name));
    let result = storage::download(store.as_ref(), name, &dest).await;
    spinner.finish_and_clear();

    match result {
        Ok(bytes) => {
            Output::success(&format!(
                "Saved {} ({} bytes) to {}",
                name,
                bytes.len(),
                dest.display()
            ));
        }
        Err(e) => {
            Output::error(&format!("Download failed: {}", e));
            return Err(e.into());
        }
    }

    Ok(())
}
