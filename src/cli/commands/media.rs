//! Media listing command implementation.

use crate::cli::Output;
use crate::config::Settings;
use crate::storage::create_blob_store;
use anyhow::Result;

/// Run the media command.
pub async fn run_media(prefix: Option<String>, settings: Settings) -> Result<()> {
    let store = create_blob_store(&settings.storage)?;
    let prefix = prefix.unwrap_or_else(|| settings.storage.media_prefix.clone());

    let spinner = Output::spinner("Listing recordings...");
    let listed = store.list(&prefix).await;
    spinner.finish_and_clear();

    match listed {
        Ok(objects) => {
            let videos: Vec<_> = objects.into_iter().filter(|o| o.is_video()).collect();
            if videos.is_empty() {
                Output::info(&format!("No recordings under '{}'.", prefix));
            } else {
                Output::header(&format!("Recordings ({})", videos.len()));
                println!();
                for video in &videos {
                    Output::media_info(&video.name, video.created_at, video.size);
                }
            }
        }
        Err(e) => {
            Output::error(&format!("Failed to list recordings: {}", e));
            return Err(e.into());
        }
    }

    Ok(())
}
