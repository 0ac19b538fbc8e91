//! CLI command implementations.

mod ask;
mod chat;
mod config;
mod download;
mod media;
mod refresh;
mod search;
mod status;

pub use ask::run_ask;
pub use chat::run_chat;
pub use config::run_config;
pub use download::run_download;
pub use media::run_media;
pub use refresh::run_refresh;
pub use search::run_search;
pub use status::run_status;

use crate::cli::Output;
use crate::error::WatchpostError;
use crate::pipeline::{KnowledgeBase, Pipeline};

/// Load the persisted knowledge base, or refresh it when asked to.
async fn load_knowledge_base(pipeline: &Pipeline, refresh: bool) -> anyhow::Result<KnowledgeBase> {
    if refresh {
        let spinner = Output::spinner("Fetching the latest report...");
        let kb = pipeline.refresh().await;
        spinner.finish_and_clear();
        return Ok(kb?);
    }

    match pipeline.open() {
        Ok(kb) => Ok(kb),
        Err(e @ WatchpostError::Index(_)) => {
            Output::error(&format!("{}", e));
            Output::info("Run 'watchpost refresh' to build the index.");
            Err(e.into())
        }
        Err(e) => Err(e.into()),
    }
}
