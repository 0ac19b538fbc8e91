//! Corpus loading: fetch the latest report and turn it into text.
//!
//! Every load discards the previous local copy and fetches fresh bytes, so a
//! document never reflects a stale report.

mod extract;

pub use extract::extract_text;

use crate::error::Result;
use crate::storage::{self, BlobStore};
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, instrument};

/// The extracted text of one report.
#[derive(Debug, Clone)]
pub struct CorpusDocument {
    /// Full report text.
    pub text: String,
    /// Blob name the report was fetched from.
    pub source: String,
    /// When the report was fetched.
    pub fetched_at: DateTime<Utc>,
    /// Where the downloaded report was written.
    pub local_path: PathBuf,
}

/// Fetches the report from a blob store.
pub struct CorpusLoader {
    store: Arc<dyn BlobStore>,
    object: String,
    download_path: PathBuf,
}

impl CorpusLoader {
    /// Create a loader for the report stored under `object`.
    pub fn new(store: Arc<dyn BlobStore>, object: &str, download_path: PathBuf) -> Self {
        Self {
            store,
            object: object.to_string(),
            download_path,
        }
    }

    /// Blob name of the report.
    pub fn object(&self) -> &str {
        &self.object
    }

    /// Local path the report is downloaded to.
    pub fn download_path(&self) -> &Path {
        &self.download_path
    }

    /// Fetch the latest report and extract its text.
    #[instrument(skip(self), fields(object = %self.object))]
    pub async fn load(&self) -> Result<CorpusDocument> {
        let bytes = storage::download(self.store.as_ref(), &self.object, &self.download_path).await?;
        let fetched_at = Utc::now();
        info!("Downloaded the latest report ({} bytes)", bytes.len());

        let text = extract_text(&bytes, &self.object)?;
        info!("Extracted {} characters of report text", text.chars().count());

        Ok(CorpusDocument {
            text,
            source: self.object.clone(),
            fetched_at,
            local_path: self.download_path.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::WatchpostError;
    use crate::storage::LocalBlobStore;

    fn setup(report: &[u8], name: &str) -> (tempfile::TempDir, CorpusLoader) {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("bucket");
        std::fs::create_dir_all(root.join("folder_name")).unwrap();
        std::fs::write(root.join("folder_name").join(name), report).unwrap();

        let store = Arc::new(LocalBlobStore::new(root));
        let loader = CorpusLoader::new(
            store,
            &format!("folder_name/{}", name),
            dir.path().join("latest-report"),
        );
        (dir, loader)
    }

    #[tokio::test]
    async fn test_load_discards_stale_copy() {
        let (_dir, loader) = setup(b"Created Time: 2024-05-01 10:00:00\nOne person.", "report.txt");
        std::fs::write(loader.download_path(), "old report").unwrap();

        let document = loader.load().await.unwrap();
        assert!(document.text.starts_with("Created Time"));
        assert_eq!(document.source, "folder_name/report.txt");
        assert_eq!(
            std::fs::read_to_string(loader.download_path()).unwrap(),
            document.text
        );
    }

    #[tokio::test]
    async fn test_missing_report_is_fetch_error() {
        let (_dir, loader) = setup(b"x", "report.txt");
        let loader = CorpusLoader::new(
            Arc::new(LocalBlobStore::new(PathBuf::from("/nonexistent/watchpost"))),
            loader.object(),
            loader.download_path().to_path_buf(),
        );
        assert!(matches!(loader.load().await, Err(WatchpostError::Fetch(_))));
    }

    #[tokio::test]
    async fn test_corrupt_report_is_extraction_error() {
        let (_dir, loader) = setup(b"garbage bytes", "report.pdf");
        assert!(matches!(loader.load().await, Err(WatchpostError::Extraction(_))));
    }
}
