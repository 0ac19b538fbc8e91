//! Blob store abstraction for Watchpost.
//!
//! Reports and recordings live as named objects in a blob store. The loader
//! fetches the report by its stable name; listing is used to find recordings
//! for display and download.

mod gcs;
mod local;

pub use gcs::GcsBlobStore;
pub use local::LocalBlobStore;

use crate::config::StorageSettings;
use crate::error::{Result, WatchpostError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, instrument};

/// Extensions of recordings stored next to the report.
pub const VIDEO_EXTENSIONS: &[&str] = &["mp4", "avi", "mkv"];

/// An object in the blob store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlobObject {
    /// Full object name, including any folder prefix.
    pub name: String,
    /// When the object was created, if the store reports it.
    pub created_at: Option<DateTime<Utc>>,
    /// Size in bytes.
    pub size: u64,
}

impl BlobObject {
    /// Last path segment of the object name.
    pub fn file_name(&self) -> &str {
        self.name.rsplit('/').next().unwrap_or(&self.name)
    }

    /// Whether this object is a recording.
    pub fn is_video(&self) -> bool {
        is_video(&self.name)
    }
}

/// Trait for blob store backends.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Short backend name for display.
    fn kind(&self) -> &'static str;

    /// Fetch the full contents of an object.
    async fn fetch(&self, name: &str) -> Result<Vec<u8>>;

    /// List objects whose names start with `prefix`, oldest first.
    async fn list(&self, prefix: &str) -> Result<Vec<BlobObject>>;
}

/// Create the blob store named by the settings.
pub fn create_blob_store(settings: &StorageSettings) -> Result<Arc<dyn BlobStore>> {
    match settings.provider.to_lowercase().as_str() {
        "gcs" => Ok(Arc::new(GcsBlobStore::new(
            &settings.bucket,
            &settings.endpoint,
            settings.token_env.as_deref(),
        )?)),
        "local" => Ok(Arc::new(LocalBlobStore::new(settings.local_root_path()))),
        other => Err(WatchpostError::Config(format!(
            "Unknown storage provider: {}",
            other
        ))),
    }
}

/// Check whether a name has a recording extension.
pub fn is_video(name: &str) -> bool {
    Path::new(name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| VIDEO_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// Order objects oldest first; objects without a creation time go last, ties by name.
pub fn sort_oldest_first(objects: &mut [BlobObject]) {
    objects.sort_by(|a, b| {
        (a.created_at.is_none(), a.created_at, &a.name).cmp(&(b.created_at.is_none(), b.created_at, &b.name))
    });
}

/// Fetch an object and write it to `dest`, discarding any previous file there.
///
/// Bytes are written to a temp file next to `dest` and moved into place.
#[instrument(skip(store), fields(store = store.kind()))]
pub async fn download(store: &dyn BlobStore, name: &str, dest: &Path) -> Result<Vec<u8>> {
    remove_stale(dest)?;

    let bytes = store.fetch(name).await?;
    write_atomically(&bytes, dest)?;

    debug!("Downloaded {} ({} bytes) to {:?}", name, bytes.len(), dest);
    Ok(bytes)
}

/// Default local path for a downloaded object.
pub fn default_download_path(dir: &Path, name: &str) -> PathBuf {
    let file_name = name.rsplit('/').next().unwrap_or(name);
    dir.join(file_name)
}

fn remove_stale(dest: &Path) -> Result<()> {
    match std::fs::remove_file(dest) {
        Ok(()) => {
            debug!("Removed stale copy at {:?}", dest);
            Ok(())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(WatchpostError::Fetch(format!(
            "Failed to remove stale copy {}: {}",
            dest.display(),
            e
        ))),
    }
}

fn write_atomically(bytes: &[u8], dest: &Path) -> Result<()> {
    let dir = match dest.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let write_err =
        |e: std::io::Error| WatchpostError::Fetch(format!("Failed to write {}: {}", dest.display(), e));

    std::fs::create_dir_all(&dir).map_err(write_err)?;
    let mut tmp = tempfile::NamedTempFile::new_in(&dir).map_err(write_err)?;
    tmp.write_all(bytes).map_err(write_err)?;
    tmp.persist(dest).map_err(|e| write_err(e.error))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn object(name: &str, created: Option<i64>) -> BlobObject {
        BlobObject {
            name: name.to_string(),
            created_at: created.map(|s| Utc.timestamp_opt(s, 0).unwrap()),
            size: 0,
        }
    }

    #[test]
    fn test_is_video() {
        assert!(is_video("robot/video_1.mp4"));
        assert!(is_video("robot/VIDEO_2.MKV"));
        assert!(is_video("clip.avi"));
        assert!(!is_video("folder_name/video_analysis2.pdf"));
        assert!(!is_video("mp4"));
    }

    #[test]
    fn test_sort_oldest_first() {
        let mut objects = vec![
            object("c", None),
            object("b", Some(200)),
            object("a", Some(100)),
            object("d", Some(100)),
        ];
        sort_oldest_first(&mut objects);
        let names: Vec<&str> = objects.iter().map(|o| o.name.as_str()).collect();
        assert_eq!(names, vec!["a", "d", "b", "c"]);
    }

    #[test]
    fn test_file_name() {
        assert_eq!(object("robot/video_1.mp4", None).file_name(), "video_1.mp4");
        assert_eq!(object("report.pdf", None).file_name(), "report.pdf");
        assert_eq!(
            default_download_path(Path::new("/tmp"), "robot/video_1.mp4"),
            PathBuf::from("/tmp/video_1.mp4")
        );
    }

    #[tokio::test]
    async fn test_download_replaces_existing_file() {
        let root = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(root.path().join("reports")).unwrap();
        std::fs::write(root.path().join("reports/latest.txt"), "fresh").unwrap();
        let store = LocalBlobStore::new(root.path().to_path_buf());

        let out = tempfile::tempdir().unwrap();
        let dest = out.path().join("latest.txt");
        std::fs::write(&dest, "stale contents").unwrap();

        let bytes = download(&store, "reports/latest.txt", &dest).await.unwrap();
        assert_eq!(bytes, b"fresh");
        assert_eq!(std::fs::read_to_string(&dest).unwrap(), "fresh");
    }
}
