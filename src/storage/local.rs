//! Directory-backed blob store.
//!
//! Object names are paths relative to the root, always with `/` separators.

use super::{sort_oldest_first, BlobObject, BlobStore};
use crate::error::{Result, WatchpostError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Blob store over a local directory.
pub struct LocalBlobStore {
    root: PathBuf,
}

impl LocalBlobStore {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    fn object_name(&self, path: &Path) -> Option<String> {
        let relative = path.strip_prefix(&self.root).ok()?;
        let parts: Vec<&str> = relative
            .components()
            .map(|c| c.as_os_str().to_str())
            .collect::<Option<_>>()?;
        Some(parts.join("/"))
    }
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    fn kind(&self) -> &'static str {
        "local"
    }

    async fn fetch(&self, name: &str) -> Result<Vec<u8>> {
        let path = self.root.join(name);
        tokio::fs::read(&path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                WatchpostError::Fetch(format!("Object not found: {}", path.display()))
            } else {
                WatchpostError::Fetch(format!("Failed to read {}: {}", path.display(), e))
            }
        })
    }

    async fn list(&self, prefix: &str) -> Result<Vec<BlobObject>> {
        if !self.root.is_dir() {
            return Err(WatchpostError::Fetch(format!(
                "Storage root is not a directory: {}",
                self.root.display()
            )));
        }

        let mut objects = Vec::new();

        for entry in WalkDir::new(&self.root).follow_links(true) {
            let entry = entry.map_err(|e| WatchpostError::Fetch(format!("Failed to list storage: {}", e)))?;
            if !entry.file_type().is_file() {
                continue;
            }

            let Some(name) = self.object_name(entry.path()) else {
                continue;
            };
            if !name.starts_with(prefix) {
                continue;
            }

            let metadata = entry
                .metadata()
                .map_err(|e| WatchpostError::Fetch(format!("Failed to stat {}: {}", name, e)))?;
            let created_at = metadata
                .created()
                .or_else(|_| metadata.modified())
                .ok()
                .map(DateTime::<Utc>::from);

            objects.push(BlobObject {
                name,
                created_at,
                size: metadata.len(),
            });
        }

        sort_oldest_first(&mut objects);
        Ok(objects)
    }
}
