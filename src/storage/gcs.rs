//! Google Cloud Storage backend using the JSON API.
//!
//! Authentication is a bearer token read from an environment variable (for
//! example the output of `gcloud auth print-access-token`). Without a token
//! only public buckets are readable. A custom endpoint points the store at
//! an emulator such as fake-gcs-server.

use super::{sort_oldest_first, BlobObject, BlobStore};
use crate::error::{Result, WatchpostError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::StatusCode;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, instrument};
use url::Url;

/// Timeout for a single storage request.
const REQUEST_TIMEOUT_SECS: u64 = 120;

/// Google Cloud Storage blob store.
pub struct GcsBlobStore {
    client: reqwest::Client,
    endpoint: Url,
    bucket: String,
    token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListResponse {
    #[serde(default)]
    items: Vec<GcsObject>,
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GcsObject {
    name: String,
    time_created: Option<DateTime<Utc>>,
    /// The JSON API encodes sizes as strings.
    size: Option<String>,
}

impl From<GcsObject> for BlobObject {
    fn from(object: GcsObject) -> Self {
        Self {
            name: object.name,
            created_at: object.time_created,
            size: object.size.and_then(|s| s.parse().ok()).unwrap_or(0),
        }
    }
}

impl GcsBlobStore {
    /// Create a store for `bucket`, reading the bearer token from `token_env` if set.
    pub fn new(bucket: &str, endpoint: &str, token_env: Option<&str>) -> Result<Self> {
        if bucket.is_empty() {
            return Err(WatchpostError::Config("storage.bucket must be set".to_string()));
        }

        let endpoint = Url::parse(endpoint)
            .map_err(|e| WatchpostError::Config(format!("Invalid storage endpoint '{}': {}", endpoint, e)))?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| WatchpostError::Config(format!("Failed to create HTTP client: {}", e)))?;

        let token = token_env
            .and_then(|var| std::env::var(var).ok())
            .filter(|t| !t.is_empty());

        Ok(Self {
            client,
            endpoint,
            bucket: bucket.to_string(),
            token,
        })
    }

    /// URL of the bucket's object collection.
    fn objects_url(&self) -> Result<Url> {
        let mut url = self.endpoint.clone();
        url.path_segments_mut()
            .map_err(|_| WatchpostError::Config(format!("Invalid storage endpoint: {}", self.endpoint)))?
            .pop_if_empty()
            .extend(["storage", "v1", "b", self.bucket.as_str(), "o"]);
        Ok(url)
    }

    /// Media download URL for an object. The object name is a single encoded segment.
    fn media_url(&self, name: &str) -> Result<Url> {
        let mut url = self.objects_url()?;
        url.path_segments_mut()
            .map_err(|_| WatchpostError::Config(format!("Invalid storage endpoint: {}", self.endpoint)))?
            .push(name);
        url.query_pairs_mut().append_pair("alt", "media");
        Ok(url)
    }

    fn get(&self, url: Url) -> reqwest::RequestBuilder {
        let request = self.client.get(url);
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }
}

#[async_trait]
impl BlobStore for GcsBlobStore {
    fn kind(&self) -> &'static str {
        "gcs"
    }

    #[instrument(skip(self))]
    async fn fetch(&self, name: &str) -> Result<Vec<u8>> {
        let url = self.media_url(name)?;
        debug!("Fetching gs://{}/{}", self.bucket, name);

        let response = self
            .get(url)
            .send()
            .await
            .map_err(|e| WatchpostError::Fetch(format!("Request for {} failed: {}", name, e)))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(WatchpostError::Fetch(format!(
                "Object not found: gs://{}/{}",
                self.bucket, name
            )));
        }

        let response = response
            .error_for_status()
            .map_err(|e| WatchpostError::Fetch(format!("Storage returned an error for {}: {}", name, e)))?;

        let bytes = response
            .bytes()
            .await
            .map_err(|e| WatchpostError::Fetch(format!("Failed to read {}: {}", name, e)))?;

        Ok(bytes.to_vec())
    }

    #[instrument(skip(self))]
    async fn list(&self, prefix: &str) -> Result<Vec<BlobObject>> {
        let mut objects = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut url = self.objects_url()?;
            {
                let mut query = url.query_pairs_mut();
                query.append_pair("prefix", prefix);
                query.append_pair("fields", "items(name,timeCreated,size),nextPageToken");
                if let Some(token) = &page_token {
                    query.append_pair("pageToken", token);
                }
            }

            let page: ListResponse = self
                .get(url)
                .send()
                .await
                .and_then(|r| r.error_for_status())
                .map_err(|e| WatchpostError::Fetch(format!("Listing '{}' failed: {}", prefix, e)))?
                .json()
                .await
                .map_err(|e| WatchpostError::Fetch(format!("Invalid listing response: {}", e)))?;

            objects.extend(page.items.into_iter().map(BlobObject::from));

            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }

        sort_oldest_first(&mut objects);
        debug!("Listed {} objects under '{}'", objects.len(), prefix);
        Ok(objects)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store(endpoint: &str) -> GcsBlobStore {
        GcsBlobStore::new("bucket_name", endpoint, None).unwrap()
    }

    #[test]
    fn test_media_url_encodes_object_name() {
        let url = store("https://storage.googleapis.com")
            .media_url("folder_name/video_analysis_demo.pdf")
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://storage.googleapis.com/storage/v1/b/bucket_name/o/folder_name%2Fvideo_analysis_demo.pdf?alt=media"
        );
    }

    #[test]
    fn test_custom_endpoint() {
        let url = store("http://localhost:4443/").objects_url().unwrap();
        assert_eq!(url.as_str(), "http://localhost:4443/storage/v1/b/bucket_name/o");
    }

    #[test]
    fn test_rejects_bad_config() {
        assert!(matches!(
            GcsBlobStore::new("", "https://storage.googleapis.com", None),
            Err(WatchpostError::Config(_))
        ));
        assert!(matches!(
            GcsBlobStore::new("bucket", "not a url", None),
            Err(WatchpostError::Config(_))
        ));
    }

    #[test]
    fn test_parse_listing() {
        let json = r#"{
            "items": [
                {"name": "robot/video_2.mp4", "timeCreated": "2024-05-01T10:05:00.000Z", "size": "2048"},
                {"name": "robot/video_1.mp4", "timeCreated": "2024-05-01T10:00:00.000Z"}
            ],
            "nextPageToken": "abc"
        }"#;
        let page: ListResponse = serde_json::from_str(json).unwrap();
        assert_eq!(page.next_page_token.as_deref(), Some("abc"));

        let mut objects: Vec<BlobObject> = page.items.into_iter().map(BlobObject::from).collect();
        sort_oldest_first(&mut objects);
        assert_eq!(objects[0].name, "robot/video_1.mp4");
        assert_eq!(objects[0].size, 0);
        assert_eq!(objects[1].size, 2048);

        let empty: ListResponse = serde_json::from_str("{}").unwrap();
        assert!(empty.items.is_empty());
    }
}
