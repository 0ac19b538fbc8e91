//! Configuration settings for Watchpost.

use crate::chunking::{ChunkingConfig, SplitStrategy};
use crate::error::{Result, WatchpostError};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub storage: StorageSettings,
    pub chunking: ChunkingSettings,
    pub embedding: EmbeddingSettings,
    pub index: IndexSettings,
    pub answer: AnswerSettings,
    pub prompts: PromptSettings,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Directory for storing application data.
    pub data_dir: String,
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            data_dir: "~/.watchpost".to_string(),
            log_level: "warn".to_string(),
        }
    }
}

/// Blob store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    /// Storage provider (gcs, local).
    pub provider: String,
    /// Bucket holding the report and recordings (gcs provider).
    pub bucket: String,
    /// Storage API endpoint (gcs provider).
    pub endpoint: String,
    /// Environment variable holding a bearer token (gcs provider).
    pub token_env: Option<String>,
    /// Root directory (local provider).
    pub local_root: String,
    /// Object name of the analysis report.
    pub report_object: String,
    /// Folder prefix holding the recordings.
    pub media_prefix: String,
    /// Local path the report is downloaded to.
    pub download_path: String,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            provider: "gcs".to_string(),
            bucket: "bucket_name".to_string(),
            endpoint: "https://storage.googleapis.com".to_string(),
            token_env: Some("GCS_ACCESS_TOKEN".to_string()),
            local_root: "~/.watchpost/bucket".to_string(),
            report_object: "folder_name/video_analysis_demo.pdf".to_string(),
            media_prefix: "folder_name/".to_string(),
            download_path: "/tmp/latest-pdf-file.pdf".to_string(),
        }
    }
}

impl StorageSettings {
    /// Get the expanded local storage root.
    pub fn local_root_path(&self) -> PathBuf {
        Settings::expand_path(&self.local_root)
    }

    /// Get the expanded report download path.
    pub fn download_path(&self) -> PathBuf {
        Settings::expand_path(&self.download_path)
    }
}

/// Text chunking settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingSettings {
    /// Boundary strategy (recursive, character).
    pub strategy: String,
    /// Maximum chunk length in characters.
    pub max_chunk_size: usize,
    /// Characters shared by consecutive chunks.
    pub overlap: usize,
}

impl Default for ChunkingSettings {
    fn default() -> Self {
        Self {
            strategy: "recursive".to_string(),
            max_chunk_size: 10_000,
            overlap: 1_000,
        }
    }
}

impl ChunkingSettings {
    /// Build a validated chunking config.
    pub fn to_config(&self) -> Result<ChunkingConfig> {
        let strategy: SplitStrategy = self.strategy.parse().map_err(WatchpostError::Config)?;
        ChunkingConfig::new(self.max_chunk_size, self.overlap, strategy)
    }
}

/// Embedding generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingSettings {
    /// Embedding provider (openai, hashing).
    pub provider: String,
    /// Embedding model to use.
    pub model: String,
    /// Embedding dimensions.
    pub dimensions: u32,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            provider: "openai".to_string(),
            model: "text-embedding-3-small".to_string(),
            dimensions: 1536,
        }
    }
}

/// Vector index settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexSettings {
    /// Path to the persisted index database.
    pub path: String,
}

impl Default for IndexSettings {
    fn default() -> Self {
        Self {
            path: "~/.watchpost/index.db".to_string(),
        }
    }
}

/// Grounded answer settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnswerSettings {
    /// LLM model for answer generation.
    pub model: String,
    /// Sampling temperature.
    pub temperature: f32,
    /// Number of chunks retrieved per question.
    pub top_k: usize,
}

impl Default for AnswerSettings {
    fn default() -> Self {
        Self {
            model: "gpt-4o-mini".to_string(),
            temperature: 0.3,
            top_k: 4,
        }
    }
}

/// Prompt customization settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct PromptSettings {
    /// Directory for custom prompts (overrides defaults).
    pub custom_dir: Option<String>,
    /// Custom variables available in all prompts as {{variable_name}}.
    pub variables: std::collections::HashMap<String, String>,
}

impl Settings {
    /// Load settings from the default configuration file.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from a specific path, or default location if None.
    pub fn load_from(path: Option<&PathBuf>) -> Result<Self> {
        let config_path = match path {
            Some(p) => p.clone(),
            None => Self::default_config_path(),
        };

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let settings: Settings = toml::from_str(&content)?;
            Ok(settings)
        } else {
            Ok(Settings::default())
        }
    }

    /// Check settings that would otherwise fail midway through a pipeline run.
    pub fn validate(&self) -> Result<()> {
        self.chunking.to_config()?;

        if self.answer.top_k == 0 {
            return Err(WatchpostError::Config("answer.top_k must be at least 1".to_string()));
        }

        match self.storage.provider.to_lowercase().as_str() {
            "gcs" | "local" => {}
            other => {
                return Err(WatchpostError::Config(format!(
                    "Unknown storage provider: {}",
                    other
                )))
            }
        }

        match self.embedding.provider.to_lowercase().as_str() {
            "openai" | "hashing" => Ok(()),
            other => Err(WatchpostError::Config(format!(
                "Unknown embedding provider: {}",
                other
            ))),
        }
    }

    /// Save settings to a specific path.
    pub fn save_to(&self, path: &PathBuf) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| WatchpostError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("watchpost")
            .join("config.toml")
    }

    /// Expand shell variables in paths (e.g., ~).
    pub fn expand_path(path: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(path).to_string())
    }

    /// Get the expanded data directory path.
    pub fn data_dir(&self) -> PathBuf {
        Self::expand_path(&self.general.data_dir)
    }

    /// Get the expanded index database path.
    pub fn index_path(&self) -> PathBuf {
        Self::expand_path(&self.index.path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let settings = Settings::default();
        settings.validate().unwrap();
        assert_eq!(settings.chunking.max_chunk_size, 10_000);
        assert_eq!(settings.chunking.overlap, 1_000);
        assert_eq!(settings.answer.top_k, 4);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let settings: Settings = toml::from_str(
            r#"
            [storage]
            provider = "local"
            local_root = "/srv/reports"

            [chunking]
            max_chunk_size = 500
            overlap = 50
            "#,
        )
        .unwrap();

        assert_eq!(settings.storage.local_root_path(), PathBuf::from("/srv/reports"));
        assert_eq!(settings.storage.report_object, "folder_name/video_analysis_demo.pdf");
        assert_eq!(settings.chunking.to_config().unwrap().max_chunk_size, 500);
        assert_eq!(settings.answer.model, "gpt-4o-mini");
    }

    #[test]
    fn test_validate_rejects_bad_chunking() {
        let mut settings = Settings::default();
        settings.chunking.overlap = settings.chunking.max_chunk_size;
        assert!(matches!(settings.validate(), Err(WatchpostError::Config(_))));

        let mut settings = Settings::default();
        settings.chunking.strategy = "semantic".to_string();
        assert!(matches!(settings.validate(), Err(WatchpostError::Config(_))));

        let mut settings = Settings::default();
        settings.storage.provider = "s3".to_string();
        assert!(matches!(settings.validate(), Err(WatchpostError::Config(_))));
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let mut settings = Settings::default();
        settings.answer.top_k = 7;
        settings.save_to(&path).unwrap();

        let loaded = Settings::load_from(Some(&path)).unwrap();
        assert_eq!(loaded.answer.top_k, 7);
    }
}
