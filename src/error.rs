//! Error types for Watchpost.

use thiserror::Error;

/// Library-level error type for Watchpost operations.
#[derive(Error, Debug)]
pub enum WatchpostError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to fetch report: {0}")]
    Fetch(String),

    #[error("Failed to extract report text: {0}")]
    Extraction(String),

    #[error("Embedding generation failed: {0}")]
    Embedding(String),

    #[error("Index build failed: {0}")]
    IndexBuild(String),

    #[error("Index error: {0}")]
    Index(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Answer generation failed: {0}")]
    Generation(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
}

/// Result type alias for Watchpost operations.
pub type Result<T> = std::result::Result<T, WatchpostError>;
