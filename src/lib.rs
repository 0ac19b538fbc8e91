//! Watchpost - Question answering over video analysis reports
//!
//! A CLI tool that fetches the latest video analysis report from a blob store,
//! indexes it for semantic search and answers questions grounded in it.
//!
//! # Overview
//!
//! Watchpost allows you to:
//! - Refresh the knowledge base from the newest report in a bucket
//! - Ask questions about suspicious activity and get grounded answers
//! - Search the report semantically
//! - List and download the recordings stored alongside the report
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - `config` - Configuration management and prompt templates
//! - `storage` - Blob store abstraction (GCS, local directory)
//! - `corpus` - Report download and text extraction
//! - `chunking` - Overlapping text chunking
//! - `metadata` - Created/upload time extraction
//! - `embedding` - Embedding generation
//! - `index` - Vector index with SQLite persistence
//! - `answer` - Grounded answer generation
//! - `pipeline` - Pipeline coordination
//!
//! # Example
//!
//! ```rust,no_run
//! use watchpost::config::Settings;
//! use watchpost::pipeline::Pipeline;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let pipeline = Pipeline::new(&settings)?;
//!
//!     let kb = pipeline.refresh().await?;
//!     let result = pipeline.ask(&kb, "Did anyone enter the cage?", 4).await?;
//!     println!("{}", result.answer.text);
//!
//!     Ok(())
//! }
//! ```

pub mod answer;
pub mod chunking;
pub mod cli;
pub mod config;
pub mod corpus;
pub mod embedding;
pub mod error;
pub mod index;
pub mod metadata;
pub mod openai;
pub mod pipeline;
pub mod storage;

pub use error::{Result, WatchpostError};
