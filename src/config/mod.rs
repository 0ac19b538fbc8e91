//! Configuration module for Watchpost.
//!
//! Handles loading and managing application settings and prompt templates.

mod prompts;
mod settings;

pub use prompts::{AnswerPrompts, Prompts, NOT_AVAILABLE};
pub use settings::{
    AnswerSettings, ChunkingSettings, EmbeddingSettings, GeneralSettings, IndexSettings,
    PromptSettings, Settings, StorageSettings,
};
