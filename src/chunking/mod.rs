//! Text chunking for breaking report text into overlapping, searchable segments.
//!
//! Chunks are bounded in length and consecutive chunks share a fixed number of
//! characters, so concatenating them while skipping each chunk's overlap
//! reconstructs the original text exactly.

mod splitter;

pub use splitter::TextSplitter;

use crate::error::{Result, WatchpostError};
use serde::{Deserialize, Serialize};

/// A contiguous piece of a corpus document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    /// Position of this chunk in the document (0-based).
    pub ordinal: usize,
    /// Text content of this chunk.
    pub text: String,
    /// Offset of the first character of this chunk in the document, in chars.
    pub start: usize,
    /// Number of leading characters shared with the previous chunk.
    pub overlap: usize,
}

impl Chunk {
    /// Create a new chunk.
    pub fn new(ordinal: usize, text: String, start: usize, overlap: usize) -> Self {
        Self {
            ordinal,
            text,
            start,
            overlap,
        }
    }

    /// Length of this chunk in characters.
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }

    /// Offset one past the last character of this chunk, in chars.
    pub fn end(&self) -> usize {
        self.start + self.char_len()
    }

    /// Ordinal of the previous (overlap-adjacent) chunk.
    pub fn previous(&self) -> Option<usize> {
        self.ordinal.checked_sub(1)
    }

    /// Ordinal of the next chunk, if `total` chunks were produced.
    pub fn next(&self, total: usize) -> Option<usize> {
        let next = self.ordinal + 1;
        (next < total).then_some(next)
    }

    /// The part of this chunk that is not shared with the previous chunk.
    pub fn fresh_text(&self) -> &str {
        match self.text.char_indices().nth(self.overlap) {
            Some((byte_idx, _)) => &self.text[byte_idx..],
            None => "",
        }
    }
}

/// Where a chunk may be cut.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SplitStrategy {
    /// Prefer paragraph, line, sentence and word boundaries near the window edge.
    #[default]
    Recursive,
    /// Always cut at the raw character limit.
    Character,
}

impl std::str::FromStr for SplitStrategy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "recursive" => Ok(SplitStrategy::Recursive),
            "character" | "fixed" => Ok(SplitStrategy::Character),
            _ => Err(format!("Unknown chunking strategy: {}", s)),
        }
    }
}

impl std::fmt::Display for SplitStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SplitStrategy::Recursive => write!(f, "recursive"),
            SplitStrategy::Character => write!(f, "character"),
        }
    }
}

/// Configuration for chunking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkingConfig {
    /// Maximum chunk length in characters.
    pub max_chunk_size: usize,
    /// Characters shared between consecutive chunks.
    pub overlap: usize,
    /// Boundary preference.
    pub strategy: SplitStrategy,
}

impl ChunkingConfig {
    /// Create a config, rejecting overlaps that would stop the split from advancing.
    pub fn new(max_chunk_size: usize, overlap: usize, strategy: SplitStrategy) -> Result<Self> {
        let config = Self {
            max_chunk_size,
            overlap,
            strategy,
        };
        config.validate()?;
        Ok(config)
    }

    /// Check `overlap < max_chunk_size`.
    pub fn validate(&self) -> Result<()> {
        if self.overlap >= self.max_chunk_size {
            return Err(WatchpostError::Config(format!(
                "chunk overlap ({}) must be smaller than max chunk size ({})",
                self.overlap, self.max_chunk_size
            )));
        }
        Ok(())
    }
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            max_chunk_size: 10_000,
            overlap: 1_000,
            strategy: SplitStrategy::Recursive,
        }
    }
}

/// Split text into overlapping chunks using the default boundary preference.
pub fn split(text: &str, max_chunk_size: usize, overlap: usize) -> Result<Vec<Chunk>> {
    let config = ChunkingConfig::new(max_chunk_size, overlap, SplitStrategy::Recursive)?;
    Ok(TextSplitter::new(config)?.split(text))
}
