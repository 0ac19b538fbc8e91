//! Overlapping window splitter.
//!
//! Windows of up to `max_chunk_size` characters are consumed greedily. Each
//! window after the first starts `overlap` characters before the previous
//! window's end. With the recursive strategy the cut is moved back to the
//! nearest paragraph, line, sentence or word boundary when one lies close to
//! the window edge.

use super::{Chunk, ChunkingConfig, SplitStrategy};
use crate::error::Result;
use tracing::debug;

/// Boundary separators, most preferred first. Separators on the same level are equivalent.
const BOUNDARY_LEVELS: &[&[&str]] = &[&["\n\n"], &["\n"], &[". ", "? ", "! "], &[" "]];

/// A boundary is only used if it lies within the last `1 / BOUNDARY_WINDOW_DIVISOR` of the window.
const BOUNDARY_WINDOW_DIVISOR: usize = 5;

/// Deterministic overlapping text splitter.
#[derive(Debug, Clone)]
pub struct TextSplitter {
    config: ChunkingConfig,
}

impl TextSplitter {
    /// Create a splitter, validating the config.
    pub fn new(config: ChunkingConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Split text into ordered, overlapping chunks.
    pub fn split(&self, text: &str) -> Vec<Chunk> {
        // Byte offset of every char boundary, including the end of the text.
        let bounds: Vec<usize> = text
            .char_indices()
            .map(|(i, _)| i)
            .chain(std::iter::once(text.len()))
            .collect();
        let total = bounds.len() - 1;

        let mut chunks = Vec::new();
        if total == 0 {
            return chunks;
        }

        let mut start = 0;
        loop {
            let hard_end = (start + self.config.max_chunk_size).min(total);
            let end = if hard_end == total {
                total
            } else {
                self.cut_point(text, &bounds, start, hard_end)
            };

            let ordinal = chunks.len();
            let overlap = if ordinal == 0 { 0 } else { self.config.overlap };
            chunks.push(Chunk::new(
                ordinal,
                text[bounds[start]..bounds[end]].to_string(),
                start,
                overlap,
            ));

            if end == total {
                break;
            }
            start = end - self.config.overlap;
        }

        debug!("Split {} chars into {} chunks", total, chunks.len());
        chunks
    }

    /// Pick where the window starting at `start` ends, in chars.
    ///
    /// The result is always greater than `start + overlap` so the next window advances.
    fn cut_point(&self, text: &str, bounds: &[usize], start: usize, hard_end: usize) -> usize {
        if self.config.strategy == SplitStrategy::Character {
            return hard_end;
        }

        let margin = (self.config.max_chunk_size / BOUNDARY_WINDOW_DIVISOR).max(1);
        let lower = (start + self.config.overlap + 1).max(hard_end.saturating_sub(margin));
        let window_start = bounds[start];

        for level in BOUNDARY_LEVELS {
            for cut in (lower..=hard_end).rev() {
                let candidate = &text[window_start..bounds[cut]];
                if level.iter().any(|sep| candidate.ends_with(sep)) {
                    return cut;
                }
            }
        }

        hard_end
    }
}
