//! In-memory vector index over report chunks.
//!
//! An index is built in one shot from the chunks of a single corpus document
//! and is never updated incrementally: a new document means a new index.
//! Indexes persist to a SQLite file (see [`sqlite`]) so later queries can
//! reuse them without re-embedding.

mod sqlite;

use crate::chunking::Chunk;
use crate::embedding::Embedder;
use crate::error::{Result, WatchpostError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::path::Path;
use tracing::{debug, info, instrument};

/// Facts about the corpus an index was built from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexMetadata {
    /// Blob name of the source report.
    pub source: String,
    /// When the report was fetched.
    pub fetched_at: DateTime<Utc>,
    /// Creation time extracted from the report.
    pub created_time: String,
    /// Upload time extracted from the report, if it carried one.
    pub upload_time: Option<String>,
    /// Embedding dimensions (0 for an empty index).
    pub dimensions: usize,
    /// When the index was built.
    pub built_at: DateTime<Utc>,
}

impl IndexMetadata {
    pub fn new(source: &str, fetched_at: DateTime<Utc>, created_time: &str) -> Self {
        Self {
            source: source.to_string(),
            fetched_at,
            created_time: created_time.to_string(),
            upload_time: None,
            dimensions: 0,
            built_at: Utc::now(),
        }
    }

    pub fn with_upload_time(mut self, upload_time: Option<String>) -> Self {
        self.upload_time = upload_time;
        self
    }
}

/// A chunk paired with its embedding.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexEntry {
    pub chunk: Chunk,
    pub embedding: Vec<f32>,
}

/// A search hit with score.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    /// The matched chunk.
    pub chunk: Chunk,
    /// Cosine similarity to the query (higher is better).
    pub score: f32,
}

/// Vector index over the chunks of one corpus document.
#[derive(Debug, Clone, PartialEq)]
pub struct VectorIndex {
    metadata: IndexMetadata,
    entries: Vec<IndexEntry>,
}

impl VectorIndex {
    /// Embed every chunk and build an index.
    ///
    /// Fails as a whole if any chunk cannot be embedded.
    #[instrument(skip_all, fields(chunks = chunks.len()))]
    pub async fn build(
        chunks: Vec<Chunk>,
        embedder: &dyn Embedder,
        mut metadata: IndexMetadata,
    ) -> Result<Self> {
        metadata.built_at = Utc::now();

        if chunks.is_empty() {
            info!("Built empty index");
            return Ok(Self {
                metadata,
                entries: Vec::new(),
            });
        }

        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let embeddings = embedder
            .embed_batch(&texts)
            .await
            .map_err(|e| WatchpostError::IndexBuild(e.to_string()))?;

        if embeddings.len() != chunks.len() {
            return Err(WatchpostError::IndexBuild(format!(
                "expected {} embeddings, got {}",
                chunks.len(),
                embeddings.len()
            )));
        }

        let dimensions = embeddings[0].len();
        if dimensions == 0 || embeddings.iter().any(|e| e.len() != dimensions) {
            return Err(WatchpostError::IndexBuild(
                "embeddings have inconsistent dimensions".to_string(),
            ));
        }
        metadata.dimensions = dimensions;

        let entries = Self::entries_in_order(chunks.into_iter().zip(embeddings));

        info!("Built index with {} chunks ({} dimensions)", entries.len(), dimensions);
        Ok(Self { metadata, entries })
    }

    /// Assemble an index from already-embedded entries.
    pub(crate) fn from_parts(
        metadata: IndexMetadata,
        entries: impl IntoIterator<Item = (Chunk, Vec<f32>)>,
    ) -> Self {
        Self {
            metadata,
            entries: Self::entries_in_order(entries),
        }
    }

    fn entries_in_order(pairs: impl IntoIterator<Item = (Chunk, Vec<f32>)>) -> Vec<IndexEntry> {
        let mut entries: Vec<IndexEntry> = pairs
            .into_iter()
            .map(|(chunk, embedding)| IndexEntry { chunk, embedding })
            .collect();
        entries.sort_by_key(|e| e.chunk.ordinal);
        entries
    }

    /// Write the index to `path`, replacing whatever was stored there.
    pub fn persist(&self, path: &Path) -> Result<()> {
        sqlite::persist(self, path)
    }

    /// Read an index previously written with [`VectorIndex::persist`].
    pub fn load(path: &Path) -> Result<Self> {
        sqlite::load(path)
    }

    /// Return up to `k` chunks most similar to `query`.
    #[instrument(skip(self, embedder), fields(query = %query))]
    pub async fn search(
        &self,
        query: &str,
        k: usize,
        embedder: &dyn Embedder,
    ) -> Result<Vec<SearchHit>> {
        if k == 0 {
            return Err(WatchpostError::InvalidArgument(
                "k must be greater than zero".to_string(),
            ));
        }
        if self.entries.is_empty() {
            return Ok(Vec::new());
        }

        let query_embedding = embedder.embed(query).await?;
        self.search_embedding(&query_embedding, k)
    }

    /// Rank stored chunks against an already-embedded query.
    ///
    /// Ordered by descending similarity; ties go to the earlier chunk.
    pub fn search_embedding(&self, query_embedding: &[f32], k: usize) -> Result<Vec<SearchHit>> {
        if k == 0 {
            return Err(WatchpostError::InvalidArgument(
                "k must be greater than zero".to_string(),
            ));
        }
        self.check_dimensions(query_embedding.len())?;

        let mut hits: Vec<SearchHit> = self
            .entries
            .iter()
            .map(|entry| SearchHit {
                chunk: entry.chunk.clone(),
                score: cosine_similarity(query_embedding, &entry.embedding),
            })
            .collect();

        hits.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.chunk.ordinal.cmp(&b.chunk.ordinal))
        });
        hits.truncate(k);

        debug!("Found {} matching chunks", hits.len());
        Ok(hits)
    }

    /// Fail unless vectors with `dimensions` components can be ranked against this index.
    ///
    /// An empty index accepts any size.
    pub fn check_dimensions(&self, dimensions: usize) -> Result<()> {
        if self.entries.is_empty() || dimensions == self.metadata.dimensions {
            return Ok(());
        }
        Err(WatchpostError::Index(format!(
            "index holds {}-dimension embeddings but the embedder produces {}; run 'watchpost refresh' to rebuild it",
            self.metadata.dimensions, dimensions
        )))
    }

    pub fn metadata(&self) -> &IndexMetadata {
        &self.metadata
    }

    pub fn entries(&self) -> &[IndexEntry] {
        &self.entries
    }

    /// Number of stored chunks.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Compute cosine similarity between two vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot_product / (norm_a * norm_b)
}
