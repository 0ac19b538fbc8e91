//! Pipeline coordination for Watchpost.
//!
//! Wires the corpus loader, chunker, embedder, vector index and grounded
//! answerer together. `refresh` fetches and rebuilds; `open` reuses the
//! persisted index; `ask` answers against whichever knowledge base it is given.

use crate::answer::{Answer, Generator, GroundedAnswerer, OpenAIGenerator};
use crate::chunking::{ChunkingConfig, TextSplitter};
use crate::config::{Prompts, Settings};
use crate::corpus::CorpusLoader;
use crate::embedding::{create_embedder, Embedder};
use crate::error::Result;
use crate::index::{IndexMetadata, SearchHit, VectorIndex};
use crate::metadata::ExtractedMetadata;
use crate::storage::{create_blob_store, BlobStore};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, instrument};

/// The searchable state produced by a refresh.
#[derive(Debug, Clone)]
pub struct KnowledgeBase {
    /// Metadata extracted from the report text.
    pub metadata: ExtractedMetadata,
    /// Index over the report's chunks.
    pub index: VectorIndex,
}

impl KnowledgeBase {
    /// Blob name of the report the index was built from.
    pub fn source(&self) -> &str {
        &self.index.metadata().source
    }

    /// Created time supplied to answers.
    pub fn created_time(&self) -> &str {
        &self.metadata.created_time
    }
}

/// An answer together with the hits it was grounded on.
#[derive(Debug, Clone)]
pub struct AskResult {
    pub answer: Answer,
    pub hits: Vec<SearchHit>,
}

/// Coordinates refresh and question answering.
pub struct Pipeline {
    loader: CorpusLoader,
    splitter: TextSplitter,
    embedder: Arc<dyn Embedder>,
    answerer: GroundedAnswerer,
    index_path: PathBuf,
}

impl Pipeline {
    /// Create a pipeline from settings.
    pub fn new(settings: &Settings) -> Result<Self> {
        let generator: Arc<dyn Generator> = Arc::new(OpenAIGenerator::new(
            &settings.answer.model,
            settings.answer.temperature,
        )?);
        Self::with_generator(settings, generator)
    }

    /// Create a pipeline from settings with a specific generator.
    pub fn with_generator(settings: &Settings, generator: Arc<dyn Generator>) -> Result<Self> {
        let prompts = Prompts::load(
            settings.prompts.custom_dir.as_deref(),
            Some(&settings.prompts.variables),
        )?;

        Self::with_components(
            settings,
            create_blob_store(&settings.storage)?,
            create_embedder(&settings.embedding)?,
            GroundedAnswerer::new(generator).with_prompts(prompts),
        )
    }

    /// Create a pipeline with custom components.
    pub fn with_components(
        settings: &Settings,
        store: Arc<dyn BlobStore>,
        embedder: Arc<dyn Embedder>,
        answerer: GroundedAnswerer,
    ) -> Result<Self> {
        let config: ChunkingConfig = settings.chunking.to_config()?;
        let loader = CorpusLoader::new(
            store,
            &settings.storage.report_object,
            settings.storage.download_path(),
        );

        Ok(Self {
            loader,
            splitter: TextSplitter::new(config)?,
            embedder,
            answerer,
            index_path: settings.index_path(),
        })
    }

    /// Where the index is persisted.
    pub fn index_path(&self) -> &PathBuf {
        &self.index_path
    }

    /// Fetch the latest report, rebuild the index and persist it.
    ///
    /// Nothing is persisted unless every step succeeds, so a failed refresh
    /// leaves the previous index in place.
    #[instrument(skip(self), fields(object = %self.loader.object()))]
    pub async fn refresh(&self) -> Result<KnowledgeBase> {
        let document = self.loader.load().await?;

        let chunks = self.splitter.split(&document.text);
        info!("Split report into {} chunks", chunks.len());

        let metadata = ExtractedMetadata::from_text(&document.text);
        if !metadata.has_created_time() {
            info!("Report has no created time");
        }

        let index = VectorIndex::build(
            chunks,
            self.embedder.as_ref(),
            IndexMetadata::new(&document.source, document.fetched_at, &metadata.created_time)
                .with_upload_time(metadata.upload_time.clone()),
        )
        .await?;

        if let Some(parent) = self.index_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        index.persist(&self.index_path)?;
        info!("Persisted index to {}", self.index_path.display());

        Ok(KnowledgeBase { metadata, index })
    }

    /// Load the persisted knowledge base without fetching anything.
    ///
    /// Fails if the index was built with an embedder of different dimensions.
    #[instrument(skip(self))]
    pub fn open(&self) -> Result<KnowledgeBase> {
        let index = VectorIndex::load(&self.index_path)?;
        index.check_dimensions(self.embedder.dimensions())?;

        let metadata = ExtractedMetadata {
            created_time: index.metadata().created_time.clone(),
            upload_time: index.metadata().upload_time.clone(),
        };
        Ok(KnowledgeBase { metadata, index })
    }

    /// Retrieve the `k` most relevant chunks for `query`.
    pub async fn search(&self, kb: &KnowledgeBase, query: &str, k: usize) -> Result<Vec<SearchHit>> {
        kb.index.search(query, k, self.embedder.as_ref()).await
    }

    /// Answer `question` from the `k` most relevant chunks.
    #[instrument(skip(self, kb), fields(question = %question))]
    pub async fn ask(&self, kb: &KnowledgeBase, question: &str, k: usize) -> Result<AskResult> {
        let hits = self.search(kb, question, k).await?;
        let chunks: Vec<_> = hits.iter().map(|hit| hit.chunk.clone()).collect();

        let answer = self
            .answerer
            .answer(question, &chunks, kb.created_time())
            .await?;

        Ok(AskResult { answer, hits })
    }
}
