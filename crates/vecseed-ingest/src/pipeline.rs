//! End-to-end rebuild: reachability, corpus, recreate, bulk load.

use std::path::PathBuf;
use std::time::Instant;

use vecseed_index::{CollectionSpec, EmbedOptions, VectorIndex};
use vecseed_llm::EmbeddingProvider;

use crate::bulk::BulkLoader;
use crate::corpus::CorpusLoader;
use crate::error::IngestError;
use crate::sync::CollectionSynchronizer;

/// Summary of a completed run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub collection: String,
    pub files_loaded: usize,
    pub files_skipped: usize,
    pub records_rejected: usize,
    pub chunks: usize,
    pub count: u64,
    pub duration_ms: u64,
}

pub struct IngestionPipeline<'a, E: EmbeddingProvider> {
    index: &'a dyn VectorIndex,
    embedder: &'a E,
    spec: CollectionSpec,
    data_dir: PathBuf,
    corpus: CorpusLoader,
    options: EmbedOptions,
}

impl<'a, E: EmbeddingProvider> IngestionPipeline<'a, E> {
    #[must_use]
    pub fn new(
        index: &'a dyn VectorIndex,
        embedder: &'a E,
        spec: CollectionSpec,
        data_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            index,
            embedder,
            spec,
            data_dir: data_dir.into(),
            corpus: CorpusLoader::default(),
            options: EmbedOptions::default(),
        }
    }

    #[must_use]
    pub fn with_corpus_loader(mut self, corpus: CorpusLoader) -> Self {
        self.corpus = corpus;
        self
    }

    #[must_use]
    pub fn with_embed_options(mut self, options: EmbedOptions) -> Self {
        self.options = options;
        self
    }

    /// Rebuild the collection from the data directory.
    ///
    /// Stages run strictly in order; nothing is deleted or written if the
    /// index is unreachable or the data directory cannot be listed.
    ///
    /// # Errors
    ///
    /// Returns the [`IngestError`] of the first stage that fails.
    pub async fn run(&self) -> Result<RunReport, IngestError> {
        let start = Instant::now();
        let mut sync = CollectionSynchronizer::new(self.index, self.spec.clone());

        sync.check_reachable().await?;

        tracing::info!(dir = %self.data_dir.display(), "loading corpus");
        let corpus = self.corpus.load(&self.data_dir).await?;
        tracing::info!(
            files = corpus.loaded_files.len(),
            skipped = corpus.skipped_files.len(),
            rejected = corpus.records_rejected,
            chunks = corpus.batch.len(),
            "corpus loaded"
        );

        let info = sync.recreate().await?;

        let loader = BulkLoader::new(self.index, self.embedder, self.options);
        let load = loader.load(&info.name, &corpus.batch).await?;

        let report = RunReport {
            collection: info.name,
            files_loaded: corpus.loaded_files.len(),
            files_skipped: corpus.skipped_files.len(),
            records_rejected: corpus.records_rejected,
            chunks: corpus.batch.len(),
            count: load.count,
            duration_ms: u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX),
        };
        tracing::info!(
            collection = %report.collection,
            count = report.count,
            duration_ms = report.duration_ms,
            "ingestion complete"
        );
        Ok(report)
    }
}
