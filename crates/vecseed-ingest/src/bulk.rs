//! Single logical add of a whole [`Batch`] followed by a count check.

use vecseed_index::{Collection, EmbedOptions, VectorIndex};
use vecseed_llm::EmbeddingProvider;

use crate::error::IngestError;
use crate::types::Batch;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadReport {
    pub expected: u64,
    pub count: u64,
}

pub struct BulkLoader<'a, E: EmbeddingProvider> {
    index: &'a dyn VectorIndex,
    embedder: &'a E,
    options: EmbedOptions,
}

impl<'a, E: EmbeddingProvider> BulkLoader<'a, E> {
    #[must_use]
    pub fn new(index: &'a dyn VectorIndex, embedder: &'a E, options: EmbedOptions) -> Self {
        Self {
            index,
            embedder,
            options,
        }
    }

    /// Write `batch` into the collection `name` and verify the stored count.
    ///
    /// # Errors
    ///
    /// Returns [`IngestError::BulkWrite`] naming the failed operation, or
    /// [`IngestError::CountMismatch`] if the collection does not hold exactly
    /// `batch.len()` records afterwards.
    pub async fn load(&self, name: &str, batch: &Batch) -> Result<LoadReport, IngestError> {
        let collection = Collection::open(self.index, self.embedder, name, self.options)
            .await
            .map_err(|source| IngestError::BulkWrite {
                operation: "get_collection",
                source,
            })?;

        if batch.is_empty() {
            tracing::warn!(collection = name, "batch is empty, nothing to add");
        } else {
            tracing::info!(
                collection = name,
                chunks = batch.len(),
                model = self.embedder.model(),
                "adding chunks"
            );
            collection
                .add(batch.ids(), batch.texts(), batch.metadatas())
                .await
                .map_err(|source| IngestError::BulkWrite {
                    operation: match source {
                        vecseed_index::IndexError::Embedding(_) => "embed",
                        _ => "add",
                    },
                    source,
                })?;
        }

        let count = collection
            .count()
            .await
            .map_err(|source| IngestError::BulkWrite {
                operation: "count",
                source,
            })?;
        let expected = batch.len() as u64;
        if count != expected {
            return Err(IngestError::CountMismatch { expected, count });
        }
        Ok(LoadReport { expected, count })
    }
}
