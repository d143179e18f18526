use std::collections::HashSet;

use futures::{StreamExt, TryStreamExt, stream};
use serde::Serialize;
use vecseed_llm::EmbeddingProvider;

use crate::error::IndexError;
use crate::types::{AddRecords, CollectionInfo};
use crate::vector_index::VectorIndex;

/// How documents are split into embedding requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmbedOptions {
    /// Texts per embedding request.
    pub batch_size: usize,
    /// Embedding requests in flight at once.
    pub concurrency: usize,
}

impl Default for EmbedOptions {
    fn default() -> Self {
        Self {
            batch_size: 512,
            concurrency: 1,
        }
    }
}

/// Handle on an existing collection that embeds documents client-side before
/// writing them.
pub struct Collection<'a, E: EmbeddingProvider> {
    index: &'a dyn VectorIndex,
    embedder: &'a E,
    info: CollectionInfo,
    options: EmbedOptions,
}

impl<'a, E: EmbeddingProvider> Collection<'a, E> {
    /// Look up `name` on the index.
    ///
    /// # Errors
    ///
    /// Returns the index error if the collection cannot be fetched.
    pub async fn open(
        index: &'a dyn VectorIndex,
        embedder: &'a E,
        name: &str,
        options: EmbedOptions,
    ) -> Result<Self, IndexError> {
        let info = index.get_collection(name).await?;
        Ok(Self::from_info(index, embedder, info, options))
    }

    #[must_use]
    pub fn from_info(
        index: &'a dyn VectorIndex,
        embedder: &'a E,
        info: CollectionInfo,
        options: EmbedOptions,
    ) -> Self {
        Self {
            index,
            embedder,
            info,
            options: EmbedOptions {
                batch_size: options.batch_size.max(1),
                concurrency: options.concurrency.max(1),
            },
        }
    }

    #[must_use]
    pub fn info(&self) -> &CollectionInfo {
        &self.info
    }

    /// Embed `documents` and write them with their ids and metadata in one add.
    ///
    /// Nothing is written unless every embedding request succeeds.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::InvalidBatch`] for misaligned input or duplicate
    /// ids, [`IndexError::Embedding`] if any embedding request fails, or the
    /// index error from the add itself.
    pub async fn add<M: Serialize>(
        &self,
        ids: &[String],
        documents: &[String],
        metadatas: &[M],
    ) -> Result<(), IndexError> {
        if ids.len() != documents.len() || ids.len() != metadatas.len() {
            return Err(IndexError::InvalidBatch(format!(
                "{} ids, {} documents, {} metadatas",
                ids.len(),
                documents.len(),
                metadatas.len()
            )));
        }
        let mut seen = HashSet::with_capacity(ids.len());
        if let Some(dup) = ids.iter().find(|id| !seen.insert(id.as_str())) {
            return Err(IndexError::InvalidBatch(format!("duplicate id {dup}")));
        }

        let embeddings = self.embed_all(documents).await?;
        if embeddings.len() != documents.len() {
            return Err(IndexError::InvalidBatch(format!(
                "embedder returned {} vectors for {} documents",
                embeddings.len(),
                documents.len()
            )));
        }

        let metadatas = metadatas
            .iter()
            .map(serde_json::to_value)
            .collect::<Result<Vec<_>, _>>()?;

        let records = AddRecords {
            ids: ids.to_vec(),
            embeddings,
            documents: documents.to_vec(),
            metadatas,
        };
        self.index.add(&self.info, records).await
    }

    async fn embed_all(&self, documents: &[String]) -> Result<Vec<Vec<f32>>, IndexError> {
        let requests = documents.chunks(self.options.batch_size).len();
        tracing::debug!(
            collection = %self.info.name,
            documents = documents.len(),
            requests,
            concurrency = self.options.concurrency,
            model = self.embedder.model(),
            "embedding documents"
        );
        let parts: Vec<Vec<Vec<f32>>> = stream::iter(documents.chunks(self.options.batch_size))
            .map(|chunk| self.embedder.embed_batch(chunk))
            .buffered(self.options.concurrency)
            .try_collect()
            .await?;
        Ok(parts.into_iter().flatten().collect())
    }

    /// Number of records currently stored.
    ///
    /// # Errors
    ///
    /// Returns the index error if the count request fails.
    pub async fn count(&self) -> Result<u64, IndexError> {
        self.index.count(&self.info).await
    }
}

#[cfg(test)]
mod tests {
    use vecseed_llm::mock::MockEmbedder;

    use super::*;
    use crate::in_memory::InMemoryVectorIndex;
    use crate::types::{CollectionSpec, EmbeddingFunctionSpec, HnswParams};

    #[derive(Serialize)]
    struct Meta {
        source: &'static str,
    }

    async fn index_with_docs() -> InMemoryVectorIndex {
        let index = InMemoryVectorIndex::new();
        index
            .create_collection(&CollectionSpec {
                name: "docs".into(),
                embedding: EmbeddingFunctionSpec {
                    provider: "openai".into(),
                    model: "m".into(),
                    api_key_env_var: "OPENAI_API_KEY".into(),
                },
                hnsw: HnswParams::default(),
            })
            .await
            .unwrap();
        index
    }

    fn strings(prefix: &str, n: usize) -> Vec<String> {
        (1..=n).map(|i| format!("{prefix}-{i}")).collect()
    }

    fn metas(n: usize) -> Vec<Meta> {
        (0..n).map(|_| Meta { source: "faq" }).collect()
    }

    #[tokio::test]
    async fn open_missing_collection_fails() {
        let index = InMemoryVectorIndex::new();
        let embedder = MockEmbedder::default();
        let err = Collection::open(&index, &embedder, "docs", EmbedOptions::default())
            .await
            .err()
            .unwrap();
        assert!(matches!(err, IndexError::CollectionNotFound(_)));
    }

    #[tokio::test]
    async fn add_embeds_and_writes_in_order() {
        let index = index_with_docs().await;
        let embedder = MockEmbedder::with_dim(4);
        let collection = Collection::open(&index, &embedder, "docs", EmbedOptions::default())
            .await
            .unwrap();

        let ids = strings("faq", 3);
        let docs = strings("text", 3);
        collection.add(&ids, &docs, &metas(3)).await.unwrap();

        assert_eq!(collection.count().await.unwrap(), 3);
        let stored = index.records("docs").unwrap();
        for (i, record) in stored.iter().enumerate() {
            assert_eq!(record.id, ids[i]);
            assert_eq!(record.document, docs[i]);
            assert_eq!(record.embedding, embedder.vector_for(&docs[i]));
            assert_eq!(record.metadata, serde_json::json!({"source": "faq"}));
        }
    }

    #[tokio::test]
    async fn add_splits_embedding_requests_by_batch_size() {
        let index = index_with_docs().await;
        let embedder = MockEmbedder::default();
        let options = EmbedOptions {
            batch_size: 2,
            concurrency: 3,
        };
        let collection = Collection::open(&index, &embedder, "docs", options)
            .await
            .unwrap();

        let ids = strings("faq", 5);
        let docs = strings("text", 5);
        collection.add(&ids, &docs, &metas(5)).await.unwrap();

        let mut calls = embedder.calls();
        calls.sort_unstable();
        assert_eq!(calls, vec![1, 2, 2]);
        let stored = index.records("docs").unwrap();
        let order: Vec<_> = stored.iter().map(|r| r.document.clone()).collect();
        assert_eq!(order, docs);
        assert_eq!(index.calls().add, 1);
    }

    #[tokio::test]
    async fn concurrent_sub_batches_keep_input_order() {
        let index = index_with_docs().await;
        let embedder = MockEmbedder::default().with_delay(5);
        let options = EmbedOptions {
            batch_size: 1,
            concurrency: 4,
        };
        let collection = Collection::open(&index, &embedder, "docs", options)
            .await
            .unwrap();

        let ids = strings("faq", 8);
        let docs = strings("text", 8);
        collection.add(&ids, &docs, &metas(8)).await.unwrap();

        let stored = index.records("docs").unwrap();
        for (record, doc) in stored.iter().zip(&docs) {
            assert_eq!(record.embedding, embedder.vector_for(doc));
        }
    }

    #[tokio::test]
    async fn embedding_failure_writes_nothing() {
        let index = index_with_docs().await;
        let embedder = MockEmbedder::default().failing_on_call(1);
        let options = EmbedOptions {
            batch_size: 2,
            concurrency: 1,
        };
        let collection = Collection::open(&index, &embedder, "docs", options)
            .await
            .unwrap();

        let err = collection
            .add(&strings("faq", 4), &strings("text", 4), &metas(4))
            .await
            .unwrap_err();
        assert!(matches!(err, IndexError::Embedding(_)));
        assert_eq!(index.calls().add, 0);
        assert_eq!(collection.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn duplicate_ids_rejected_before_embedding() {
        let index = index_with_docs().await;
        let embedder = MockEmbedder::default();
        let collection = Collection::open(&index, &embedder, "docs", EmbedOptions::default())
            .await
            .unwrap();

        let ids = vec!["faq-1".to_owned(), "faq-1".to_owned()];
        let err = collection
            .add(&ids, &strings("text", 2), &metas(2))
            .await
            .unwrap_err();
        assert!(matches!(err, IndexError::InvalidBatch(msg) if msg.contains("faq-1")));
        assert!(embedder.calls().is_empty());
    }

    #[tokio::test]
    async fn misaligned_input_rejected() {
        let index = index_with_docs().await;
        let embedder = MockEmbedder::default();
        let collection = Collection::open(&index, &embedder, "docs", EmbedOptions::default())
            .await
            .unwrap();

        let err = collection
            .add(&strings("faq", 2), &strings("text", 3), &metas(2))
            .await
            .unwrap_err();
        assert!(matches!(err, IndexError::InvalidBatch(_)));
    }

    #[test]
    fn zero_options_are_clamped() {
        let index = InMemoryVectorIndex::new();
        let embedder = MockEmbedder::default();
        let info = CollectionInfo {
            id: uuid::Uuid::new_v4(),
            name: "docs".into(),
        };
        let c = Collection::from_info(
            &index,
            &embedder,
            info,
            EmbedOptions {
                batch_size: 0,
                concurrency: 0,
            },
        );
        assert_eq!(
            c.options,
            EmbedOptions {
                batch_size: 1,
                concurrency: 1
            }
        );
    }
}
