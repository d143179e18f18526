//! In-process [`VectorIndex`] used by tests and dry runs.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::RwLock;

use uuid::Uuid;

use crate::error::IndexError;
use crate::types::{AddRecords, CollectionInfo, CollectionSpec, DeleteOutcome};
use crate::vector_index::{BoxFuture, VectorIndex};

#[derive(Debug, Clone)]
pub struct StoredRecord {
    pub id: String,
    pub embedding: Vec<f32>,
    pub document: String,
    pub metadata: serde_json::Value,
}

struct InMemoryCollection {
    id: Uuid,
    spec: CollectionSpec,
    ids: HashSet<String>,
    records: Vec<StoredRecord>,
}

/// Number of calls each operation has received.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallLog {
    pub heartbeat: usize,
    pub delete: usize,
    pub create: usize,
    pub get: usize,
    pub add: usize,
    pub count: usize,
}

#[derive(Default)]
struct Counters {
    heartbeat: AtomicUsize,
    delete: AtomicUsize,
    create: AtomicUsize,
    get: AtomicUsize,
    add: AtomicUsize,
    count: AtomicUsize,
}

#[derive(Debug, Clone, Copy, Default)]
struct Failures {
    unreachable: bool,
    create: bool,
    delete: bool,
    add: bool,
}

pub struct InMemoryVectorIndex {
    collections: RwLock<HashMap<String, InMemoryCollection>>,
    failures: Failures,
    counters: Counters,
}

impl InMemoryVectorIndex {
    #[must_use]
    pub fn new() -> Self {
        Self {
            collections: RwLock::new(HashMap::new()),
            failures: Failures::default(),
            counters: Counters::default(),
        }
    }

    /// Every heartbeat fails as if the server were down.
    #[must_use]
    pub fn unreachable() -> Self {
        let mut index = Self::new();
        index.failures.unreachable = true;
        index
    }

    #[must_use]
    pub fn failing_create(mut self) -> Self {
        self.failures.create = true;
        self
    }

    /// Deletes fail with a server error rather than `NotFound`.
    #[must_use]
    pub fn failing_delete(mut self) -> Self {
        self.failures.delete = true;
        self
    }

    #[must_use]
    pub fn failing_add(mut self) -> Self {
        self.failures.add = true;
        self
    }

    /// Seed a pre-existing collection holding `records` placeholder entries.
    ///
    /// # Panics
    ///
    /// Panics if the collection lock is poisoned.
    #[must_use]
    pub fn with_collection(self, name: &str, records: usize) -> Self {
        let stored = (1..=records)
            .map(|i| StoredRecord {
                id: format!("stale-{i}"),
                embedding: vec![0.0],
                document: String::new(),
                metadata: serde_json::Value::Null,
            })
            .collect::<Vec<_>>();
        let collection = InMemoryCollection {
            id: Uuid::new_v4(),
            spec: CollectionSpec {
                name: name.to_owned(),
                embedding: crate::types::EmbeddingFunctionSpec {
                    provider: "openai".into(),
                    model: "stale-model".into(),
                    api_key_env_var: "OPENAI_API_KEY".into(),
                },
                hnsw: crate::types::HnswParams::default(),
            },
            ids: stored.iter().map(|r| r.id.clone()).collect(),
            records: stored,
        };
        self.collections
            .write()
            .unwrap()
            .insert(name.to_owned(), collection);
        self
    }

    #[must_use]
    pub fn calls(&self) -> CallLog {
        let c = &self.counters;
        CallLog {
            heartbeat: c.heartbeat.load(Ordering::Relaxed),
            delete: c.delete.load(Ordering::Relaxed),
            create: c.create.load(Ordering::Relaxed),
            get: c.get.load(Ordering::Relaxed),
            add: c.add.load(Ordering::Relaxed),
            count: c.count.load(Ordering::Relaxed),
        }
    }

    #[must_use]
    pub fn collection_spec(&self, name: &str) -> Option<CollectionSpec> {
        let cols = self.collections.read().ok()?;
        cols.get(name).map(|c| c.spec.clone())
    }

    /// Stored records of `name` in insertion order.
    #[must_use]
    pub fn records(&self, name: &str) -> Option<Vec<StoredRecord>> {
        let cols = self.collections.read().ok()?;
        cols.get(name).map(|c| c.records.clone())
    }

    fn lock_error(e: impl std::fmt::Display) -> IndexError {
        IndexError::Other(format!("in-memory index lock poisoned: {e}"))
    }
}

impl Default for InMemoryVectorIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for InMemoryVectorIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryVectorIndex")
            .field("failures", &self.failures)
            .finish_non_exhaustive()
    }
}

fn info_of(c: &InMemoryCollection) -> CollectionInfo {
    CollectionInfo {
        id: c.id,
        name: c.spec.name.clone(),
    }
}

impl VectorIndex for InMemoryVectorIndex {
    fn heartbeat(&self) -> BoxFuture<'_, Result<u64, IndexError>> {
        self.counters.heartbeat.fetch_add(1, Ordering::Relaxed);
        Box::pin(async move {
            if self.failures.unreachable {
                return Err(IndexError::Unavailable("in-memory index is offline".into()));
            }
            Ok(1)
        })
    }

    fn delete_collection(&self, name: &str) -> BoxFuture<'_, Result<DeleteOutcome, IndexError>> {
        self.counters.delete.fetch_add(1, Ordering::Relaxed);
        let name = name.to_owned();
        Box::pin(async move {
            if self.failures.delete {
                return Err(IndexError::Api {
                    operation: "delete_collection",
                    status: 500,
                    message: "injected delete failure".into(),
                });
            }
            let mut cols = self.collections.write().map_err(Self::lock_error)?;
            Ok(match cols.remove(&name) {
                Some(_) => DeleteOutcome::Deleted,
                None => DeleteOutcome::NotFound,
            })
        })
    }

    fn create_collection(
        &self,
        spec: &CollectionSpec,
    ) -> BoxFuture<'_, Result<CollectionInfo, IndexError>> {
        self.counters.create.fetch_add(1, Ordering::Relaxed);
        let spec = spec.clone();
        Box::pin(async move {
            if self.failures.create {
                return Err(IndexError::Api {
                    operation: "create_collection",
                    status: 500,
                    message: "injected create failure".into(),
                });
            }
            let mut cols = self.collections.write().map_err(Self::lock_error)?;
            if cols.contains_key(&spec.name) {
                return Err(IndexError::Api {
                    operation: "create_collection",
                    status: 409,
                    message: format!("collection {} already exists", spec.name),
                });
            }
            let collection = InMemoryCollection {
                id: Uuid::new_v4(),
                spec,
                ids: HashSet::new(),
                records: Vec::new(),
            };
            let info = info_of(&collection);
            cols.insert(info.name.clone(), collection);
            Ok(info)
        })
    }

    fn get_collection(&self, name: &str) -> BoxFuture<'_, Result<CollectionInfo, IndexError>> {
        self.counters.get.fetch_add(1, Ordering::Relaxed);
        let name = name.to_owned();
        Box::pin(async move {
            let cols = self.collections.read().map_err(Self::lock_error)?;
            cols.get(&name)
                .map(info_of)
                .ok_or(IndexError::CollectionNotFound(name))
        })
    }

    fn add(
        &self,
        collection: &CollectionInfo,
        records: AddRecords,
    ) -> BoxFuture<'_, Result<(), IndexError>> {
        self.counters.add.fetch_add(1, Ordering::Relaxed);
        let collection = collection.clone();
        Box::pin(async move {
            if self.failures.add {
                return Err(IndexError::Api {
                    operation: "add",
                    status: 500,
                    message: "injected add failure".into(),
                });
            }
            records.check()?;
            let mut cols = self.collections.write().map_err(Self::lock_error)?;
            let col = cols
                .get_mut(&collection.name)
                .filter(|c| c.id == collection.id)
                .ok_or_else(|| IndexError::CollectionNotFound(collection.name.clone()))?;
            if let Some(dup) = records.ids.iter().find(|id| col.ids.contains(*id)) {
                return Err(IndexError::InvalidBatch(format!("id {dup} already stored")));
            }
            let AddRecords {
                ids,
                embeddings,
                documents,
                metadatas,
            } = records;
            for (((id, embedding), document), metadata) in
                ids.into_iter().zip(embeddings).zip(documents).zip(metadatas)
            {
                col.ids.insert(id.clone());
                col.records.push(StoredRecord {
                    id,
                    embedding,
                    document,
                    metadata,
                });
            }
            Ok(())
        })
    }

    fn count(&self, collection: &CollectionInfo) -> BoxFuture<'_, Result<u64, IndexError>> {
        self.counters.count.fetch_add(1, Ordering::Relaxed);
        let collection = collection.clone();
        Box::pin(async move {
            let cols = self.collections.read().map_err(Self::lock_error)?;
            let col = cols
                .get(&collection.name)
                .ok_or_else(|| IndexError::CollectionNotFound(collection.name.clone()))?;
            Ok(col.records.len() as u64)
        })
    }
}
