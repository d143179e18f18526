//! Drop-and-recreate of the target collection.

use std::fmt;

use vecseed_index::{CollectionInfo, CollectionSpec, DeleteOutcome, VectorIndex};

use crate::error::IngestError;

/// Lifecycle of the target collection during one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    Stale,
    Deleting,
    Creating,
    Ready,
}

impl fmt::Display for SyncState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Stale => "stale",
            Self::Deleting => "deleting",
            Self::Creating => "creating",
            Self::Ready => "ready",
        })
    }
}

pub struct CollectionSynchronizer<'a> {
    index: &'a dyn VectorIndex,
    spec: CollectionSpec,
    state: SyncState,
}

impl<'a> CollectionSynchronizer<'a> {
    #[must_use]
    pub fn new(index: &'a dyn VectorIndex, spec: CollectionSpec) -> Self {
        Self {
            index,
            spec,
            state: SyncState::Stale,
        }
    }

    #[must_use]
    pub fn state(&self) -> SyncState {
        self.state
    }

    #[must_use]
    pub fn spec(&self) -> &CollectionSpec {
        &self.spec
    }

    /// Probe the index once. No retry.
    ///
    /// # Errors
    ///
    /// Returns [`IngestError::Unreachable`] if the heartbeat fails.
    pub async fn check_reachable(&self) -> Result<(), IngestError> {
        let heartbeat = self
            .index
            .heartbeat()
            .await
            .map_err(IngestError::Unreachable)?;
        tracing::debug!(heartbeat, "vector index reachable");
        Ok(())
    }

    /// Delete any collection with the target name, then create it fresh.
    ///
    /// A missing prior collection is not an error.
    ///
    /// # Errors
    ///
    /// Returns [`IngestError::Collection`] with stage `delete` or `create`.
    pub async fn recreate(&mut self) -> Result<CollectionInfo, IngestError> {
        let name = self.spec.name.clone();

        self.transition(SyncState::Deleting);
        match self.index.delete_collection(&name).await {
            Ok(DeleteOutcome::Deleted) => {
                tracing::info!(collection = %name, "deleted existing collection");
            }
            Ok(DeleteOutcome::NotFound) => {
                tracing::info!(collection = %name, "no preexisting collection found");
            }
            Err(source) => {
                return Err(IngestError::Collection {
                    stage: "delete",
                    source,
                });
            }
        }

        self.transition(SyncState::Creating);
        let info = self
            .index
            .create_collection(&self.spec)
            .await
            .map_err(|source| IngestError::Collection {
                stage: "create",
                source,
            })?;
        tracing::info!(
            collection = %info.name,
            id = %info.id,
            space = ?self.spec.hnsw.space,
            model = %self.spec.embedding.model,
            "collection created"
        );

        self.transition(SyncState::Ready);
        Ok(info)
    }

    fn transition(&mut self, next: SyncState) {
        tracing::debug!(collection = %self.spec.name, from = %self.state, to = %next, "sync state");
        self.state = next;
    }
}
