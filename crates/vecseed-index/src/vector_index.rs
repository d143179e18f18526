use std::future::Future;
use std::pin::Pin;

use crate::error::IndexError;
use crate::types::{AddRecords, CollectionInfo, CollectionSpec, DeleteOutcome};

pub(crate) type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Collection lifecycle and write operations of a vector index service.
pub trait VectorIndex: Send + Sync {
    /// Liveness probe; returns the server's heartbeat value.
    fn heartbeat(&self) -> BoxFuture<'_, Result<u64, IndexError>>;

    /// Delete a collection by name. A missing collection is
    /// `Ok(DeleteOutcome::NotFound)`, not an error.
    fn delete_collection(&self, name: &str) -> BoxFuture<'_, Result<DeleteOutcome, IndexError>>;

    fn create_collection(
        &self,
        spec: &CollectionSpec,
    ) -> BoxFuture<'_, Result<CollectionInfo, IndexError>>;

    fn get_collection(&self, name: &str) -> BoxFuture<'_, Result<CollectionInfo, IndexError>>;

    fn add(
        &self,
        collection: &CollectionInfo,
        records: AddRecords,
    ) -> BoxFuture<'_, Result<(), IndexError>>;

    fn count(&self, collection: &CollectionInfo) -> BoxFuture<'_, Result<u64, IndexError>>;
}
