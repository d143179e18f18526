//! Vector index access: the [`VectorIndex`] trait, a ChromaDB HTTP client, an
//! in-memory index, and the [`Collection`] handle that embeds and writes.

pub mod chroma;
pub mod collection;
pub mod error;
pub mod in_memory;
pub mod types;
pub mod vector_index;

pub use chroma::ChromaClient;
pub use collection::{Collection, EmbedOptions};
pub use error::IndexError;
pub use in_memory::InMemoryVectorIndex;
pub use types::{
    AddRecords, CollectionInfo, CollectionSpec, DeleteOutcome, DistanceSpace,
    EmbeddingFunctionSpec, HnswParams,
};
pub use vector_index::VectorIndex;
