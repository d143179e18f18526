//! Ingestion pipeline: flatten templated document sources into chunks,
//! rebuild the target collection and bulk-load the chunks into it.

pub mod bulk;
pub mod corpus;
pub mod error;
pub mod flatten;
pub mod pipeline;
pub mod sync;
pub mod types;

pub use bulk::{BulkLoader, LoadReport};
pub use corpus::{CorpusLoader, CorpusReport, LoadedFile, SkippedFile};
pub use error::{DocumentError, IngestError, RecordError};
pub use flatten::{Flattened, flatten};
pub use pipeline::{IngestionPipeline, RunReport};
pub use sync::{CollectionSynchronizer, SyncState};
pub use types::{Batch, Chunk, ChunkMetadata, DocumentSource, Record, Scalar};
