use std::path::PathBuf;

use vecseed_index::IndexError;

/// Fatal pipeline failure. Each variant names the stage that failed.
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("data directory {path} unreadable: {source}")]
    DataDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("vector index unreachable: {0}")]
    Unreachable(#[source] IndexError),

    #[error("collection {stage} failed: {source}")]
    Collection {
        stage: &'static str,
        #[source]
        source: IndexError,
    },

    #[error("bulk write failed at {operation}: {source}")]
    BulkWrite {
        operation: &'static str,
        #[source]
        source: IndexError,
    },

    #[error("collection holds {count} records after load, expected {expected}")]
    CountMismatch { expected: u64, count: u64 },
}

impl IngestError {
    /// Short name of the failing stage, used in the final error log.
    #[must_use]
    pub fn stage(&self) -> &'static str {
        match self {
            Self::DataDir { .. } => "corpus",
            Self::Unreachable(_) => "reachability",
            Self::Collection { stage, .. } => *stage,
            Self::BulkWrite { operation, .. } => *operation,
            Self::CountMismatch { .. } => "verify",
        }
    }
}

/// A file that was skipped; the run continues without it.
#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("file too large: {size} bytes (limit {limit})")]
    FileTooLarge { size: u64, limit: u64 },

    #[error("invalid document source: {0}")]
    Json(#[from] serde_json::Error),

    #[error("empty source name")]
    EmptySource,

    #[error("source {0:?} already loaded from another file")]
    DuplicateSource(String),
}

/// A record that referenced a key it does not carry.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("record {position} has no value for {missing_key:?}")]
pub struct RecordError {
    /// 1-based position in `documents`.
    pub position: usize,
    pub missing_key: String,
}
