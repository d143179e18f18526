#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid index URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("{operation} failed (status {status}): {message}")]
    Api {
        operation: &'static str,
        status: u16,
        message: String,
    },

    #[error("collection not found: {0}")]
    CollectionNotFound(String),

    #[error("embedding failed: {0}")]
    Embedding(#[from] vecseed_llm::LlmError),

    #[error("invalid batch: {0}")]
    InvalidBatch(String),

    #[error("index unavailable: {0}")]
    Unavailable(String),

    #[error("{0}")]
    Other(String),
}
