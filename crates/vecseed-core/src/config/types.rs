use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::secret::Secret;

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub index: IndexConfig,
    #[serde(default)]
    pub ingest: IngestConfig,
    #[serde(default)]
    pub timeouts: TimeoutConfig,
    #[serde(skip)]
    pub secrets: ResolvedSecrets,
}

/// Embedding provider backend selector.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingProviderKind {
    #[default]
    OpenAi,
    Mock,
}

impl EmbeddingProviderKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::OpenAi => "openai",
            Self::Mock => "mock",
        }
    }
}

impl std::fmt::Display for EmbeddingProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

fn default_openai_base_url() -> String {
    "https://api.openai.com/v1".into()
}

fn default_embedding_model() -> String {
    "text-embedding-3-small".into()
}

fn default_embed_batch_size() -> usize {
    512
}

fn default_embed_concurrency() -> usize {
    1
}

fn default_api_key_env_var() -> String {
    "OPENAI_API_KEY".into()
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EmbeddingConfig {
    #[serde(default)]
    pub provider: EmbeddingProviderKind,
    #[serde(default = "default_openai_base_url")]
    pub base_url: String,
    #[serde(default = "default_embedding_model")]
    pub model: String,
    /// Texts per embedding request.
    #[serde(default = "default_embed_batch_size")]
    pub batch_size: usize,
    /// Embedding requests in flight at once during a single bulk add.
    #[serde(default = "default_embed_concurrency")]
    pub concurrency: usize,
    /// Name of the environment variable the index server reads the key from.
    #[serde(default = "default_api_key_env_var")]
    pub api_key_env_var: String,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: EmbeddingProviderKind::default(),
            base_url: default_openai_base_url(),
            model: default_embedding_model(),
            batch_size: default_embed_batch_size(),
            concurrency: default_embed_concurrency(),
            api_key_env_var: default_api_key_env_var(),
        }
    }
}

/// Distance function of the HNSW index.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DistanceSpace {
    #[default]
    Cosine,
    L2,
    Ip,
}

impl DistanceSpace {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Cosine => "cosine",
            Self::L2 => "l2",
            Self::Ip => "ip",
        }
    }
}

impl std::fmt::Display for DistanceSpace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

fn default_ef() -> u32 {
    200
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
pub struct HnswConfig {
    #[serde(default)]
    pub space: DistanceSpace,
    #[serde(default = "default_ef")]
    pub ef_construction: u32,
    #[serde(default = "default_ef")]
    pub ef_search: u32,
}

impl Default for HnswConfig {
    fn default() -> Self {
        Self {
            space: DistanceSpace::Cosine,
            ef_construction: default_ef(),
            ef_search: default_ef(),
        }
    }
}

fn default_index_host() -> String {
    "localhost".into()
}

fn default_index_port() -> u16 {
    8000
}

fn default_tenant() -> String {
    "default_tenant".into()
}

fn default_database() -> String {
    "default_database".into()
}

fn default_collection() -> String {
    "documents".into()
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct IndexConfig {
    #[serde(default = "default_index_host")]
    pub host: String,
    #[serde(default = "default_index_port")]
    pub port: u16,
    #[serde(default)]
    pub ssl: bool,
    #[serde(default = "default_tenant")]
    pub tenant: String,
    #[serde(default = "default_database")]
    pub database: String,
    #[serde(default = "default_collection")]
    pub collection: String,
    #[serde(default)]
    pub hnsw: HnswConfig,
}

impl IndexConfig {
    /// Base URL of the index service, e.g. `http://localhost:8000`.
    #[must_use]
    pub fn base_url(&self) -> String {
        let scheme = if self.ssl { "https" } else { "http" };
        format!("{scheme}://{}:{}", self.host, self.port)
    }
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            host: default_index_host(),
            port: default_index_port(),
            ssl: false,
            tenant: default_tenant(),
            database: default_database(),
            collection: default_collection(),
            hnsw: HnswConfig::default(),
        }
    }
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

fn default_max_file_size() -> u64 {
    50 * 1024 * 1024
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct IngestConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    #[serde(default = "default_max_file_size")]
    pub max_file_size: u64,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            max_file_size: default_max_file_size(),
        }
    }
}

fn default_connect_timeout() -> u64 {
    10
}

fn default_request_timeout() -> u64 {
    120
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
pub struct TimeoutConfig {
    #[serde(default = "default_connect_timeout")]
    pub connect_seconds: u64,
    #[serde(default = "default_request_timeout")]
    pub request_seconds: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_seconds: default_connect_timeout(),
            request_seconds: default_request_timeout(),
        }
    }
}

#[derive(Debug, Default)]
pub struct ResolvedSecrets {
    pub openai_api_key: Option<Secret>,
}
