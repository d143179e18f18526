use std::path::PathBuf;
use std::str::FromStr;

use super::{Config, ConfigError, EmbeddingProviderKind};
use crate::secret::Secret;

fn parsed<T: FromStr>(key: &'static str) -> Result<Option<T>, ConfigError> {
    match std::env::var(key) {
        Ok(value) => value
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| ConfigError::InvalidEnv { key, value }),
        Err(_) => Ok(None),
    }
}

fn string(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

impl Config {
    pub(crate) fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        self.apply_env_overrides_embedding()?;
        self.apply_env_overrides_index()?;
        self.apply_env_overrides_ingest()?;
        self.apply_env_secrets();
        Ok(())
    }

    fn apply_env_overrides_embedding(&mut self) -> Result<(), ConfigError> {
        if let Some(v) = string("VECSEED_EMBEDDING_PROVIDER") {
            self.embedding.provider = match v.trim() {
                "openai" => EmbeddingProviderKind::OpenAi,
                "mock" => EmbeddingProviderKind::Mock,
                _ => {
                    return Err(ConfigError::InvalidEnv {
                        key: "VECSEED_EMBEDDING_PROVIDER",
                        value: v,
                    });
                }
            };
        }
        if let Some(v) = string("OPENAI_EMBEDDING_MODEL") {
            self.embedding.model = v;
        }
        if let Some(v) = string("OPENAI_BASE_URL") {
            self.embedding.base_url = v;
        }
        if let Some(n) = parsed::<usize>("VECSEED_EMBED_BATCH_SIZE")? {
            self.embedding.batch_size = n;
        }
        if let Some(n) = parsed::<usize>("VECSEED_EMBED_CONCURRENCY")? {
            self.embedding.concurrency = n;
        }
        Ok(())
    }

    fn apply_env_overrides_index(&mut self) -> Result<(), ConfigError> {
        if let Some(v) = string("CHROMA_HOST") {
            self.index.host = v;
        }
        if let Some(port) = parsed::<u16>("CHROMA_PORT")? {
            self.index.port = port;
        }
        if let Some(ssl) = parsed::<bool>("CHROMA_SSL")? {
            self.index.ssl = ssl;
        }
        if let Some(v) = string("CHROMA_TENANT") {
            self.index.tenant = v;
        }
        if let Some(v) = string("CHROMA_DATABASE") {
            self.index.database = v;
        }
        if let Some(v) = string("CHROMA_COLLECTION_NAME") {
            self.index.collection = v;
        }
        Ok(())
    }

    fn apply_env_overrides_ingest(&mut self) -> Result<(), ConfigError> {
        if let Some(v) = string("VECSEED_DATA_DIR") {
            self.ingest.data_dir = PathBuf::from(v);
        }
        if let Some(n) = parsed::<u64>("VECSEED_MAX_FILE_SIZE")? {
            self.ingest.max_file_size = n;
        }
        Ok(())
    }

    fn apply_env_secrets(&mut self) {
        if let Some(v) = string(&self.embedding.api_key_env_var) {
            self.secrets.openai_api_key = Some(Secret::new(v));
        }
    }
}
