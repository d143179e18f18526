mod env;
mod error;
mod types;


pub use error::ConfigError;
pub use types::*;

use std::path::Path;

impl Config {
    /// Load configuration from a TOML file with env var overrides.
    ///
    /// Falls back to defaults when the file does not exist. The result is not
    /// validated; call [`Config::validate`] before using it.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed, or if
    /// an environment override carries an unparsable value.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
                path: path.display().to_string(),
                source,
            })?;
            toml::from_str::<Self>(&content).map_err(|source| ConfigError::Parse {
                path: path.display().to_string(),
                source,
            })?
        } else {
            tracing::debug!(path = %path.display(), "config file not found, using defaults");
            Self::default()
        };

        config.apply_env_overrides()?;
        Ok(config)
    }

    /// Check that every setting needed before the first network call is present
    /// and well-formed.
    ///
    /// # Errors
    ///
    /// Returns the first problem found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.embedding.provider == EmbeddingProviderKind::OpenAi
            && self
                .secrets
                .openai_api_key
                .as_ref()
                .is_none_or(crate::Secret::is_empty)
        {
            return Err(ConfigError::MissingSecret(
                self.embedding.api_key_env_var.clone(),
            ));
        }
        if self.embedding.model.trim().is_empty() {
            return Err(ConfigError::Missing("embedding.model"));
        }
        if self.embedding.batch_size == 0 {
            return Err(invalid("embedding.batch_size", "must be at least 1"));
        }
        if self.embedding.concurrency == 0 {
            return Err(invalid("embedding.concurrency", "must be at least 1"));
        }
        url::Url::parse(&self.embedding.base_url)
            .map_err(|e| invalid("embedding.base_url", e.to_string()))?;

        if self.index.host.trim().is_empty() {
            return Err(ConfigError::Missing("index.host"));
        }
        if self.index.port == 0 {
            return Err(invalid("index.port", "must be between 1 and 65535"));
        }
        url::Url::parse(&self.index.base_url())
            .map_err(|e| invalid("index.host", e.to_string()))?;
        if self.index.tenant.trim().is_empty() {
            return Err(ConfigError::Missing("index.tenant"));
        }
        if self.index.database.trim().is_empty() {
            return Err(ConfigError::Missing("index.database"));
        }
        if self.index.collection.is_empty() {
            return Err(ConfigError::Missing("index.collection"));
        }
        check_collection_name(&self.index.collection)?;
        if self.index.hnsw.ef_construction == 0 {
            return Err(invalid("index.hnsw.ef_construction", "must be at least 1"));
        }
        if self.index.hnsw.ef_search == 0 {
            return Err(invalid("index.hnsw.ef_search", "must be at least 1"));
        }
        if self.timeouts.connect_seconds == 0 {
            return Err(invalid("timeouts.connect_seconds", "must be at least 1"));
        }
        if self.timeouts.request_seconds == 0 {
            return Err(invalid("timeouts.request_seconds", "must be at least 1"));
        }
        Ok(())
    }
}

fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.into(),
    }
}

/// Collection names: 3-512 chars of `[A-Za-z0-9._-]`, alphanumeric at both
/// ends, no `..`, not an IPv4 address.
fn check_collection_name(name: &str) -> Result<(), ConfigError> {
    const FIELD: &str = "index.collection";

    if !(3..=512).contains(&name.len()) {
        return Err(invalid(FIELD, "must be 3-512 characters long"));
    }
    if !name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
    {
        return Err(invalid(
            FIELD,
            "may only contain ASCII letters, digits, '.', '_' and '-'",
        ));
    }
    let first = name.chars().next().is_some_and(|c| c.is_ascii_alphanumeric());
    let last = name.chars().last().is_some_and(|c| c.is_ascii_alphanumeric());
    if !first || !last {
        return Err(invalid(FIELD, "must start and end with a letter or digit"));
    }
    if name.contains("..") {
        return Err(invalid(FIELD, "must not contain '..'"));
    }
    if name.parse::<std::net::Ipv4Addr>().is_ok() {
        return Err(invalid(FIELD, "must not be an IPv4 address"));
    }
    Ok(())
}
