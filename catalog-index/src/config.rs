//! Index configuration

use std::path::PathBuf;
use std::time::Duration;

use crate::catalog::CatalogSchema;
use crate::error::{IndexError, Result};

/// Default embedding model code
pub const DEFAULT_MODEL_ID: &str = "BAAI/bge-small-en-v1.5";

/// Default catalog location
pub const DEFAULT_CATALOG_PATH: &str = "data/df_obat.csv";

/// Configuration for building and querying the catalog index
#[derive(Debug, Clone)]
pub struct IndexConfig {
    /// Embedding model identifier passed to the provider
    pub model_id: String,
    /// Hub access token; `None` restricts loading to public models
    pub credential: Option<String>,
    /// Catalog source location
    pub source: PathBuf,
    /// Catalog column layout
    pub schema: CatalogSchema,
    /// Records encoded per provider call (default: 32)
    pub batch_size: usize,
    /// Interval between state polls in `wait_until_ready` (default: 1s)
    pub poll_interval: Duration,
    /// Top-k used when the requested value is out of range (default: 5)
    pub default_top_k: usize,
    /// Largest accepted top-k (default: 20)
    pub max_top_k: usize,
    /// Cached query embeddings, 0 disables (default: 256)
    pub query_cache_size: usize,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            model_id: DEFAULT_MODEL_ID.to_string(),
            credential: None,
            source: PathBuf::from(DEFAULT_CATALOG_PATH),
            schema: CatalogSchema::default(),
            batch_size: 32,
            poll_interval: Duration::from_secs(1),
            default_top_k: 5,
            max_top_k: 20,
            query_cache_size: 256,
        }
    }
}

impl IndexConfig {
    /// Reject settings the builder and query engine cannot honor
    pub fn validate(&self) -> Result<()> {
        if self.model_id.trim().is_empty() {
            return Err(IndexError::invalid_config("model identifier is empty"));
        }
        if self.batch_size == 0 {
            return Err(IndexError::invalid_config("batch size must be at least 1"));
        }
        if self.max_top_k == 0 {
            return Err(IndexError::invalid_config("max top-k must be at least 1"));
        }
        if self.default_top_k == 0 || self.default_top_k > self.max_top_k {
            return Err(IndexError::invalid_config(format!(
                "default top-k {} must be within [1, {}]",
                self.default_top_k, self.max_top_k
            )));
        }
        if self.poll_interval.is_zero() {
            return Err(IndexError::invalid_config("poll interval must be non-zero"));
        }
        Ok(())
    }

    /// Credential with surrounding whitespace removed, `None` when blank
    pub fn credential(&self) -> Option<&str> {
        self.credential
            .as_deref()
            .map(str::trim)
            .filter(|token| !token.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = IndexConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.default_top_k, 5);
        assert_eq!(config.max_top_k, 20);
        assert_eq!(config.batch_size, 32);
        assert_eq!(config.poll_interval, Duration::from_secs(1));
    }

    #[test]
    fn test_default_top_k_above_max_rejected() {
        let config = IndexConfig {
            default_top_k: 30,
            ..IndexConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("default top-k 30"));
    }

    #[test]
    fn test_zero_batch_rejected() {
        let config = IndexConfig {
            batch_size: 0,
            ..IndexConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_blank_credential_treated_as_missing() {
        let config = IndexConfig {
            credential: Some("   ".to_string()),
            ..IndexConfig::default()
        };
        assert_eq!(config.credential(), None);

        let config = IndexConfig {
            credential: Some(" hf_abc ".to_string()),
            ..IndexConfig::default()
        };
        assert_eq!(config.credential(), Some("hf_abc"));
    }
}
