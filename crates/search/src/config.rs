use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SearchError};

pub const DEFAULT_TITLE_TOP_K: usize = 5;
pub const DEFAULT_CHUNK_TOP_K: usize = 10;
pub const DEFAULT_SINGLE_QUERY_CHUNK_TOP_K: usize = 5;

/// Tunables for two-stage retrieval.
///
/// Loaded from TOML; every key is optional:
///
/// ```toml
/// title_top_k = 5
/// chunk_top_k = 10
/// include_titles = true
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RetrievalConfig {
    /// Titles kept by the first stage.
    pub title_top_k: usize,
    /// Chunks returned after deduplication.
    pub chunk_top_k: usize,
    /// Filter chunks by title rank first; `false` ranks every chunk.
    pub include_titles: bool,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            title_top_k: DEFAULT_TITLE_TOP_K,
            chunk_top_k: DEFAULT_CHUNK_TOP_K,
            include_titles: true,
        }
    }
}

impl RetrievalConfig {
    /// Defaults for answering one ad-hoc question.
    #[must_use]
    pub fn single_query() -> Self {
        Self {
            chunk_top_k: DEFAULT_SINGLE_QUERY_CHUNK_TOP_K,
            ..Self::default()
        }
    }

    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(raw).map_err(|err| SearchError::InvalidConfig(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|err| {
            SearchError::InvalidConfig(format!("cannot read {}: {err}", path.display()))
        })?;
        let config = Self::from_toml_str(&raw)?;
        log::debug!("Loaded retrieval config from {}: {:?}", path.display(), config);
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.include_titles && self.title_top_k == 0 {
            return Err(SearchError::InvalidConfig(
                "title_top_k must be >= 1 when include_titles is set".to_string(),
            ));
        }
        if self.chunk_top_k == 0 {
            return Err(SearchError::InvalidConfig(
                "chunk_top_k must be >= 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn defaults() {
        let config = RetrievalConfig::default();
        assert_eq!(config.title_top_k, 5);
        assert_eq!(config.chunk_top_k, 10);
        assert!(config.include_titles);
        assert_eq!(RetrievalConfig::single_query().chunk_top_k, 5);
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let config = RetrievalConfig::from_toml_str("chunk_top_k = 3\ninclude_titles = false\n").unwrap();
        assert_eq!(
            config,
            RetrievalConfig {
                title_top_k: 5,
                chunk_top_k: 3,
                include_titles: false,
            }
        );
    }

    #[test]
    fn unknown_keys_rejected() {
        let err = RetrievalConfig::from_toml_str("top_k = 3").unwrap_err();
        assert!(matches!(err, SearchError::InvalidConfig(_)));
    }

    #[test]
    fn zero_top_k_rejected() {
        assert!(RetrievalConfig::from_toml_str("chunk_top_k = 0").is_err());
        assert!(RetrievalConfig::from_toml_str("title_top_k = 0").is_err());
        assert!(RetrievalConfig::from_toml_str("title_top_k = 0\ninclude_titles = false").is_ok());
    }

    #[test]
    fn load_from_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("kbqa.toml");
        std::fs::write(&path, "title_top_k = 2\n").unwrap();
        assert_eq!(RetrievalConfig::load(&path).unwrap().title_top_k, 2);
        assert!(RetrievalConfig::load(tmp.path().join("missing.toml")).is_err());
    }
}
