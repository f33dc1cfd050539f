use serde::{Deserialize, Serialize};

use crate::error::{ChunkerError, Result};

/// Configuration for section splitting behavior
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ChunkerConfig {
    /// Run the text cleaner over the page content before splitting
    pub clean_text: bool,

    /// Lines shorter than this many characters are dropped
    pub min_chunk_chars: usize,
}

impl Default for ChunkerConfig {
    fn default() -> Self {
        Self {
            clean_text: false,
            min_chunk_chars: 1,
        }
    }
}

impl ChunkerConfig {
    /// Preset that cleans scraped markup noise before splitting
    #[must_use]
    pub fn cleaned() -> Self {
        Self {
            clean_text: true,
            ..Default::default()
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.min_chunk_chars == 0 {
            return Err(ChunkerError::invalid_config(
                "min_chunk_chars must be > 0",
            ));
        }
        Ok(())
    }
}
