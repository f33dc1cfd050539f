use crate::cleaner::TextCleaner;
use crate::config::ChunkerConfig;
use crate::error::Result;
use crate::types::{DocumentSection, SourceDocument};

/// Splits scraped pages into titled sections, one chunk per non-empty line.
#[derive(Debug, Clone)]
pub struct SectionSplitter {
    config: ChunkerConfig,
    cleaner: TextCleaner,
}

impl SectionSplitter {
    /// Create a splitter with validated configuration
    pub fn new(config: ChunkerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            cleaner: TextCleaner::new(),
        })
    }

    #[must_use]
    pub const fn config(&self) -> &ChunkerConfig {
        &self.config
    }

    /// Split one page into a section
    #[must_use]
    pub fn split(&self, doc: &SourceDocument) -> DocumentSection {
        let content = if self.config.clean_text {
            self.cleaner.clean(&doc.content)
        } else {
            doc.content.clone()
        };

        let mut dropped = 0usize;
        let chunks: Vec<String> = content
            .split('\n')
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .filter(|line| {
                let keep = line.chars().count() >= self.config.min_chunk_chars;
                if !keep {
                    dropped += 1;
                }
                keep
            })
            .map(ToString::to_string)
            .collect();

        if dropped > 0 {
            log::debug!(
                "Dropped {} short lines from '{}' (min {} chars)",
                dropped,
                doc.title,
                self.config.min_chunk_chars
            );
        }

        DocumentSection {
            title: doc.title.trim().to_string(),
            chunks,
        }
    }

    /// Split every page, preserving input order
    #[must_use]
    pub fn split_all(&self, docs: &[SourceDocument]) -> Vec<DocumentSection> {
        let sections: Vec<DocumentSection> = docs.iter().map(|doc| self.split(doc)).collect();
        let chunk_total: usize = sections.iter().map(|s| s.chunks.len()).sum();
        log::info!(
            "Split {} documents into {} chunks",
            sections.len(),
            chunk_total
        );
        sections
    }
}
