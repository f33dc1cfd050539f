//! # KBQA Chunker
//!
//! Turns scraped knowledge-base pages into titled sections of text chunks
//! ready for embedding.
//!
//! ## Pipeline
//!
//! ```text
//! SourceDocument { title, content, url?, images? }
//!     │
//!     ├──> TextCleaner (optional)
//!     │      └─> strip headers/footers, noise characters, repeated punctuation
//!     │
//!     └──> SectionSplitter
//!            └─> DocumentSection { title, chunks[] }
//! ```
//!
//! ## Example
//!
//! ```rust
//! use kbqa_chunker::{ChunkerConfig, SectionSplitter, SourceDocument};
//!
//! let doc = SourceDocument::new("Pairing", "Open the case.\n\nHold the button.");
//! let splitter = SectionSplitter::new(ChunkerConfig::default()).unwrap();
//! let section = splitter.split(&doc);
//! assert_eq!(section.chunks, vec!["Open the case.", "Hold the button."]);
//! ```

mod cleaner;
mod config;
mod error;
mod splitter;
mod types;

pub use cleaner::TextCleaner;
pub use config::ChunkerConfig;
pub use error::{ChunkerError, Result};
pub use splitter::SectionSplitter;
pub use types::{DocumentSection, SourceDocument};
