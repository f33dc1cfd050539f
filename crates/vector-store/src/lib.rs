//! # KBQA Vector Store
//!
//! Embedded knowledge-base data model, vector math and the embedding pipeline.
//!
//! ## Features
//!
//! - **Typed corpus records** matching the `title` / `title_embedding` /
//!   `chunks[]` JSON layout
//! - **Cosine similarity** over `f64` vectors
//! - **Pluggable embedders** behind the [`Embedder`] capability trait
//! - **Batched embedding runs** with per-request limits and pacing
//!
//! ## Architecture
//!
//! ```text
//! DocumentSection[]
//!     │
//!     ├──> EmbeddingRun ──> Embedder (batch ≤ max_batch)
//!     │                        └─> Vector[dim]
//!     │
//!     └──> Corpus { Section { title, title_embedding, chunks[] } }
//!            └─> JSON load / save
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use kbqa_vector_store::{Corpus, EmbeddingRun, StubEmbedder};
//! use kbqa_chunker::DocumentSection;
//!
//! #[tokio::main]
//! async fn main() -> kbqa_vector_store::Result<()> {
//!     let embedder = StubEmbedder::new(64);
//!     let sections = vec![DocumentSection {
//!         title: "Pairing".to_string(),
//!         chunks: vec!["Open the case next to your phone.".to_string()],
//!     }];
//!     let corpus = EmbeddingRun::new(&embedder).embed_sections(sections).await?;
//!     corpus.save("corpus.json").await?;
//!
//!     let loaded = Corpus::load("corpus.json").await?;
//!     println!("{:?}", loaded.validate());
//!     Ok(())
//! }
//! ```

mod corpus;
mod embedding_run;
mod embeddings;
mod error;
mod similarity;
mod types;

pub use corpus::{load_questions, save_query_result, save_questions, Corpus, CorpusStats};
pub use embedding_run::EmbeddingRun;
pub use embeddings::{EmbedPurpose, Embedder, StubEmbedder, DEFAULT_MAX_BATCH};
pub use error::{Result, VectorStoreError};
pub use similarity::cosine_similarity;
pub use types::{Chunk, ItemKind, QueryResult, Question, RankInput, ScoredItem, Section, Vector};
