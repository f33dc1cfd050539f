//! # KBQA Search
//!
//! Two-stage semantic retrieval over an embedded knowledge base.
//!
//! ```text
//! query vector
//!     │
//!     ├──> rank titles ──> top `title_top_k` titles
//!     │
//!     ├──> candidate pool = chunks of sections with those titles
//!     │
//!     ├──> rank chunks ──> top `chunk_top_k`
//!     │
//!     └──> dedupe by chunk text
//! ```

mod batch;
mod config;
mod error;
mod ranked;
mod retriever;

pub use batch::{run_batch, run_batch_with_summary, BatchQueryRunner, BatchSummary};
pub use config::{
    RetrievalConfig, DEFAULT_CHUNK_TOP_K, DEFAULT_SINGLE_QUERY_CHUNK_TOP_K, DEFAULT_TITLE_TOP_K,
};
pub use error::{Result, SearchError};
pub use ranked::{rank_items, rank_pass, RankPass};
pub use retriever::{rank_titles, retrieve, TwoStageRetriever};
