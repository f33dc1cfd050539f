use thiserror::Error;

pub type Result<T> = std::result::Result<T, SearchError>;

#[derive(Error, Debug)]
pub enum SearchError {
    #[error("Vector store error: {0}")]
    VectorStoreError(#[from] kbqa_vector_store::VectorStoreError),

    #[error("Dimension mismatch: query has {query} dimensions, corpus has {corpus}")]
    DimensionMismatch { query: usize, corpus: usize },

    #[error("Corpus has no sections")]
    EmptyCorpus,

    #[error("No questions to process")]
    EmptyQuerySet,

    #[error("Invalid retrieval config: {0}")]
    InvalidConfig(String),
}
