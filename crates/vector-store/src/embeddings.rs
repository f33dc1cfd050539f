use crate::error::{Result, VectorStoreError};
use crate::types::Vector;
use async_trait::async_trait;

/// Hosted embedding APIs accept at most this many texts per request.
pub const DEFAULT_MAX_BATCH: usize = 100;

/// What the embedded text will be used for. Hosted models tune vectors
/// differently for stored documents and for search queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbedPurpose {
    Document,
    Query,
}

/// Text-to-vector capability handed to the embedding pipeline.
///
/// Implementations must return exactly one vector per input text, in order.
#[async_trait]
pub trait Embedder: Send + Sync {
    fn model_id(&self) -> &str;

    fn dimension(&self) -> usize;

    fn max_batch(&self) -> usize {
        DEFAULT_MAX_BATCH
    }

    async fn embed_batch(&self, texts: &[String], purpose: EmbedPurpose) -> Result<Vec<Vector>>;

    async fn embed(&self, text: &str, purpose: EmbedPurpose) -> Result<Vector> {
        let mut vectors = self.embed_batch(&[text.to_string()], purpose).await?;
        vectors
            .pop()
            .ok_or_else(|| VectorStoreError::EmbeddingError("Empty embedding result".to_string()))
    }
}

/// Deterministic offline embedder. Identical text always maps to the same
/// unit vector, independent of [`EmbedPurpose`].
#[derive(Debug, Clone)]
pub struct StubEmbedder {
    dimension: usize,
    model_id: String,
}

impl StubEmbedder {
    #[must_use]
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            model_id: format!("stub-{dimension}"),
        }
    }
}

#[async_trait]
impl Embedder for StubEmbedder {
    fn model_id(&self) -> &str {
        &self.model_id
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    async fn embed_batch(&self, texts: &[String], _purpose: EmbedPurpose) -> Result<Vec<Vector>> {
        Ok(texts
            .iter()
            .map(|text| stub_embed(text, self.dimension))
            .collect())
    }
}

fn stub_embed(text: &str, dimension: usize) -> Vector {
    let mut state =
        fnv1a_64(text.as_bytes()) ^ (dimension as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15);
    let mut vec = Vec::with_capacity(dimension);
    for _ in 0..dimension {
        let bits = splitmix64(&mut state);
        let mantissa = bits >> 12;
        let unit = f64::from_bits(0x3ff0_0000_0000_0000 | mantissa) - 1.0;
        vec.push(unit.mul_add(2.0, -1.0));
    }
    normalize(&mut vec);
    vec
}

fn normalize(vec: &mut [f64]) {
    let norm = vec.iter().map(|v| v * v).sum::<f64>().sqrt();
    if norm == 0.0 {
        return;
    }
    for value in vec {
        *value /= norm;
    }
}

fn fnv1a_64(bytes: &[u8]) -> u64 {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for byte in bytes {
        hash ^= u64::from(*byte);
        hash = hash.wrapping_mul(0x0000_0100_0000_01b3);
    }
    hash
}

fn splitmix64(state: &mut u64) -> u64 {
    *state = state.wrapping_add(0x9E37_79B9_7F4A_7C15);
    let mut z = *state;
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}
