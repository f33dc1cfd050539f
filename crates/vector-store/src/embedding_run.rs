use crate::corpus::Corpus;
use crate::embeddings::{EmbedPurpose, Embedder};
use crate::error::{Result, VectorStoreError};
use crate::types::{Chunk, Question, Section, Vector};
use kbqa_chunker::DocumentSection;
use std::time::Duration;

/// One embedding pass over sections or questions, batched to the
/// embedder's request limit.
pub struct EmbeddingRun<'a, E: Embedder + ?Sized> {
    embedder: &'a E,
    batch_size: usize,
    pause: Duration,
}

impl<'a, E: Embedder + ?Sized> EmbeddingRun<'a, E> {
    pub fn new(embedder: &'a E) -> Self {
        Self {
            batch_size: embedder.max_batch().max(1),
            embedder,
            pause: Duration::ZERO,
        }
    }

    /// Texts per request, clamped to `1..=embedder.max_batch()`.
    #[must_use]
    pub fn batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.clamp(1, self.embedder.max_batch().max(1));
        self
    }

    /// Delay between consecutive requests, for rate-limited APIs.
    #[must_use]
    pub const fn pause(mut self, pause: Duration) -> Self {
        self.pause = pause;
        self
    }

    /// Embed every non-empty title and every chunk of `sections`.
    pub async fn embed_sections(&self, sections: Vec<DocumentSection>) -> Result<Corpus> {
        let mut texts = Vec::with_capacity(sections.iter().map(DocumentSection::text_count).sum());
        for section in &sections {
            if !section.title.is_empty() {
                texts.push(section.title.clone());
            }
            texts.extend(section.chunks.iter().cloned());
        }
        log::info!(
            "Embedding {} texts from {} sections with {}",
            texts.len(),
            sections.len(),
            self.embedder.model_id()
        );

        let mut vectors = self
            .embed_all(&texts, EmbedPurpose::Document)
            .await?
            .into_iter();
        let mut next = move || {
            vectors.next().ok_or_else(|| {
                VectorStoreError::EmbeddingError("Embedding results ran out".to_string())
            })
        };

        let mut embedded = Vec::with_capacity(sections.len());
        for section in sections {
            let (title, title_embedding) = if section.title.is_empty() {
                (None, None)
            } else {
                (Some(section.title), Some(next()?))
            };
            let mut chunks = Vec::with_capacity(section.chunks.len());
            for text in section.chunks {
                chunks.push(Chunk {
                    chunk_text: Some(text),
                    chunk_embedding: Some(next()?),
                });
            }
            embedded.push(Section {
                title,
                title_embedding,
                chunks,
            });
        }

        log::info!("Embedded corpus of {} sections", embedded.len());
        Ok(Corpus::new(embedded))
    }

    pub async fn embed_questions(&self, questions: &[String]) -> Result<Vec<Question>> {
        if questions.is_empty() {
            return Ok(Vec::new());
        }
        let vectors = self.embed_all(questions, EmbedPurpose::Query).await?;
        log::info!("Embedded {} questions", questions.len());
        Ok(questions
            .iter()
            .zip(vectors)
            .map(|(text, vector)| Question::new(text.clone(), vector))
            .collect())
    }

    async fn embed_all(&self, texts: &[String], purpose: EmbedPurpose) -> Result<Vec<Vector>> {
        let dimension = self.embedder.dimension();
        let mut out = Vec::with_capacity(texts.len());
        for (batch_idx, batch) in texts.chunks(self.batch_size).enumerate() {
            if batch_idx > 0 && !self.pause.is_zero() {
                log::info!(
                    "{} texts embedded, pausing {:?}",
                    out.len(),
                    self.pause
                );
                tokio::time::sleep(self.pause).await;
            }

            let vectors = self.embedder.embed_batch(batch, purpose).await?;
            if vectors.len() != batch.len() {
                return Err(VectorStoreError::EmbeddingError(format!(
                    "Embedder returned {} vectors for {} texts",
                    vectors.len(),
                    batch.len()
                )));
            }
            if let Some(bad) = vectors.iter().find(|v| v.len() != dimension) {
                return Err(VectorStoreError::DimensionMismatch {
                    left: bad.len(),
                    right: dimension,
                });
            }
            out.extend(vectors);
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embeddings::StubEmbedder;
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct CountingEmbedder {
        inner: StubEmbedder,
        calls: Arc<AtomicUsize>,
        max_batch: usize,
        drop_last: bool,
    }

    impl CountingEmbedder {
        fn new(max_batch: usize) -> Self {
            Self {
                inner: StubEmbedder::new(4),
                calls: Arc::new(AtomicUsize::new(0)),
                max_batch,
                drop_last: false,
            }
        }
    }

    #[async_trait]
    impl Embedder for CountingEmbedder {
        fn model_id(&self) -> &str {
            "counting"
        }

        fn dimension(&self) -> usize {
            self.inner.dimension()
        }

        fn max_batch(&self) -> usize {
            self.max_batch
        }

        async fn embed_batch(&self, texts: &[String], purpose: EmbedPurpose) -> Result<Vec<Vector>> {
            self.calls.fetch_add(1, Ordering::Relaxed);
            let mut vectors = self.inner.embed_batch(texts, purpose).await?;
            if self.drop_last {
                vectors.pop();
            }
            Ok(vectors)
        }
    }

    fn section(title: &str, chunks: &[&str]) -> DocumentSection {
        DocumentSection {
            title: title.to_string(),
            chunks: chunks.iter().map(ToString::to_string).collect(),
        }
    }

    #[tokio::test]
    async fn sections_map_vectors_back_in_order() {
        let embedder = StubEmbedder::new(4);
        let corpus = EmbeddingRun::new(&embedder)
            .embed_sections(vec![
                section("Pairing", &["Open the case", "Hold the button"]),
                section("", &["Orphan line"]),
            ])
            .await
            .unwrap();

        let expected_title = embedder.embed("Pairing", EmbedPurpose::Document).await.unwrap();
        let expected_orphan = embedder.embed("Orphan line", EmbedPurpose::Document).await.unwrap();

        let sections = corpus.sections();
        assert_eq!(sections.len(), 2);
        assert_eq!(sections[0].title.as_deref(), Some("Pairing"));
        assert_eq!(sections[0].title_embedding.as_ref(), Some(&expected_title));
        assert_eq!(sections[0].chunks[1].chunk_text.as_deref(), Some("Hold the button"));
        assert!(sections[1].title.is_none());
        assert!(sections[1].title_embedding.is_none());
        assert_eq!(sections[1].chunks[0].chunk_embedding.as_ref(), Some(&expected_orphan));
    }

    #[tokio::test]
    async fn batches_respect_limit() {
        let embedder = CountingEmbedder::new(2);
        let calls = embedder.calls.clone();
        let questions: Vec<String> = (0..5).map(|i| format!("question {i}")).collect();

        let embedded = EmbeddingRun::new(&embedder)
            .batch_size(10)
            .embed_questions(&questions)
            .await
            .unwrap();

        assert_eq!(embedded.len(), 5);
        assert_eq!(calls.load(Ordering::Relaxed), 3);
        assert_eq!(embedded[4].question.as_deref(), Some("question 4"));
    }

    #[tokio::test(start_paused = true)]
    async fn pause_between_batches_only() {
        let embedder = CountingEmbedder::new(1);
        let start = tokio::time::Instant::now();
        EmbeddingRun::new(&embedder)
            .pause(Duration::from_secs(1))
            .embed_questions(&["a".to_string(), "b".to_string(), "c".to_string()])
            .await
            .unwrap();
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_secs(2) && elapsed < Duration::from_secs(3));
    }

    #[tokio::test]
    async fn short_batch_is_an_error() {
        let mut embedder = CountingEmbedder::new(100);
        embedder.drop_last = true;
        let err = EmbeddingRun::new(&embedder)
            .embed_sections(vec![section("Title", &["chunk"])])
            .await
            .unwrap_err();
        assert!(matches!(err, VectorStoreError::EmbeddingError(_)));
    }

    #[tokio::test]
    async fn empty_questions_skip_embedder() {
        let embedder = CountingEmbedder::new(100);
        let calls = embedder.calls.clone();
        let out = EmbeddingRun::new(&embedder).embed_questions(&[]).await.unwrap();
        assert!(out.is_empty());
        assert_eq!(calls.load(Ordering::Relaxed), 0);
    }
}
