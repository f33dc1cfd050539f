use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use kbqa_vector_store::{Corpus, QueryResult, Question};

use crate::config::RetrievalConfig;
use crate::error::{Result, SearchError};
use crate::retriever::TwoStageRetriever;

/// Counters for one batch run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub processed: usize,
    /// Questions without text or embedding.
    pub skipped: usize,
    /// Questions whose retrieval returned an error.
    pub failed: usize,
    pub cancelled: bool,
}

/// Runs two-stage retrieval for many questions against one corpus.
///
/// A failing question is logged and left out of the result; it never stops
/// the remaining questions.
#[derive(Clone, Debug, Default)]
pub struct BatchQueryRunner {
    retriever: TwoStageRetriever,
    cancel: Option<Arc<AtomicBool>>,
}

impl BatchQueryRunner {
    #[must_use]
    pub const fn new(retriever: TwoStageRetriever) -> Self {
        Self {
            retriever,
            cancel: None,
        }
    }

    /// Stop before the next question once `flag` is set. Results gathered so
    /// far are still returned.
    #[must_use]
    pub fn with_cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    pub fn run(&self, questions: &[Question], corpus: &Corpus) -> Result<QueryResult> {
        self.run_with_summary(questions, corpus).map(|(result, _)| result)
    }

    pub fn run_with_summary(
        &self,
        questions: &[Question],
        corpus: &Corpus,
    ) -> Result<(QueryResult, BatchSummary)> {
        if questions.is_empty() {
            return Err(SearchError::EmptyQuerySet);
        }
        if corpus.is_empty() {
            return Err(SearchError::EmptyCorpus);
        }

        let mut result = QueryResult::new();
        let mut summary = BatchSummary::default();

        for (idx, question) in questions.iter().enumerate() {
            if self.is_cancelled() {
                log::warn!(
                    "Batch cancelled after {} of {} questions",
                    idx,
                    questions.len()
                );
                summary.cancelled = true;
                break;
            }

            let (Some(text), Some(embedding)) = (
                question.question.as_deref().filter(|text| !text.is_empty()),
                question.question_embedding.as_deref(),
            ) else {
                log::warn!("Question #{} is missing its text or embedding, skipping", idx);
                summary.skipped += 1;
                continue;
            };

            match self.retriever.retrieve(embedding, corpus) {
                Ok(items) => {
                    log::debug!("'{}': {} results", text, items.len());
                    result.insert(text, items);
                    summary.processed += 1;
                }
                Err(err) => {
                    log::warn!("Failed to process question '{}': {}", text, err);
                    summary.failed += 1;
                }
            }
        }

        log::info!(
            "Batch finished: {} processed, {} skipped, {} failed",
            summary.processed,
            summary.skipped,
            summary.failed
        );
        Ok((result, summary))
    }

    fn is_cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::Relaxed))
    }
}

/// Batch retrieval with the title stage enabled.
pub fn run_batch(
    questions: &[Question],
    corpus: &Corpus,
    title_top_k: usize,
    chunk_top_k: usize,
) -> Result<QueryResult> {
    run_batch_with_summary(questions, corpus, title_top_k, chunk_top_k).map(|(result, _)| result)
}

pub fn run_batch_with_summary(
    questions: &[Question],
    corpus: &Corpus,
    title_top_k: usize,
    chunk_top_k: usize,
) -> Result<(QueryResult, BatchSummary)> {
    BatchQueryRunner::new(TwoStageRetriever::new(RetrievalConfig {
        title_top_k,
        chunk_top_k,
        include_titles: true,
    }))
    .run_with_summary(questions, corpus)
}
