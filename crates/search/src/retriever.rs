use std::collections::HashSet;

use kbqa_vector_store::{Corpus, ItemKind, ScoredItem};

use crate::config::RetrievalConfig;
use crate::error::{Result, SearchError};
use crate::ranked::{rank_pass, RankPass};

/// Coarse-to-fine retrieval over a title → chunks corpus.
///
/// Titles are ranked first and only chunks of the top titles compete in the
/// chunk stage. A strong chunk under a weak title can be missed; raise
/// `title_top_k` (or disable `include_titles`) to trade cost for recall.
#[derive(Clone, Debug, Default)]
pub struct TwoStageRetriever {
    config: RetrievalConfig,
}

impl TwoStageRetriever {
    #[must_use]
    pub const fn new(config: RetrievalConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub const fn config(&self) -> &RetrievalConfig {
        &self.config
    }

    pub fn retrieve(&self, query: &[f64], corpus: &Corpus) -> Result<Vec<ScoredItem>> {
        retrieve(
            query,
            corpus,
            self.config.title_top_k,
            self.config.chunk_top_k,
            self.config.include_titles,
        )
    }

    pub fn rank_titles(&self, query: &[f64], corpus: &Corpus) -> Result<Vec<ScoredItem>> {
        rank_titles(query, corpus, self.config.title_top_k)
    }
}

/// Rank chunks of `corpus` against `query`, best-first, unique by text and at
/// most `chunk_top_k` long.
pub fn retrieve(
    query: &[f64],
    corpus: &Corpus,
    title_top_k: usize,
    chunk_top_k: usize,
    include_titles: bool,
) -> Result<Vec<ScoredItem>> {
    if corpus.is_empty() {
        return Err(SearchError::EmptyCorpus);
    }

    let ranked = if include_titles {
        let titles = title_pass(query, corpus, Some(title_top_k))?;
        let top_titles: HashSet<&str> = titles.items.iter().map(|t| t.text.as_str()).collect();
        log::debug!("Top titles: {:?}", titles.items.iter().map(|t| &t.text).collect::<Vec<_>>());

        let relevant: Vec<_> = corpus
            .sections()
            .iter()
            .filter(|section| {
                section
                    .title
                    .as_deref()
                    .is_some_and(|title| top_titles.contains(title))
            })
            .collect();
        let pool_size: usize = relevant.iter().map(|s| s.chunks.len()).sum();
        log::debug!(
            "{} sections match top titles, {} candidate chunks",
            relevant.len(),
            pool_size
        );

        let pass = rank_pass(
            query,
            relevant
                .iter()
                .flat_map(|section| section.chunks.iter().map(|chunk| chunk.rank_input())),
            ItemKind::Chunk,
            Some(chunk_top_k),
        );
        ensure_compatible(pass, query)?
    } else {
        let pass = rank_pass(
            query,
            corpus.chunks().map(|chunk| chunk.rank_input()),
            ItemKind::Chunk,
            Some(chunk_top_k),
        );
        ensure_compatible(pass, query)?
    };

    let mut seen = HashSet::new();
    let mut unique: Vec<ScoredItem> = ranked
        .into_iter()
        .filter(|item| !item.text.is_empty() && seen.insert(item.text.clone()))
        .collect();
    unique.truncate(chunk_top_k);
    Ok(unique)
}

/// Rank section titles only, surfacing `title_text` items.
pub fn rank_titles(query: &[f64], corpus: &Corpus, limit: usize) -> Result<Vec<ScoredItem>> {
    if corpus.is_empty() {
        return Err(SearchError::EmptyCorpus);
    }
    Ok(title_pass(query, corpus, Some(limit))?.items)
}

fn title_pass(query: &[f64], corpus: &Corpus, limit: Option<usize>) -> Result<RankPass> {
    let pass = rank_pass(
        query,
        corpus.sections().iter().map(|section| section.title_input()),
        ItemKind::Title,
        limit,
    );
    if pass.all_mismatched() {
        return Err(mismatch(&pass, query));
    }
    Ok(pass)
}

fn ensure_compatible(pass: RankPass, query: &[f64]) -> Result<Vec<ScoredItem>> {
    if pass.all_mismatched() {
        return Err(mismatch(&pass, query));
    }
    Ok(pass.items)
}

fn mismatch(pass: &RankPass, query: &[f64]) -> SearchError {
    SearchError::DimensionMismatch {
        query: query.len(),
        corpus: pass.mismatch_dimension.unwrap_or_default(),
    }
}
