use kbqa_vector_store::{cosine_similarity, ItemKind, RankInput, ScoredItem, VectorStoreError};

/// Outcome of scoring one collection against a query.
#[derive(Debug, Clone, Default)]
pub struct RankPass {
    /// Best-first, truncated to the requested limit.
    pub items: Vec<ScoredItem>,
    /// Items that produced a similarity score.
    pub scored: usize,
    /// Items without text or embedding.
    pub skipped_missing: usize,
    /// Items whose embedding length differs from the query.
    pub mismatched: usize,
    /// Embedding length of the first mismatched item.
    pub mismatch_dimension: Option<usize>,
}

impl RankPass {
    /// Every scorable item failed on dimensions: the query itself does not
    /// fit this collection.
    #[must_use]
    pub const fn all_mismatched(&self) -> bool {
        self.scored == 0 && self.mismatched > 0
    }
}

/// Score `items` against `query`, sort best-first and keep at most `limit`.
///
/// Equal scores keep their input order. Items missing a field, or whose
/// embedding has the wrong length, are skipped.
pub fn rank_items<'a, I>(query: &[f64], items: I, kind: ItemKind, limit: Option<usize>) -> Vec<ScoredItem>
where
    I: IntoIterator<Item = RankInput<'a>>,
{
    rank_pass(query, items, kind, limit).items
}

/// [`rank_items`] with skip accounting.
pub fn rank_pass<'a, I>(query: &[f64], items: I, kind: ItemKind, limit: Option<usize>) -> RankPass
where
    I: IntoIterator<Item = RankInput<'a>>,
{
    let mut pass = RankPass::default();

    for input in items {
        let (Some(text), Some(embedding)) = (input.text, input.embedding) else {
            pass.skipped_missing += 1;
            continue;
        };

        match cosine_similarity(query, embedding) {
            Ok(similarity) if similarity.is_finite() => {
                pass.scored += 1;
                pass.items.push(ScoredItem {
                    kind,
                    text: text.to_string(),
                    similarity,
                });
            }
            Ok(similarity) => {
                log::warn!("Skipping '{}': non-finite similarity {}", text, similarity);
            }
            Err(VectorStoreError::DimensionMismatch { right, .. }) => {
                log::debug!(
                    "Skipping '{}': embedding has {} dimensions, query has {}",
                    text,
                    right,
                    query.len()
                );
                pass.mismatched += 1;
                if pass.mismatch_dimension.is_none() {
                    pass.mismatch_dimension = Some(right);
                }
            }
            Err(err) => {
                log::warn!("Skipping '{}': {}", text, err);
            }
        }
    }

    if pass.mismatched > 0 {
        log::warn!(
            "Skipped {} {:?} items with mismatched dimensions (query has {})",
            pass.mismatched,
            kind,
            query.len()
        );
    }
    if pass.skipped_missing > 0 {
        log::debug!(
            "Skipped {} {:?} items missing text or embedding",
            pass.skipped_missing,
            kind
        );
    }

    // Stable: ties keep input order.
    pass.items.sort_by(|a, b| b.similarity.total_cmp(&a.similarity));
    if let Some(limit) = limit {
        pass.items.truncate(limit);
    }

    pass
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn texts(items: &[ScoredItem]) -> Vec<&str> {
        items.iter().map(|item| item.text.as_str()).collect()
    }

    #[test]
    fn sorts_descending() {
        let a = [0.0, 1.0];
        let b = [1.0, 0.0];
        let c = [1.0, 1.0];
        let ranked = rank_items(
            &[1.0, 0.0],
            [
                RankInput::new("a", &a),
                RankInput::new("b", &b),
                RankInput::new("c", &c),
            ],
            ItemKind::Chunk,
            None,
        );
        assert_eq!(texts(&ranked), vec!["b", "c", "a"]);
        assert!((ranked[0].similarity - 1.0).abs() < 1e-9);
        assert!(ranked[2].similarity.abs() < 1e-9);
    }

    #[test]
    fn ties_keep_input_order() {
        let same = [1.0, 0.0];
        let other = [0.0, 1.0];
        let ranked = rank_items(
            &[1.0, 0.0],
            [
                RankInput::new("low", &other),
                RankInput::new("first", &same),
                RankInput::new("second", &same),
                RankInput::new("third", &same),
            ],
            ItemKind::Chunk,
            None,
        );
        assert_eq!(texts(&ranked), vec!["first", "second", "third", "low"]);
    }

    #[test]
    fn limit_truncates_after_sorting() {
        let v1 = [0.1, 1.0];
        let v2 = [1.0, 0.0];
        let v3 = [1.0, 0.5];
        let ranked = rank_items(
            &[1.0, 0.0],
            [
                RankInput::new("v1", &v1),
                RankInput::new("v2", &v2),
                RankInput::new("v3", &v3),
            ],
            ItemKind::Title,
            Some(2),
        );
        assert_eq!(texts(&ranked), vec!["v2", "v3"]);
        assert!(ranked.iter().all(|item| item.kind == ItemKind::Title));
    }

    #[test]
    fn missing_fields_are_skipped() {
        let v = [1.0, 0.0];
        let pass = rank_pass(
            &[1.0, 0.0],
            [
                RankInput { text: None, embedding: Some(&v[..]) },
                RankInput { text: Some("no vector"), embedding: None },
                RankInput::new("ok", &v),
            ],
            ItemKind::Chunk,
            None,
        );
        assert_eq!(texts(&pass.items), vec!["ok"]);
        assert_eq!(pass.skipped_missing, 2);
        assert!(!pass.all_mismatched());
    }

    #[test]
    fn one_bad_dimension_does_not_abort() {
        let good = [1.0, 0.0];
        let bad = [1.0, 0.0, 0.0];
        let pass = rank_pass(
            &[1.0, 0.0],
            [RankInput::new("bad", &bad), RankInput::new("good", &good)],
            ItemKind::Chunk,
            None,
        );
        assert_eq!(texts(&pass.items), vec!["good"]);
        assert_eq!(pass.mismatched, 1);
        assert_eq!(pass.mismatch_dimension, Some(3));
        assert!(!pass.all_mismatched());
    }

    #[test]
    fn all_bad_dimensions_flagged() {
        let bad = [1.0, 0.0, 0.0];
        let pass = rank_pass(&[1.0, 0.0], [RankInput::new("bad", &bad)], ItemKind::Chunk, Some(5));
        assert!(pass.items.is_empty());
        assert!(pass.all_mismatched());
    }

    #[test]
    fn empty_input_is_not_a_mismatch() {
        let pass = rank_pass(&[1.0], std::iter::empty(), ItemKind::Chunk, None);
        assert!(pass.items.is_empty());
        assert!(!pass.all_mismatched());
    }

    #[test]
    fn query_equal_to_item_ranks_first() {
        let vectors = [[0.6, 0.8], [0.8, 0.6], [1.0, 0.0], [0.0, 1.0]];
        let names = ["a", "b", "c", "d"];
        for (target, query) in vectors.iter().enumerate() {
            let ranked = rank_items(
                query,
                names
                    .iter()
                    .zip(vectors.iter())
                    .map(|(name, v)| RankInput::new(name, v)),
                ItemKind::Chunk,
                Some(1),
            );
            assert_eq!(ranked[0].text, names[target]);
        }
    }

    fn corpus_strategy() -> impl Strategy<Value = (Vec<f64>, Vec<Vec<f64>>)> {
        (1usize..8).prop_flat_map(|dim| {
            (
                prop::collection::vec(-10.0f64..10.0, dim),
                prop::collection::vec(prop::collection::vec(-10.0f64..10.0, dim), 0..24),
            )
        })
    }

    proptest! {
        #[test]
        fn proptest_sorted_and_limited((query, vectors) in corpus_strategy(), limit in 0usize..30) {
            let names: Vec<String> = (0..vectors.len()).map(|i| format!("item-{i}")).collect();
            let ranked = rank_items(
                &query,
                names.iter().zip(vectors.iter()).map(|(n, v)| RankInput::new(n, v)),
                ItemKind::Chunk,
                Some(limit),
            );
            prop_assert_eq!(ranked.len(), limit.min(vectors.len()));
            for pair in ranked.windows(2) {
                prop_assert!(pair[0].similarity >= pair[1].similarity);
            }
        }

        #[test]
        fn proptest_no_limit_keeps_every_valid_item((query, vectors) in corpus_strategy()) {
            let names: Vec<String> = (0..vectors.len()).map(|i| format!("item-{i}")).collect();
            let ranked = rank_items(
                &query,
                names.iter().zip(vectors.iter()).map(|(n, v)| RankInput::new(n, v)),
                ItemKind::Chunk,
                None,
            );
            prop_assert_eq!(ranked.len(), vectors.len());
        }
    }
}
