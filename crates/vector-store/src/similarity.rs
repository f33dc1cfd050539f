use crate::error::{Result, VectorStoreError};
use ndarray::ArrayView1;

/// Cosine of the angle between `a` and `b`.
///
/// A zero-norm vector on either side yields `0.0`; vectors of different
/// length are a [`VectorStoreError::DimensionMismatch`].
pub fn cosine_similarity(a: &[f64], b: &[f64]) -> Result<f64> {
    if a.len() != b.len() {
        return Err(VectorStoreError::DimensionMismatch {
            left: a.len(),
            right: b.len(),
        });
    }

    let a = ArrayView1::from(a);
    let b = ArrayView1::from(b);

    let max_a = max_abs(&a);
    let max_b = max_abs(&b);
    if max_a == 0.0 || max_b == 0.0 {
        return Ok(0.0);
    }

    // Scaled to a max component of 1 so the squares neither overflow nor underflow.
    let a = &a / max_a;
    let b = &b / max_b;
    let norm_a = a.dot(&a).sqrt();
    let norm_b = b.dot(&b).sqrt();

    Ok(a.dot(&b) / (norm_a * norm_b))
}

fn max_abs(v: &ArrayView1<'_, f64>) -> f64 {
    v.fold(0.0_f64, |max, x| max.max(x.abs()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const EPS: f64 = 1e-9;

    #[test]
    fn orthogonal_and_parallel() {
        assert!((cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).unwrap()).abs() < EPS);
        assert!((cosine_similarity(&[2.0, 0.0], &[5.0, 0.0]).unwrap() - 1.0).abs() < EPS);
        assert!((cosine_similarity(&[1.0, 1.0], &[1.0, 0.0]).unwrap() - 0.5f64.sqrt()).abs() < EPS);
    }

    #[test]
    fn zero_vector_is_zero_similarity() {
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 2.0]).unwrap(), 0.0);
        assert_eq!(cosine_similarity(&[1.0, 2.0], &[0.0, 0.0]).unwrap(), 0.0);
        assert_eq!(cosine_similarity(&[], &[]).unwrap(), 0.0);
    }

    #[test]
    fn dimension_mismatch_reports_both_lengths() {
        let err = cosine_similarity(&[1.0, 0.0, 0.0], &[1.0, 0.0]).unwrap_err();
        match err {
            VectorStoreError::DimensionMismatch { left, right } => {
                assert_eq!((left, right), (3, 2));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn extreme_magnitudes_stay_finite() {
        let sim = cosine_similarity(&[1e200, 0.0], &[1.0, 0.0]).unwrap();
        assert!((sim - 1.0).abs() < EPS, "{sim}");

        let sim = cosine_similarity(&[1e200, 1e200], &[1e200, 1e200]).unwrap();
        assert!((sim - 1.0).abs() < EPS, "{sim}");

        let sim = cosine_similarity(&[1e-200, 0.0], &[0.0, 1e-200]).unwrap();
        assert!(sim.abs() < EPS, "{sim}");
        let sim = cosine_similarity(&[1e-200, 1e-200], &[3.0, 3.0]).unwrap();
        assert!((sim - 1.0).abs() < EPS, "{sim}");
    }

    fn non_zero_vector() -> impl Strategy<Value = Vec<f64>> {
        prop::collection::vec(-100.0f64..100.0, 1..32)
            .prop_filter("non-zero norm", |v| v.iter().any(|x| x.abs() > 1e-3))
    }

    fn vector_pair() -> impl Strategy<Value = (Vec<f64>, Vec<f64>)> {
        (1usize..32).prop_flat_map(|len| {
            (
                prop::collection::vec(-100.0f64..100.0, len),
                prop::collection::vec(-100.0f64..100.0, len),
            )
        })
    }

    proptest! {
        #[test]
        fn proptest_self_similarity_is_one(v in non_zero_vector()) {
            let sim = cosine_similarity(&v, &v).unwrap();
            prop_assert!((sim - 1.0).abs() < EPS);
        }

        #[test]
        fn proptest_negation_is_minus_one(v in non_zero_vector()) {
            let neg: Vec<f64> = v.iter().map(|x| -x).collect();
            let sim = cosine_similarity(&v, &neg).unwrap();
            prop_assert!((sim + 1.0).abs() < EPS);
        }

        #[test]
        fn proptest_symmetric_and_bounded((a, b) in vector_pair()) {
            let ab = cosine_similarity(&a, &b).unwrap();
            let ba = cosine_similarity(&b, &a).unwrap();
            prop_assert!((ab - ba).abs() < EPS);
            prop_assert!((-1.0 - EPS..=1.0 + EPS).contains(&ab));
        }
    }
}
