//! Cliff's delta effect size

use crate::structs::EffectMagnitude;

/// Upper bounds of the negligible, small and medium bands
const NEGLIGIBLE_BOUND: f64 = 0.147;
const SMALL_BOUND: f64 = 0.33;
const MEDIUM_BOUND: f64 = 0.474;

/// Magnitude of Cliff's delta between two independent samples
///
/// Returns `|#(x > y) - #(x < y)| / (m * n)`, a value in `[0, 1]`.
/// Ties count toward neither side. Returns 0.0 if either sample is empty.
#[must_use]
pub fn cliffs_delta(x: &[f64], y: &[f64]) -> f64 {
    let mut x_sorted = x.to_vec();
    let mut y_sorted = y.to_vec();
    x_sorted.sort_by(f64::total_cmp);
    y_sorted.sort_by(f64::total_cmp);
    cliffs_delta_sorted(&x_sorted, &y_sorted)
}

/// Cliff's delta for samples already sorted ascending
///
/// Each element of `x` is located in `y` by binary search, so the cost is
/// `O(m log n)` rather than comparing every pair.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn cliffs_delta_sorted(x: &[f64], y: &[f64]) -> f64 {
    if x.is_empty() || y.is_empty() {
        return 0.0;
    }

    let n = y.len();
    let mut x_greater = 0usize;
    let mut x_less = 0usize;

    for &xi in x {
        let below = y.partition_point(|&yj| yj < xi);
        let not_above = y.partition_point(|&yj| yj <= xi);
        x_greater += below;
        x_less += n - not_above;
    }

    let dominance = x_greater.abs_diff(x_less) as f64;
    dominance / (x.len() as f64 * n as f64)
}

impl EffectMagnitude {
    /// Label a delta magnitude with the conventional bands
    #[must_use]
    pub fn classify(delta: f64) -> Self {
        let delta = delta.abs();
        if delta < NEGLIGIBLE_BOUND {
            Self::Negligible
        } else if delta < SMALL_BOUND {
            Self::Small
        } else if delta < MEDIUM_BOUND {
            Self::Medium
        } else {
            Self::Large
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_fully_separated() {
        let x = vec![1.0, 2.0, 3.0];
        let y = vec![4.0, 5.0, 6.0];
        assert!((cliffs_delta(&x, &y) - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_partial_overlap() {
        // greater: 2>1, 3>1, 3>2 = 3; less: 1<2, 1<4, 2<4, 3<4 = 4; two ties
        let x = vec![1.0, 2.0, 3.0];
        let y = vec![1.0, 2.0, 4.0];
        let delta = cliffs_delta(&x, &y);
        assert!((delta - 1.0 / 9.0).abs() < 1e-12, "delta = {delta}");
    }

    #[test]
    fn test_unsorted_input() {
        let x = vec![3.0, 1.0, 2.0];
        let y = vec![6.0, 4.0, 5.0];
        assert!((cliffs_delta(&x, &y) - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_empty_sample() {
        assert!(cliffs_delta(&[], &[1.0]).abs() < f64::EPSILON);
    }

    #[test]
    fn test_classify() {
        assert_eq!(EffectMagnitude::classify(0.1), EffectMagnitude::Negligible);
        assert_eq!(EffectMagnitude::classify(0.147), EffectMagnitude::Small);
        assert_eq!(EffectMagnitude::classify(0.4), EffectMagnitude::Medium);
        assert_eq!(EffectMagnitude::classify(0.9), EffectMagnitude::Large);
    }

    fn finite_vec(max_len: usize) -> impl Strategy<Value = Vec<f64>> {
        prop::collection::vec(-1000i32..1000, 1..max_len)
            .prop_map(|v| v.into_iter().map(|i| f64::from(i) / 4.0).collect())
    }

    /// Pairwise reference count
    #[allow(clippy::cast_precision_loss)]
    fn naive_delta(x: &[f64], y: &[f64]) -> f64 {
        let mut score = 0i64;
        for &a in x {
            for &b in y {
                if a > b {
                    score += 1;
                } else if a < b {
                    score -= 1;
                }
            }
        }
        score.unsigned_abs() as f64 / (x.len() * y.len()) as f64
    }

    proptest! {
        #[test]
        fn delta_is_symmetric(x in finite_vec(30), y in finite_vec(30)) {
            prop_assert!((cliffs_delta(&x, &y) - cliffs_delta(&y, &x)).abs() < 1e-12);
        }

        #[test]
        fn self_comparison_is_zero(x in finite_vec(30)) {
            prop_assert!(cliffs_delta(&x, &x).abs() < f64::EPSILON);
        }

        #[test]
        fn matches_pairwise_count(x in finite_vec(20), y in finite_vec(20)) {
            prop_assert!((cliffs_delta(&x, &y) - naive_delta(&x, &y)).abs() < 1e-12);
        }

        #[test]
        fn delta_in_unit_interval(x in finite_vec(30), y in finite_vec(30)) {
            let d = cliffs_delta(&x, &y);
            prop_assert!((0.0..=1.0).contains(&d));
        }
    }
}
