//! Significance and effect-size gate for candidate splits

use crate::stats::effect_size::cliffs_delta_sorted;
use crate::structs::{EsdConfig, Group, SplitVerdict};

/// Decide whether splitting `left` from `right` is justified
///
/// The split must first be significant (`p_value < alpha`); a missing
/// p-value means no usable cut was found. Then at least one pair of groups
/// across the boundary must reach `effect_thresh` in Cliff's delta. Pairs are
/// scanned left-major and the first qualifying pair accepts the split.
#[must_use]
pub fn evaluate_split(
    left: &[Group],
    right: &[Group],
    p_value: Option<f64>,
    config: &EsdConfig,
) -> SplitVerdict {
    let Some(p_value) = p_value else {
        return SplitVerdict::NoUsableCut;
    };
    if p_value.is_nan() || p_value >= config.alpha {
        return SplitVerdict::NotSignificant { p_value };
    }

    let mut max_delta = 0.0_f64;
    for l in left {
        for r in right {
            let delta = cliffs_delta_sorted(l.samples(), r.samples());
            if delta >= config.effect_thresh {
                return SplitVerdict::Accepted {
                    left_group: l.id.clone(),
                    right_group: r.id.clone(),
                    delta,
                };
            }
            max_delta = max_delta.max(delta);
        }
    }

    SplitVerdict::NegligibleEffect { max_delta }
}

/// Boolean form of [`evaluate_split`]
#[must_use]
pub fn accept_split(
    left: &[Group],
    right: &[Group],
    p_value: Option<f64>,
    config: &EsdConfig,
) -> bool {
    evaluate_split(left, right, p_value, config).is_accepted()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn group(id: &str, samples: &[f64]) -> Group {
        Group::new(id, samples.to_vec())
    }

    #[test]
    fn test_missing_p_value_rejects() {
        let left = [group("a", &[1.0])];
        let right = [group("b", &[9.0])];
        let verdict = evaluate_split(&left, &right, None, &EsdConfig::default());
        assert_eq!(verdict, SplitVerdict::NoUsableCut);
    }

    #[test]
    fn test_p_at_alpha_rejects() {
        let left = [group("a", &[1.0])];
        let right = [group("b", &[9.0])];
        let config = EsdConfig::default();
        assert!(!accept_split(&left, &right, Some(config.alpha), &config));
        assert!(!accept_split(&left, &right, Some(f64::NAN), &config));
    }

    #[test]
    fn test_any_pair_accepts() {
        // b and c are identical, but a already separates from c
        let left = [group("a", &[1.0, 2.0, 3.0]), group("b", &[5.0, 5.0, 5.0])];
        let right = [group("c", &[5.0, 5.0, 5.0]), group("d", &[10.0, 11.0])];
        let verdict = evaluate_split(&left, &right, Some(0.01), &EsdConfig::default());
        match verdict {
            SplitVerdict::Accepted {
                left_group,
                right_group,
                delta,
            } => {
                assert_eq!(left_group, "a");
                assert_eq!(right_group, "c");
                assert!((delta - 1.0).abs() < f64::EPSILON);
            }
            other => panic!("expected accepted split, got {other:?}"),
        }
    }

    #[test]
    fn test_negligible_effect_rejects() {
        let left = [group("a", &[1.0, 2.0, 3.0, 4.0])];
        let right = [group("b", &[1.0, 2.0, 3.0, 4.5])];
        let verdict = evaluate_split(&left, &right, Some(0.001), &EsdConfig::default());
        match verdict {
            SplitVerdict::NegligibleEffect { max_delta } => {
                assert!((max_delta - 1.0 / 16.0).abs() < 1e-12);
            }
            other => panic!("expected rejection, got {other:?}"),
        }
    }

    #[test]
    fn test_threshold_is_inclusive() {
        let left = [group("a", &[1.0, 2.0])];
        let right = [group("b", &[1.5, 2.0])];
        // greater: 2 > 1.5; less: 1 < 1.5, 1 < 2; delta = 1/4
        let config = EsdConfig {
            effect_thresh: 0.25,
            ..EsdConfig::default()
        };
        assert!(accept_split(&left, &right, Some(0.01), &config));
    }
}
