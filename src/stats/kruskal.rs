//! Kruskal-Wallis H test on independent samples

use crate::stats::distribution::chi_squared_sf;
use crate::structs::{DegenerateTest, RankTestOutcome};

/// Run the Kruskal-Wallis H test on two or more samples
///
/// Observations are ranked jointly with tied values sharing their average
/// rank, and H is divided by the tie correction factor. The p-value comes
/// from the chi-squared distribution with `k - 1` degrees of freedom.
///
/// The test is undefined when fewer than two samples are given, when a
/// sample is empty, or when every pooled value is identical (the tie
/// correction is zero); those cases return [`RankTestOutcome::Degenerate`].
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn kruskal_wallis(samples: &[&[f64]]) -> RankTestOutcome {
    if samples.len() < 2 {
        return RankTestOutcome::Degenerate(DegenerateTest::TooFewSamples);
    }
    if samples.iter().any(|s| s.is_empty()) {
        return RankTestOutcome::Degenerate(DegenerateTest::EmptySample);
    }

    let mut pooled: Vec<(f64, usize)> = samples
        .iter()
        .enumerate()
        .flat_map(|(idx, sample)| sample.iter().map(move |&v| (v, idx)))
        .collect();
    pooled.sort_by(|a, b| a.0.total_cmp(&b.0));

    let (rank_sums, tie_term) = rank_sums(&pooled, samples.len());

    let n = pooled.len() as f64;
    let correction = 1.0 - tie_term / (n.powi(3) - n);
    if correction <= 0.0 {
        return RankTestOutcome::Degenerate(DegenerateTest::AllValuesTied);
    }

    let weighted: f64 = rank_sums
        .iter()
        .zip(samples)
        .map(|(r, s)| r * r / s.len() as f64)
        .sum();
    let h = (12.0 / (n * (n + 1.0)) * weighted - 3.0 * (n + 1.0)) / correction;
    let p_value = chi_squared_sf(h, samples.len() - 1);

    RankTestOutcome::Separated { h, p_value }
}

/// Sum of average ranks per sample and the tie term `sum(t^3 - t)`
///
/// `pooled` must be sorted by value.
#[allow(clippy::cast_precision_loss)]
fn rank_sums(pooled: &[(f64, usize)], n_samples: usize) -> (Vec<f64>, f64) {
    let mut sums = vec![0.0; n_samples];
    let mut tie_term = 0.0;

    let mut start = 0;
    while start < pooled.len() {
        let value = pooled[start].0;
        let end = start
            + pooled[start..]
                .iter()
                .take_while(|(v, _)| v.total_cmp(&value).is_eq())
                .count();

        // 1-based ranks start+1..=end share their mean
        let avg_rank = (start + 1 + end) as f64 / 2.0;
        for &(_, sample) in &pooled[start..end] {
            sums[sample] += avg_rank;
        }

        let t = (end - start) as f64;
        tie_term += t.powi(3) - t;
        start = end;
    }

    (sums, tie_term)
}
