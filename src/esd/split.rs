//! Best-cut search over a block of ordered groups

use crate::stats::kruskal::kruskal_wallis;
use crate::structs::{CandidateSplit, Group, OrderedGroups, RankTestOutcome};
use std::ops::Range;
use tracing::{debug, trace};

/// Find the cut of `block` whose two pooled sides are best separated
///
/// Every cut `start < c < end` is tried: observations of the groups left of
/// `c` are pooled against those right of it and compared with the
/// Kruskal-Wallis test. The cut with the strictly largest H wins, so ties
/// keep the earliest cut. Cuts where the test is undefined are skipped.
///
/// Returns `None` for blocks with fewer than two groups or when no cut
/// produced a usable statistic.
#[must_use]
pub fn best_cut(groups: &OrderedGroups, block: Range<usize>) -> Option<CandidateSplit> {
    let mut best: Option<CandidateSplit> = None;

    for cut in (block.start + 1)..block.end {
        let left = pool(groups.block(block.start..cut));
        let right = pool(groups.block(cut..block.end));

        match kruskal_wallis(&[left.as_slice(), right.as_slice()]) {
            RankTestOutcome::Separated { h, p_value } => {
                trace!(cut, h, p_value, "evaluated cut");
                if best.map_or(true, |b| h > b.h) {
                    best = Some(CandidateSplit { cut, h, p_value });
                }
            }
            RankTestOutcome::Degenerate(reason) => {
                debug!(
                    cut,
                    left_values = left.len(),
                    right_values = right.len(),
                    %reason,
                    "skipping cut, rank test undefined"
                );
            }
        }
    }

    best
}

/// All observations of the given groups in one sample
fn pool(groups: &[Group]) -> Vec<f64> {
    groups
        .iter()
        .flat_map(|g| g.samples().iter().copied())
        .collect()
}
