//! Recursive Scott-Knott partitioning of an ordered group sequence

use super::accept::evaluate_split;
use super::split::best_cut;
use crate::structs::{BlockDecision, Cluster, EsdConfig, OrderedGroups, Partition, SplitVerdict};
use std::ops::Range;
use tracing::debug;

/// Fork depth beyond which `partition_parallel` continues sequentially
pub const PARALLEL_DEPTH_LIMIT: usize = 16;

/// Outcome of evaluating one block
enum Resolution {
    Final(Option<BlockDecision>),
    Split { cut: usize, decision: BlockDecision },
}

/// Partition all groups into clusters
///
/// Blocks are processed from an explicit worklist. An accepted split pushes
/// its right half before its left half, so clusters come out with the whole
/// left subtree ahead of the right one and their concatenation reproduces
/// the input order.
#[must_use]
pub fn partition(groups: &OrderedGroups, config: &EsdConfig) -> Partition {
    if groups.is_empty() {
        return Partition::default();
    }
    partition_block(groups, 0..groups.len(), config)
}

/// Same result as [`partition`], with independent subtrees evaluated on the rayon pool
#[must_use]
pub fn partition_parallel(groups: &OrderedGroups, config: &EsdConfig) -> Partition {
    if groups.is_empty() {
        return Partition::default();
    }
    let mut result = partition_subtree(groups, 0..groups.len(), config, 0);
    result.clusters.sort_by_key(|c| c.start);
    result
}

fn partition_block(groups: &OrderedGroups, block: Range<usize>, config: &EsdConfig) -> Partition {
    let mut result = Partition::default();
    let mut worklist = vec![block];

    while let Some(block) = worklist.pop() {
        match resolve_block(groups, block.clone(), config) {
            Resolution::Final(decision) => {
                result.decisions.extend(decision);
                result.clusters.push(Cluster::from_block(groups, block));
            }
            Resolution::Split { cut, decision } => {
                result.decisions.push(decision);
                worklist.push(cut..block.end);
                worklist.push(block.start..cut);
            }
        }
    }

    result
}

fn partition_subtree(
    groups: &OrderedGroups,
    block: Range<usize>,
    config: &EsdConfig,
    depth: usize,
) -> Partition {
    if depth >= PARALLEL_DEPTH_LIMIT {
        return partition_block(groups, block, config);
    }

    match resolve_block(groups, block.clone(), config) {
        Resolution::Final(decision) => Partition {
            clusters: vec![Cluster::from_block(groups, block)],
            decisions: decision.into_iter().collect(),
        },
        Resolution::Split { cut, decision } => {
            let (left, right) = rayon::join(
                || partition_subtree(groups, block.start..cut, config, depth + 1),
                || partition_subtree(groups, cut..block.end, config, depth + 1),
            );

            let mut merged = Partition {
                clusters: left.clusters,
                decisions: vec![decision],
            };
            merged.decisions.extend(left.decisions);
            merged.clusters.extend(right.clusters);
            merged.decisions.extend(right.decisions);
            merged
        }
    }
}

fn resolve_block(groups: &OrderedGroups, block: Range<usize>, config: &EsdConfig) -> Resolution {
    if block.len() < 2 {
        return Resolution::Final(None);
    }

    let candidate = best_cut(groups, block.clone());
    let verdict = match candidate {
        Some(split) => evaluate_split(
            groups.block(block.start..split.cut),
            groups.block(split.cut..block.end),
            Some(split.p_value),
            config,
        ),
        None => SplitVerdict::NoUsableCut,
    };

    debug!(
        start = block.start,
        end = block.end,
        cut = candidate.map(|c| c.cut),
        accepted = verdict.is_accepted(),
        "resolved block"
    );

    let decision = BlockDecision {
        start: block.start,
        end: block.end,
        candidate,
        verdict,
    };

    match candidate {
        Some(split) if decision.verdict.is_accepted() => Resolution::Split {
            cut: split.cut,
            decision,
        },
        _ => Resolution::Final(Some(decision)),
    }
}
