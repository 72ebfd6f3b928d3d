//! Ranking pipeline that orchestrates aggregation and partitioning

use super::accept::accept_split;
use super::aggregate::aggregate_and_sort;
use super::partition::{partition, partition_parallel};
use crate::stats::effect_size::cliffs_delta_sorted;
use crate::stats::kruskal::kruskal_wallis;
use crate::structs::{
    AggFunc, Comparison, CsvData, EffectMagnitude, EsdConfig, RankTestOutcome, RankedGroup,
    RankingResult, Result, SkError,
};
use tracing::info;

/// Which columns to rank and how to run the partitioner
pub struct RankingRequest<'a> {
    pub group_column: &'a str,
    pub value_column: &'a str,
    pub parallel: bool,
}

/// Run the full Scott-Knott ESD ranking on a table
///
/// # Errors
/// Returns error if the configuration is invalid, a column is missing, or the
/// table holds no usable observations. Configuration is checked before any
/// data is touched.
pub fn run_ranking(
    csv: &CsvData,
    request: &RankingRequest<'_>,
    config: &EsdConfig,
) -> Result<RankingResult> {
    config.validate()?;

    let aggregated = aggregate_and_sort(
        csv,
        request.group_column,
        request.value_column,
        config.agg_func,
    )?;

    info!(
        groups = aggregated.ordered.len(),
        alpha = config.alpha,
        effect_thresh = config.effect_thresh,
        parallel = request.parallel,
        "Partitioning groups"
    );
    let partitioned = if request.parallel {
        partition_parallel(&aggregated.ordered, config)
    } else {
        partition(&aggregated.ordered, config)
    };
    info!(clusters = partitioned.clusters.len(), "Partitioning complete");

    let mut groups = Vec::with_capacity(aggregated.ordered.len());
    for (rank, cluster) in partitioned.clusters.iter().enumerate() {
        for idx in cluster.start..cluster.end {
            groups.push(RankedGroup {
                id: aggregated.ordered.groups()[idx].id.clone(),
                rank: rank + 1,
                aggregate: aggregated.aggregates[idx],
                stats: aggregated.stats[idx].clone(),
            });
        }
    }

    Ok(RankingResult {
        group_column: request.group_column.to_string(),
        value_column: request.value_column.to_string(),
        config: *config,
        groups,
        clusters: partitioned.clusters,
        decisions: partitioned.decisions,
    })
}

/// Compare two groups directly with Cliff's delta and Kruskal-Wallis
///
/// `separable` reports whether the same gate the partitioner applies would
/// split these two groups apart under `config`.
///
/// # Errors
/// Returns error if the configuration is invalid, a column is missing, or
/// either group has no observations
pub fn compare_groups(
    csv: &CsvData,
    group_column: &str,
    value_column: &str,
    pair: (&str, &str),
    config: &EsdConfig,
) -> Result<Comparison> {
    config.validate()?;
    let (left, right) = pair;
    let aggregated = aggregate_and_sort(csv, group_column, value_column, AggFunc::default())?;
    let find = |id: &str| {
        aggregated
            .ordered
            .find(id)
            .ok_or_else(|| SkError::Data(format!("Group '{id}' not found in column '{group_column}'")))
    };
    let l = find(left)?;
    let r = find(right)?;

    let delta = cliffs_delta_sorted(l.samples(), r.samples());
    let (h, p_value) = match kruskal_wallis(&[l.samples(), r.samples()]) {
        RankTestOutcome::Separated { h, p_value } => (Some(h), Some(p_value)),
        RankTestOutcome::Degenerate(_) => (None, None),
    };

    Ok(Comparison {
        left: l.id.clone(),
        right: r.id.clone(),
        delta,
        magnitude: EffectMagnitude::classify(delta),
        h,
        p_value,
        separable: accept_split(
            std::slice::from_ref(l),
            std::slice::from_ref(r),
            p_value,
            config,
        ),
    })
}
