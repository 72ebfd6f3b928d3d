//! Ranking report writers

use crate::structs::{Comparison, CsvData, RankingResult, Result, SplitVerdict};
use serde::Serialize;
use std::fmt::Write as _;
use std::fs;
use std::path::Path;

/// One line of `clusters.csv`
#[derive(Serialize)]
struct ClusterRow<'a> {
    group: &'a str,
    rank: usize,
    cluster_start: usize,
    aggregate: f64,
    count: usize,
}

/// Render the ranking as an aligned text table
#[must_use]
pub fn render_ranking(result: &RankingResult) -> String {
    let width = result
        .groups
        .iter()
        .map(|g| g.id.chars().count())
        .chain(std::iter::once(result.group_column.chars().count()))
        .max()
        .unwrap_or(0);

    let mut out = format!(
        "{:<4}  {:<width$}  {:>12}  {:>6}\n",
        "rank",
        result.group_column,
        result.config.agg_func.name(),
        "n"
    );
    for group in &result.groups {
        let _ = writeln!(
            out,
            "{:<4}  {:<width$}  {:>12.4}  {:>6}",
            group.rank, group.id, group.aggregate, group.stats.count
        );
    }
    out
}

/// Render a two-group comparison
#[must_use]
pub fn render_comparison(cmp: &Comparison) -> String {
    let mut out = format!(
        "{} vs {}\n  Cliff's delta: {:.4} ({})\n",
        cmp.left, cmp.right, cmp.delta, cmp.magnitude
    );
    match (cmp.h, cmp.p_value) {
        (Some(h), Some(p)) => {
            let _ = writeln!(out, "  Kruskal-Wallis: H={h:.4}, p={p:.6}");
        }
        _ => out.push_str("  Kruskal-Wallis: undefined (all values identical)\n"),
    }
    let _ = writeln!(
        out,
        "  Separable: {}",
        if cmp.separable { "yes" } else { "no" }
    );
    out
}

/// Build `summary.txt` content: inputs, clusters, and why each block was or was not split
#[must_use]
pub fn build_summary(csv_path: &Path, csv_data: &CsvData, result: &RankingResult) -> String {
    let mut s = format!(
        "Scott-Knott ESD ranking of {}\n",
        csv_path.display()
    );
    let _ = writeln!(
        s,
        "Input: {} rows x {} columns; groups from '{}', values from '{}'",
        csv_data.row_count(),
        csv_data.col_count(),
        result.group_column,
        result.value_column
    );
    let _ = writeln!(
        s,
        "Settings: alpha={}, effect_thresh={}, order by {}",
        result.config.alpha, result.config.effect_thresh, result.config.agg_func
    );

    let _ = writeln!(s, "\n{} clusters:", result.cluster_count());
    for (i, cluster) in result.clusters.iter().enumerate() {
        let _ = writeln!(s, "  Rank {}: {}", i + 1, cluster.members.join(", "));
    }

    s.push_str("\nGroup statistics:\n");
    for group in &result.groups {
        let _ = writeln!(s, "  {}", group.stats.summary());
    }

    if !result.decisions.is_empty() {
        s.push_str("\nSplit decisions:\n");
        for d in &result.decisions {
            let cut = d
                .candidate
                .map_or_else(|| "-".to_string(), |c| format!("{} (H={:.4}, p={:.6})", c.cut, c.h, c.p_value));
            let _ = writeln!(
                s,
                "  [{}..{}) cut {}: {}",
                d.start,
                d.end,
                cut,
                describe_verdict(&d.verdict)
            );
        }
    }

    s
}

fn describe_verdict(verdict: &SplitVerdict) -> String {
    match verdict {
        SplitVerdict::Accepted {
            left_group,
            right_group,
            delta,
        } => format!("split ({left_group} vs {right_group}, delta={delta:.4})"),
        SplitVerdict::NoUsableCut => "kept, no usable cut".to_string(),
        SplitVerdict::NotSignificant { p_value } => format!("kept, p={p_value:.6} not significant"),
        SplitVerdict::NegligibleEffect { max_delta } => {
            format!("kept, max delta={max_delta:.4} below threshold")
        }
    }
}

/// Write `summary.txt`
///
/// # Errors
/// Returns error if file cannot be written
pub fn write_summary(output_dir: &Path, content: &str) -> Result<()> {
    fs::write(output_dir.join("summary.txt"), content)?;
    Ok(())
}

/// Write `clusters.csv` - one row per group with its rank
///
/// # Errors
/// Returns error if file cannot be written
pub fn write_clusters(output_dir: &Path, result: &RankingResult) -> Result<()> {
    let mut writer = csv::Writer::from_path(output_dir.join("clusters.csv"))?;

    for group in &result.groups {
        let cluster_start = result
            .clusters
            .get(group.rank - 1)
            .map_or(0, |c| c.start);
        writer.serialize(ClusterRow {
            group: &group.id,
            rank: group.rank,
            cluster_start,
            aggregate: group.aggregate,
            count: group.stats.count,
        })?;
    }

    writer.flush()?;
    Ok(())
}

/// Serialize the full ranking as pretty JSON
///
/// # Errors
/// Returns error if serialization fails
pub fn ranking_json(result: &RankingResult) -> Result<String> {
    Ok(serde_json::to_string_pretty(result)?)
}

/// Write `ranking.json` - machine-readable ranking
///
/// # Errors
/// Returns error if file cannot be written
pub fn write_ranking_json(output_dir: &Path, result: &RankingResult) -> Result<()> {
    fs::write(output_dir.join("ranking.json"), ranking_json(result)?)?;
    Ok(())
}
