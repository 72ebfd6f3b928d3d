//! Builds the ordered group sequence from tabular measurements

use crate::structs::{AggFunc, CsvData, GroupStats, OrderedGroups, Result, SkError};
use std::collections::HashMap;
use tracing::{info, warn};

/// Groups in ranking order with their ordering statistic and descriptive stats
#[derive(Debug, Clone)]
pub struct AggregatedGroups {
    pub ordered: OrderedGroups,
    /// Aggregate value per group, aligned with `ordered`
    pub aggregates: Vec<f64>,
    /// Descriptive statistics per group, aligned with `ordered`
    pub stats: Vec<GroupStats>,
}

/// Group rows by `group_column`, aggregate `value_column`, and sort ascending
///
/// Group keys are compared verbatim, so `"rf"` and `"rf "` are different
/// groups; only rows with an empty key are skipped. Value cells that are
/// missing, non-numeric or non-finite are skipped, and groups left without
/// observations are dropped. Groups sharing an aggregate value keep the
/// order in which they first appear in the table.
///
/// # Errors
/// Returns error if either column is missing or no group has a usable observation
pub fn aggregate_and_sort(
    csv: &CsvData,
    group_column: &str,
    value_column: &str,
    agg_func: AggFunc,
) -> Result<AggregatedGroups> {
    let group_idx = csv.require_column(group_column)?;
    let value_idx = csv.require_column(value_column)?;

    let mut collected: Vec<(String, Vec<f64>)> = Vec::new();
    let mut index_of: HashMap<String, usize> = HashMap::new();
    let mut skipped = 0usize;

    for row in &csv.rows {
        let Some(key) = row.get(group_idx).filter(|s| !s.is_empty()) else {
            skipped += 1;
            continue;
        };

        let slot = *index_of.entry(key.to_string()).or_insert_with(|| {
            collected.push((key.to_string(), Vec::new()));
            collected.len() - 1
        });

        match row
            .get(value_idx)
            .and_then(|s| s.trim().parse::<f64>().ok())
            .filter(|v| v.is_finite())
        {
            Some(value) => collected[slot].1.push(value),
            None => skipped += 1,
        }
    }

    if skipped > 0 {
        warn!(skipped, "Skipped rows without a usable group or numeric value");
    }

    let before = collected.len();
    collected.retain(|(id, values)| {
        if values.is_empty() {
            warn!(group = %id, "Dropping group with no numeric observations");
        }
        !values.is_empty()
    });

    if collected.is_empty() {
        return Err(SkError::Data(format!(
            "No numeric observations in column '{value_column}'"
        )));
    }

    let aggregates: Vec<f64> = collected
        .iter()
        .map(|(_, values)| agg_func.apply(values))
        .collect();

    // Stable sort: equal aggregates keep first-appearance order
    let mut order: Vec<usize> = (0..collected.len()).collect();
    order.sort_by(|&a, &b| aggregates[a].total_cmp(&aggregates[b]));

    let ids: Vec<String> = order.iter().map(|&i| collected[i].0.clone()).collect();
    let stats = order
        .iter()
        .map(|&i| GroupStats::calculate(&collected[i].0, &collected[i].1))
        .collect::<Result<Vec<_>>>()?;
    let lookup: HashMap<String, Vec<f64>> = collected.into_iter().collect();
    let ordered = OrderedGroups::from_lookup(&ids, &lookup)?;

    info!(
        groups = ordered.len(),
        dropped = before - ordered.len(),
        agg = %agg_func,
        "Aggregated and ordered groups"
    );

    Ok(AggregatedGroups {
        ordered,
        aggregates: order.iter().map(|&i| aggregates[i]).collect(),
        stats,
    })
}
