//! Consolidated public types for the skesd crate
//!
//! This module contains all public structs, enums, and error types used across the crate.

use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::ops::Range;
use std::str::FromStr;
use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

#[derive(Error, Debug)]
pub enum SkError {
    #[error("CSV parsing error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Data error: {0}")]
    Data(String),
}

pub type Result<T> = std::result::Result<T, SkError>;

// ============================================================================
// Configuration Types
// ============================================================================

/// Summary statistic used to establish the initial group order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AggFunc {
    #[default]
    Median,
    Mean,
}

impl AggFunc {
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Median => "median",
            Self::Mean => "mean",
        }
    }
}

impl FromStr for AggFunc {
    type Err = SkError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "median" => Ok(Self::Median),
            "mean" => Ok(Self::Mean),
            other => Err(SkError::Config(format!(
                "Unknown aggregation function: {other}"
            ))),
        }
    }
}

impl fmt::Display for AggFunc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Parameters of one Scott-Knott ESD run
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EsdConfig {
    /// Significance level; a split needs `p < alpha`
    pub alpha: f64,
    /// Minimum Cliff's delta magnitude for a split
    pub effect_thresh: f64,
    pub agg_func: AggFunc,
}

impl EsdConfig {
    pub const DEFAULT_ALPHA: f64 = 0.05;
    pub const DEFAULT_EFFECT_THRESH: f64 = 0.147;

    /// Check parameter ranges before any work is done
    ///
    /// # Errors
    /// Returns a configuration error if `alpha` is outside `(0, 1)` or
    /// `effect_thresh` is outside `[0, 1]`
    pub fn validate(&self) -> Result<()> {
        if !(self.alpha > 0.0 && self.alpha < 1.0) {
            return Err(SkError::Config(format!(
                "alpha must be in (0, 1), got {}",
                self.alpha
            )));
        }
        if !(0.0..=1.0).contains(&self.effect_thresh) {
            return Err(SkError::Config(format!(
                "effect_thresh must be in [0, 1], got {}",
                self.effect_thresh
            )));
        }
        Ok(())
    }
}

impl Default for EsdConfig {
    fn default() -> Self {
        Self {
            alpha: Self::DEFAULT_ALPHA,
            effect_thresh: Self::DEFAULT_EFFECT_THRESH,
            agg_func: AggFunc::Median,
        }
    }
}

// ============================================================================
// CSV Types
// ============================================================================

/// Represents a parsed CSV/TSV file with headers and rows
#[derive(Debug, Clone)]
pub struct CsvData {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl CsvData {
    /// Get number of rows
    #[must_use]
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Get number of columns
    #[must_use]
    pub fn col_count(&self) -> usize {
        self.headers.len()
    }

    /// Get column index by name
    #[must_use]
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Get column index by name, failing with a configuration error
    ///
    /// # Errors
    /// Returns error if no header matches `name`
    pub fn require_column(&self, name: &str) -> Result<usize> {
        self.column_index(name).ok_or_else(|| {
            SkError::Config(format!(
                "Column '{name}' not found (available: {})",
                self.headers.join(", ")
            ))
        })
    }
}

// ============================================================================
// Group Types
// ============================================================================

/// A treatment group and its raw observations, stored sorted ascending
#[derive(Debug, Clone, PartialEq)]
pub struct Group {
    pub id: String,
    samples: Vec<f64>,
}

impl Group {
    /// Build a group; observation order is irrelevant and is normalized here
    #[must_use]
    pub fn new(id: impl Into<String>, mut samples: Vec<f64>) -> Self {
        samples.sort_by(f64::total_cmp);
        Self {
            id: id.into(),
            samples,
        }
    }

    /// Observations in ascending order
    #[must_use]
    pub fn samples(&self) -> &[f64] {
        &self.samples
    }
}

/// Groups ordered ascending by their aggregate statistic
///
/// Every group holds at least one observation and ids are unique.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderedGroups {
    groups: Vec<Group>,
}

impl OrderedGroups {
    /// Wrap groups that are already in ranking order
    ///
    /// # Errors
    /// Returns error if a group has no observations, holds a NaN or infinite
    /// observation, or an id repeats
    pub fn new(groups: Vec<Group>) -> Result<Self> {
        let mut seen = HashSet::new();
        for group in &groups {
            if group.samples.is_empty() {
                return Err(SkError::Data(format!(
                    "Group '{}' has no observations",
                    group.id
                )));
            }
            if let Some(bad) = group.samples.iter().find(|v| !v.is_finite()) {
                return Err(SkError::Data(format!(
                    "Group '{}' has non-finite observation {bad}",
                    group.id
                )));
            }
            if !seen.insert(group.id.as_str()) {
                return Err(SkError::Data(format!("Duplicate group id '{}'", group.id)));
            }
        }
        Ok(Self { groups })
    }

    /// Build from an externally established order and an id -> samples lookup
    ///
    /// # Errors
    /// Returns error if an id in `order` is missing from `lookup`, has no
    /// finite observations, or appears twice
    pub fn from_lookup(order: &[String], lookup: &HashMap<String, Vec<f64>>) -> Result<Self> {
        let groups = order
            .iter()
            .map(|id| {
                lookup
                    .get(id)
                    .map(|samples| Group::new(id.clone(), samples.clone()))
                    .ok_or_else(|| SkError::Data(format!("Group '{id}' has no sample data")))
            })
            .collect::<Result<Vec<_>>>()?;
        Self::new(groups)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    #[must_use]
    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    /// Groups covered by a block
    #[must_use]
    pub fn block(&self, range: Range<usize>) -> &[Group] {
        &self.groups[range]
    }

    /// Group ids in ranking order
    #[must_use]
    pub fn ids(&self) -> Vec<String> {
        self.groups.iter().map(|g| g.id.clone()).collect()
    }

    #[must_use]
    pub fn find(&self, id: &str) -> Option<&Group> {
        self.groups.iter().find(|g| g.id == id)
    }
}

// ============================================================================
// Statistics Types
// ============================================================================

/// Descriptive statistics for one group's observations
#[derive(Debug, Clone, Serialize)]
pub struct GroupStats {
    pub name: String,
    pub count: usize,
    pub mean: f64,
    pub std_dev: f64,
    pub min: f64,
    pub max: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
}

impl GroupStats {
    /// Format as a summary string
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "{}: n={}, mean={:.4}, std={:.4}, min={:.4}, Q1={:.4}, median={:.4}, Q3={:.4}, max={:.4}",
            self.name, self.count, self.mean, self.std_dev, self.min, self.q1, self.median, self.q3, self.max
        )
    }
}

/// Reason a rank test produced no usable statistic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DegenerateTest {
    TooFewSamples,
    EmptySample,
    AllValuesTied,
}

impl fmt::Display for DegenerateTest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            Self::TooFewSamples => "need at least two samples",
            Self::EmptySample => "a sample is empty",
            Self::AllValuesTied => "all values are identical",
        };
        f.write_str(msg)
    }
}

/// Outcome of a Kruskal-Wallis test
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RankTestOutcome {
    Separated { h: f64, p_value: f64 },
    Degenerate(DegenerateTest),
}

/// Conventional magnitude bands for Cliff's delta
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EffectMagnitude {
    Negligible,
    Small,
    Medium,
    Large,
}

impl fmt::Display for EffectMagnitude {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Negligible => "negligible",
            Self::Small => "small",
            Self::Medium => "medium",
            Self::Large => "large",
        };
        f.write_str(label)
    }
}

// ============================================================================
// Partition Types
// ============================================================================

/// Best cut found for a block; `cut` indexes the full ordered sequence
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CandidateSplit {
    pub cut: usize,
    pub h: f64,
    pub p_value: f64,
}

/// Why a block was or was not split
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "verdict", rename_all = "snake_case")]
pub enum SplitVerdict {
    Accepted {
        left_group: String,
        right_group: String,
        delta: f64,
    },
    NoUsableCut,
    NotSignificant {
        p_value: f64,
    },
    NegligibleEffect {
        max_delta: f64,
    },
}

impl SplitVerdict {
    #[must_use]
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted { .. })
    }
}

/// A finalized block of groups that cannot be split further
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Cluster {
    /// First index in the ordered sequence
    pub start: usize,
    /// One past the last index in the ordered sequence
    pub end: usize,
    pub members: Vec<String>,
}

impl Cluster {
    #[must_use]
    pub fn from_block(groups: &OrderedGroups, range: Range<usize>) -> Self {
        Self {
            start: range.start,
            end: range.end,
            members: groups.block(range).iter().map(|g| g.id.clone()).collect(),
        }
    }
}

/// Record of one evaluated block
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BlockDecision {
    pub start: usize,
    pub end: usize,
    pub candidate: Option<CandidateSplit>,
    pub verdict: SplitVerdict,
}

/// Clusters in left-before-right order plus the decisions that produced them
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Partition {
    pub clusters: Vec<Cluster>,
    pub decisions: Vec<BlockDecision>,
}

// ============================================================================
// Report Types
// ============================================================================

/// A group with its final rank
#[derive(Debug, Clone, Serialize)]
pub struct RankedGroup {
    pub id: String,
    /// 1-based cluster index, lowest aggregate first
    pub rank: usize,
    pub aggregate: f64,
    pub stats: GroupStats,
}

/// Complete output of one ranking run
#[derive(Debug, Clone, Serialize)]
pub struct RankingResult {
    pub group_column: String,
    pub value_column: String,
    pub config: EsdConfig,
    pub groups: Vec<RankedGroup>,
    pub clusters: Vec<Cluster>,
    pub decisions: Vec<BlockDecision>,
}

impl RankingResult {
    #[must_use]
    pub fn cluster_count(&self) -> usize {
        self.clusters.len()
    }
}

/// Pairwise comparison of two groups
#[derive(Debug, Clone, Serialize)]
pub struct Comparison {
    pub left: String,
    pub right: String,
    pub delta: f64,
    pub magnitude: EffectMagnitude,
    pub h: Option<f64>,
    pub p_value: Option<f64>,
    /// Whether the pair alone would pass the split gate
    pub separable: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_agg_func_parse() {
        assert_eq!("median".parse::<AggFunc>().expect("parse"), AggFunc::Median);
        assert_eq!("mean".parse::<AggFunc>().expect("parse"), AggFunc::Mean);
        let err = "mode".parse::<AggFunc>().unwrap_err();
        assert!(matches!(err, SkError::Config(_)));
        assert!(err.to_string().contains("Unknown aggregation function: mode"));
    }

    #[test]
    fn test_config_validation() {
        assert!(EsdConfig::default().validate().is_ok());

        let bad_alpha = EsdConfig {
            alpha: 1.0,
            ..EsdConfig::default()
        };
        assert!(matches!(bad_alpha.validate(), Err(SkError::Config(_))));

        let bad_thresh = EsdConfig {
            effect_thresh: -0.1,
            ..EsdConfig::default()
        };
        assert!(matches!(bad_thresh.validate(), Err(SkError::Config(_))));

        let nan_alpha = EsdConfig {
            alpha: f64::NAN,
            ..EsdConfig::default()
        };
        assert!(nan_alpha.validate().is_err());
    }

    #[test]
    fn test_group_sorts_samples() {
        let group = Group::new("a", vec![3.0, 1.0, 2.0]);
        assert_eq!(group.samples(), &[1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_ordered_groups_rejects_empty_and_duplicates() {
        let empty = OrderedGroups::new(vec![Group::new("a", vec![])]);
        assert!(matches!(empty, Err(SkError::Data(_))));

        let dup = OrderedGroups::new(vec![
            Group::new("a", vec![1.0]),
            Group::new("a", vec![2.0]),
        ]);
        assert!(matches!(dup, Err(SkError::Data(_))));
    }

    #[test]
    fn test_ordered_groups_rejects_non_finite() {
        let nan = OrderedGroups::new(vec![
            Group::new("a", vec![1.0, 2.0]),
            Group::new("b", vec![3.0, f64::NAN]),
        ]);
        assert!(matches!(nan, Err(SkError::Data(_))));

        let inf = OrderedGroups::new(vec![Group::new("a", vec![f64::INFINITY])]);
        assert!(matches!(inf, Err(SkError::Data(_))));

        let mut lookup = HashMap::new();
        lookup.insert("a".to_string(), vec![1.0, 2.0]);
        lookup.insert("b".to_string(), vec![3.0, f64::NAN]);
        let order = vec!["a".to_string(), "b".to_string()];
        assert!(matches!(
            OrderedGroups::from_lookup(&order, &lookup),
            Err(SkError::Data(_))
        ));
    }

    #[test]
    fn test_from_lookup() {
        let order = vec!["b".to_string(), "a".to_string()];
        let mut lookup = HashMap::new();
        lookup.insert("a".to_string(), vec![5.0]);
        lookup.insert("b".to_string(), vec![1.0, 2.0]);

        let groups = OrderedGroups::from_lookup(&order, &lookup).expect("build");
        assert_eq!(groups.ids(), vec!["b", "a"]);
        assert_eq!(groups.find("b").map(Group::samples), Some(&[1.0, 2.0][..]));

        let missing = OrderedGroups::from_lookup(&["c".to_string()], &lookup);
        assert!(matches!(missing, Err(SkError::Data(_))));
    }

    #[test]
    fn test_require_column() {
        let csv = CsvData {
            headers: vec!["algo".into(), "score".into()],
            rows: vec![],
        };
        assert_eq!(csv.require_column("score").expect("column"), 1);
        assert!(matches!(csv.require_column("nope"), Err(SkError::Config(_))));
    }
}
