use crate::structs::{AggFunc, GroupStats, Result, SkError};

impl GroupStats {
    /// Calculate statistics for a vector of values
    ///
    /// # Errors
    /// Returns error if values is empty
    #[allow(clippy::cast_precision_loss)]
    pub fn calculate(name: &str, values: &[f64]) -> Result<Self> {
        if values.is_empty() {
            return Err(SkError::Data(format!(
                "Cannot calculate stats for empty group '{name}'"
            )));
        }

        let count = values.len();
        let mean = mean(values);

        let variance = values.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / count as f64;
        let std_dev = variance.sqrt();

        let mut sorted = values.to_vec();
        sorted.sort_by(f64::total_cmp);

        Ok(Self {
            name: name.to_string(),
            count,
            mean,
            std_dev,
            min: sorted[0],
            max: sorted[count - 1],
            q1: percentile(&sorted, 25.0),
            median: percentile(&sorted, 50.0),
            q3: percentile(&sorted, 75.0),
        })
    }
}

impl AggFunc {
    /// Reduce a group's observations to its ordering statistic
    #[must_use]
    pub fn apply(self, values: &[f64]) -> f64 {
        match self {
            Self::Median => median(values),
            Self::Mean => mean(values),
        }
    }
}

/// Arithmetic mean; 0.0 for an empty slice
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Median; even-length samples average the two middle values
#[must_use]
pub fn median(values: &[f64]) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    percentile(&sorted, 50.0)
}

/// Calculate percentile using linear interpolation
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
fn percentile(sorted: &[f64], p: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    if sorted.len() == 1 {
        return sorted[0];
    }

    let k = (p / 100.0) * (sorted.len() - 1) as f64;
    let f = k.floor() as usize;
    let c = k.ceil() as usize;

    if f == c {
        sorted[f]
    } else {
        let d0 = sorted[f] * (c as f64 - k);
        let d1 = sorted[c] * (k - f as f64);
        d0 + d1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_group_stats() {
        let values = vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 10.0];
        let stats = GroupStats::calculate("test", &values).expect("calculate stats");

        assert_eq!(stats.count, 10);
        assert!((stats.mean - 5.5).abs() < 0.01);
        assert!((stats.min - 1.0).abs() < 0.01);
        assert!((stats.max - 10.0).abs() < 0.01);
        assert!((stats.median - 5.5).abs() < 0.01);
        assert!((stats.q1 - 3.25).abs() < 0.01);
    }

    #[test]
    fn test_empty_group() {
        assert!(GroupStats::calculate("empty", &[]).is_err());
    }

    #[test]
    fn test_median_odd_and_even() {
        assert!((median(&[3.0, 1.0, 2.0]) - 2.0).abs() < f64::EPSILON);
        assert!((median(&[4.0, 1.0, 3.0, 2.0]) - 2.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_agg_func_apply() {
        let values = [1.0, 2.0, 100.0];
        assert!((AggFunc::Median.apply(&values) - 2.0).abs() < f64::EPSILON);
        assert!((AggFunc::Mean.apply(&values) - 103.0 / 3.0).abs() < 1e-12);
    }
}
