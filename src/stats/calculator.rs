//! Statistics Calculator Module
//! Handles descriptive statistics over numeric columns and case/death correlation.

use crate::data::columns;
use polars::prelude::*;
use serde::Serialize;
use statrs::statistics::Statistics;

/// Descriptive statistics for a single numeric column.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ColumnSummary {
    pub column: String,
    pub count: usize,
    pub mean: f64,
    pub std: f64,
    pub min: f64,
    pub q25: f64,
    pub median: f64,
    pub q75: f64,
    pub max: f64,
}

/// Handles statistical calculations.
pub struct StatsCalculator;

impl StatsCalculator {
    /// Compute descriptive statistics for an array of values.
    ///
    /// An empty slice yields an all-zero summary.
    pub fn compute_descriptive_stats(values: &[f64]) -> ColumnSummary {
        let n = values.len();
        if n == 0 {
            return ColumnSummary::default();
        }

        let mut sorted = values.to_vec();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

        // Sample standard deviation, zero for a single observation
        let std = if n > 1 { values.iter().std_dev() } else { 0.0 };

        ColumnSummary {
            column: String::new(),
            count: n,
            mean: values.iter().mean(),
            std,
            min: sorted[0],
            q25: Self::percentile(&sorted, 25.0),
            median: Self::percentile(&sorted, 50.0),
            q75: Self::percentile(&sorted, 75.0),
            max: sorted[n - 1],
        }
    }

    /// Calculate percentile using linear interpolation (NumPy compatible).
    fn percentile(sorted_values: &[f64], p: f64) -> f64 {
        let n = sorted_values.len();
        if n == 0 {
            return 0.0;
        }
        if n == 1 {
            return sorted_values[0];
        }

        let rank = (p / 100.0) * (n - 1) as f64;
        let lower = rank.floor() as usize;
        let upper = (rank.ceil() as usize).min(n - 1);
        let frac = rank - lower as f64;

        if lower == upper {
            sorted_values[lower]
        } else {
            sorted_values[lower] * (1.0 - frac) + sorted_values[upper] * frac
        }
    }

    /// Summaries for the given numeric columns; nulls are skipped.
    pub fn describe(df: &DataFrame, names: &[&str]) -> PolarsResult<Vec<ColumnSummary>> {
        names
            .iter()
            .map(|name| {
                let values = columns::f64_values(df, name)?;
                let mut summary = Self::compute_descriptive_stats(&values);
                summary.column = name.to_string();
                Ok(summary)
            })
            .collect()
    }

    /// Pearson correlation coefficient.
    ///
    /// `None` for fewer than two pairs, mismatched lengths or a constant series.
    pub fn correlation(xs: &[f64], ys: &[f64]) -> Option<f64> {
        if xs.len() != ys.len() || xs.len() < 2 {
            return None;
        }

        let std_x = xs.iter().std_dev();
        let std_y = ys.iter().std_dev();
        if std_x == 0.0 || std_y == 0.0 || std_x.is_nan() || std_y.is_nan() {
            return None;
        }

        let r = xs.iter().covariance(ys.iter()) / (std_x * std_y);
        Some(r.clamp(-1.0, 1.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-9,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn test_descriptive_stats_matches_pandas_describe() {
        let s = StatsCalculator::compute_descriptive_stats(&[4.0, 1.0, 3.0, 2.0]);
        assert_eq!(s.count, 4);
        assert_close(s.mean, 2.5);
        assert_close(s.std, 1.2909944487358056);
        assert_close(s.min, 1.0);
        assert_close(s.q25, 1.75);
        assert_close(s.median, 2.5);
        assert_close(s.q75, 3.25);
        assert_close(s.max, 4.0);
    }

    #[test]
    fn test_single_value() {
        let s = StatsCalculator::compute_descriptive_stats(&[7.0]);
        assert_eq!(s.count, 1);
        assert_close(s.std, 0.0);
        assert_close(s.q25, 7.0);
        assert_close(s.q75, 7.0);
    }

    #[test]
    fn test_empty_input_is_all_zero() {
        let s = StatsCalculator::compute_descriptive_stats(&[]);
        assert_eq!(s, ColumnSummary::default());

        let df = df!["New_cases" => Vec::<f64>::new()].unwrap();
        let summaries = StatsCalculator::describe(&df, &["New_cases"]).unwrap();
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].count, 0);
        assert_close(summaries[0].mean, 0.0);
    }

    #[test]
    fn test_describe_skips_nulls() {
        let df = df!["New_deaths" => [Some(2.0f64), None, Some(4.0)]].unwrap();
        let summaries = StatsCalculator::describe(&df, &["New_deaths"]).unwrap();
        assert_eq!(summaries[0].column, "New_deaths");
        assert_eq!(summaries[0].count, 2);
        assert_close(summaries[0].mean, 3.0);
    }

    #[test]
    fn test_correlation() {
        let r = StatsCalculator::correlation(&[1.0, 2.0, 3.0, 4.0], &[2.0, 4.0, 6.0, 8.0]);
        assert_close(r.unwrap(), 1.0);

        let r = StatsCalculator::correlation(&[1.0, 2.0, 3.0], &[3.0, 2.0, 1.0]);
        assert_close(r.unwrap(), -1.0);

        assert_eq!(StatsCalculator::correlation(&[1.0, 1.0], &[2.0, 3.0]), None);
        assert_eq!(StatsCalculator::correlation(&[1.0], &[2.0]), None);
        assert_eq!(StatsCalculator::correlation(&[], &[]), None);
    }
}
