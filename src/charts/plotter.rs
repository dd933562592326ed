//! Chart Plotter Module
//! Builds the data series behind the four static charts.
//!
//! Rendering only ever sees these series, so what a chart shows can be
//! checked without decoding an image.

use crate::data::columns::{self, NEW_CASES, NEW_DEATHS, REGION};
use crate::stats::{DailyTotal, RegionSummary};
use chrono::NaiveDate;
use polars::prelude::*;
use std::collections::BTreeMap;

/// Default number of histogram bins
pub const DEFAULT_BINS: usize = 50;

/// Default number of points kept for the scatter plot
pub const DEFAULT_SCATTER_SAMPLE: usize = 1000;

/// Global new cases over time.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrendLine {
    pub points: Vec<(NaiveDate, f64)>,
}

/// Total new cases per WHO region, ascending.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RegionBars {
    pub bars: Vec<(String, f64)>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HistogramBin {
    pub lower: f64,
    pub upper: f64,
    pub count: usize,
}

/// Distribution of daily new deaths.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeathHistogram {
    pub bins: Vec<HistogramBin>,
}

/// New cases against new deaths, one point set per region.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CaseDeathScatter {
    pub groups: BTreeMap<String, Vec<(f64, f64)>>,
}

impl CaseDeathScatter {
    pub fn len(&self) -> usize {
        self.groups.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ChartOptions {
    pub histogram_bins: usize,
    pub scatter_sample: usize,
}

impl Default for ChartOptions {
    fn default() -> Self {
        Self {
            histogram_bins: DEFAULT_BINS,
            scatter_sample: DEFAULT_SCATTER_SAMPLE,
        }
    }
}

/// The data behind all four charts.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChartSet {
    pub trend: TrendLine,
    pub regions: RegionBars,
    pub deaths: DeathHistogram,
    pub scatter: CaseDeathScatter,
}

/// Builds chart series from the cleaned table and its aggregates.
pub struct ChartPlotter;

impl ChartPlotter {
    pub fn build(
        df: &DataFrame,
        daily: &[DailyTotal],
        regions: &[RegionSummary],
        options: &ChartOptions,
    ) -> PolarsResult<ChartSet> {
        let deaths = columns::f64_values(df, NEW_DEATHS)?;
        Ok(ChartSet {
            trend: Self::trend_line(daily),
            regions: Self::region_bars(regions),
            deaths: Self::histogram(&deaths, options.histogram_bins),
            scatter: Self::scatter(df, options.scatter_sample)?,
        })
    }

    pub fn trend_line(daily: &[DailyTotal]) -> TrendLine {
        TrendLine {
            points: daily.iter().map(|d| (d.date, d.new_cases)).collect(),
        }
    }

    pub fn region_bars(regions: &[RegionSummary]) -> RegionBars {
        let mut bars: Vec<(String, f64)> = regions
            .iter()
            .map(|r| (r.region.clone(), r.total_new_cases))
            .collect();
        bars.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));
        RegionBars { bars }
    }

    /// Equal-width bins between the smallest and largest value.
    /// The last bin includes its upper edge.
    pub fn histogram(values: &[f64], bins: usize) -> DeathHistogram {
        if values.is_empty() {
            return DeathHistogram::default();
        }
        let bins = bins.max(1);

        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let width = if max > min {
            (max - min) / bins as f64
        } else {
            1.0
        };

        let mut counts = vec![0usize; bins];
        for &v in values {
            let idx = ((v - min) / width).floor() as usize;
            counts[idx.min(bins - 1)] += 1;
        }

        DeathHistogram {
            bins: counts
                .into_iter()
                .enumerate()
                .map(|(i, count)| HistogramBin {
                    lower: min + i as f64 * width,
                    upper: min + (i + 1) as f64 * width,
                    count,
                })
                .collect(),
        }
    }

    /// Case/death pairs grouped by region, evenly down-sampled to `sample` rows.
    pub fn scatter(df: &DataFrame, sample: usize) -> PolarsResult<CaseDeathScatter> {
        let regions = columns::str_values(df, REGION)?;
        let cases = columns::f64_values(df, NEW_CASES)?;
        let deaths = columns::f64_values(df, NEW_DEATHS)?;

        let n = regions.len().min(cases.len()).min(deaths.len());
        let indices: Vec<usize> = if n <= sample {
            (0..n).collect()
        } else {
            (0..sample).map(|i| i * n / sample).collect()
        };

        let mut groups: BTreeMap<String, Vec<(f64, f64)>> = BTreeMap::new();
        for i in indices {
            groups
                .entry(regions[i].clone())
                .or_default()
                .push((cases[i], deaths[i]));
        }
        Ok(CaseDeathScatter { groups })
    }
}
