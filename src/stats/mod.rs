//! Statistics module - Descriptive statistics and grouped aggregation

mod calculator;
mod grouping;

pub use calculator::{ColumnSummary, StatsCalculator};
pub use grouping::{CountryMetric, CountrySummary, DailyTotal, GroupAggregator, RegionSummary};
