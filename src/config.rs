//! Run configuration.

use crate::charts::ChartOptions;
use crate::data::{CleaningOptions, DataSource};
use chrono::NaiveDate;
use std::path::PathBuf;

/// Default chart size in pixels
pub const DEFAULT_CHART_SIZE: (u32, u32) = (1000, 600);

/// Default number of countries listed in the report
pub const DEFAULT_TOP_COUNTRIES: usize = 10;

#[derive(Debug, Clone)]
pub struct AnalysisConfig {
    pub source: DataSource,
    pub output_dir: PathBuf,
    /// Only rows reported on or after this date are analysed
    pub since: Option<NaiveDate>,
    pub cleaning: CleaningOptions,
    pub charts: ChartOptions,
    pub top_countries: usize,
    pub chart_size: (u32, u32),
    pub render_charts: bool,
    pub open_charts: bool,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            source: DataSource::default(),
            output_dir: PathBuf::from("."),
            since: None,
            cleaning: CleaningOptions::default(),
            charts: ChartOptions::default(),
            top_countries: DEFAULT_TOP_COUNTRIES,
            chart_size: DEFAULT_CHART_SIZE,
            render_charts: true,
            open_charts: false,
        }
    }
}
