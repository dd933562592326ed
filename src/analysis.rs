//! Analysis Pipeline
//! Load → clean → summarize → chart series → findings, then print, render and export.

use crate::charts::{ChartPlotter, ChartSet, StaticChartRenderer};
use crate::config::AnalysisConfig;
use crate::data::columns::{self, NEW_CASES, NEW_DEATHS, NUMERIC_COLUMNS};
use crate::data::{CleaningReport, DataLoader, DataProcessor};
use crate::report::{Findings, ReportPrinter, SummaryExport};
use crate::stats::{
    ColumnSummary, CountryMetric, CountrySummary, DailyTotal, GroupAggregator, RegionSummary,
    StatsCalculator,
};
use anyhow::{Context, Result};
use polars::prelude::*;

/// Everything computed from one dataset.
pub struct Analysis {
    pub cleaned: DataFrame,
    pub cleaning: CleaningReport,
    pub descriptive: Vec<ColumnSummary>,
    pub regions: Vec<RegionSummary>,
    pub countries: Vec<CountrySummary>,
    pub top_countries: Vec<CountrySummary>,
    pub daily: Vec<DailyTotal>,
    pub correlation: Option<f64>,
    pub charts: ChartSet,
    pub findings: Findings,
}

impl Analysis {
    /// Analyse an already loaded table. No I/O.
    pub fn from_frame(raw: &DataFrame, config: &AnalysisConfig) -> Result<Self> {
        let (mut cleaned, cleaning) =
            DataProcessor::clean(raw, &config.cleaning).context("failed to clean dataset")?;

        if let Some(since) = config.since {
            cleaned = DataProcessor::filter_since(&cleaned, since)
                .with_context(|| format!("failed to filter rows since {}", since))?;
            log::info!("{} rows reported on or after {}", cleaned.height(), since);
        }

        let descriptive = StatsCalculator::describe(&cleaned, &NUMERIC_COLUMNS)
            .context("failed to compute summary statistics")?;
        let countries =
            GroupAggregator::by_country(&cleaned).context("failed to group by country")?;
        let regions = GroupAggregator::by_region(&cleaned).context("failed to group by region")?;
        let daily = GroupAggregator::by_date(&cleaned).context("failed to group by date")?;
        let top_countries = GroupAggregator::top_countries(
            &countries,
            config.top_countries,
            CountryMetric::MeanCumulativeDeaths,
        );

        let correlation = StatsCalculator::correlation(
            &columns::f64_values(&cleaned, NEW_CASES)?,
            &columns::f64_values(&cleaned, NEW_DEATHS)?,
        );

        let charts = ChartPlotter::build(&cleaned, &daily, &regions, &config.charts)
            .context("failed to build chart series")?;
        let findings = Findings::derive(&regions, &countries, &daily, correlation);

        log::debug!(
            "{} regions, {} countries, {} report dates",
            regions.len(),
            countries.len(),
            daily.len()
        );

        Ok(Self {
            cleaned,
            cleaning,
            descriptive,
            regions,
            countries,
            top_countries,
            daily,
            correlation,
            charts,
            findings,
        })
    }

    /// Full run: load the configured source, report, render and export.
    pub fn run(config: &AnalysisConfig) -> Result<Self> {
        let mut loader = DataLoader::new();
        loader
            .load(&config.source)
            .with_context(|| format!("failed to load dataset from {}", config.source))?;
        log::debug!(
            "{:?}: columns {:?}, numeric {:?}",
            loader.get_source(),
            loader.get_columns(),
            loader.get_numeric_columns()
        );

        let raw = loader.take_dataframe()?;
        ReportPrinter::print_exploration(&raw);

        let analysis = Self::from_frame(&raw, config)?;
        log::info!("{} rows analysed", analysis.cleaned.height());
        ReportPrinter::print_summary(&analysis, config.since);

        if config.render_charts {
            let written = StaticChartRenderer::render_all(
                &analysis.charts,
                &config.output_dir,
                config.chart_size,
            )
            .context("failed to render charts")?;
            ReportPrinter::print_charts(&written);
            if config.open_charts {
                StaticChartRenderer::open_all(&written);
            }
        }

        SummaryExport::new(&analysis, config.source.to_string(), config.since)
            .write(&config.output_dir)
            .context("failed to export summary")?;

        Ok(analysis)
    }
}
