//! COVID-19 Global Data Tracker
//!
//! Loads the WHO COVID-19 global dataset, cleans it, prints descriptive and
//! grouped statistics and renders four static charts.

mod analysis;
mod charts;
mod config;
mod data;
mod report;
mod stats;

use analysis::Analysis;
use anyhow::Result;
use chrono::NaiveDate;
use clap::Parser;
use config::{AnalysisConfig, DEFAULT_CHART_SIZE, DEFAULT_TOP_COUNTRIES};
use data::{CleaningOptions, DataSource, FillStrategy, WHO_DATA_URL};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// Dataset URL or local CSV path
    #[arg(default_value = WHO_DATA_URL)]
    source: String,

    /// Directory receiving the charts and summary.json
    #[arg(long, default_value = ".")]
    output_dir: PathBuf,

    /// Only analyse rows reported on or after this date (YYYY-MM-DD)
    #[arg(long)]
    since: Option<NaiveDate>,

    /// How missing counts are filled
    #[arg(long, value_enum, default_value_t = FillStrategy::Zero)]
    fill: FillStrategy,

    /// Number of countries listed by mean cumulative deaths
    #[arg(long, default_value_t = DEFAULT_TOP_COUNTRIES)]
    top: usize,

    /// Number of bins in the new deaths histogram
    #[arg(long, default_value_t = charts::DEFAULT_BINS)]
    bins: usize,

    /// Maximum number of points on the scatter plot
    #[arg(long, default_value_t = charts::DEFAULT_SCATTER_SAMPLE)]
    sample: usize,

    /// Chart width in pixels
    #[arg(long, default_value_t = DEFAULT_CHART_SIZE.0)]
    width: u32,

    /// Chart height in pixels
    #[arg(long, default_value_t = DEFAULT_CHART_SIZE.1)]
    height: u32,

    /// Print the report and write summary.json without rendering charts
    #[arg(long)]
    no_charts: bool,

    /// Open the rendered charts in the system image viewer
    #[arg(long)]
    open: bool,
}

impl From<Cli> for AnalysisConfig {
    fn from(cli: Cli) -> Self {
        Self {
            source: DataSource::parse(&cli.source),
            output_dir: cli.output_dir,
            since: cli.since,
            cleaning: CleaningOptions { fill: cli.fill },
            charts: charts::ChartOptions {
                histogram_bins: cli.bins,
                scatter_sample: cli.sample,
            },
            top_countries: cli.top,
            chart_size: (cli.width, cli.height),
            render_charts: !cli.no_charts,
            open_charts: cli.open,
        }
    }
}

fn main() {
    env_logger::Builder::new()
        .format_timestamp_millis()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    if let Err(error) = run_cli() {
        log::error!("{error:#}");
        std::process::exit(1);
    }
}

fn run_cli() -> Result<()> {
    let args = Cli::parse();
    log::debug!("{args:#?}");

    let config = AnalysisConfig::from(args);
    Analysis::run(&config)?;

    Ok(())
}
