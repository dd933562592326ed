//! Charts module - Chart series and static rendering

mod plotter;
mod renderer;

pub use plotter::{
    CaseDeathScatter, ChartOptions, ChartPlotter, ChartSet, DeathHistogram, HistogramBin,
    RegionBars, TrendLine, DEFAULT_BINS, DEFAULT_SCATTER_SAMPLE,
};
pub use renderer::{RenderError, StaticChartRenderer};
