//! Static Chart Renderer
//! Draws the four chart series to PNG files with plotters.
//!
//! Charts:
//! 1. Line: global new cases over time
//! 2. Bar: total new cases per WHO region
//! 3. Histogram: distribution of daily new deaths
//! 4. Scatter: new cases vs. new deaths, colored by region

use crate::charts::{CaseDeathScatter, ChartSet, DeathHistogram, RegionBars, TrendLine};
use chrono::Duration;
use plotters::prelude::*;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const LINE_CHART_FILE: &str = "global_cases_line.png";
pub const BAR_CHART_FILE: &str = "region_cases_bar.png";
pub const HISTOGRAM_FILE: &str = "deaths_histogram.png";
pub const SCATTER_FILE: &str = "cases_deaths_scatter.png";

// Colors
const LINE_BLUE: RGBColor = RGBColor(31, 119, 180);
const HIST_RED: RGBColor = RGBColor(214, 39, 40);
const GRID: RGBColor = RGBColor(220, 220, 220);

// Region palette (viridis-like for bars, categorical for scatter)
const PALETTE: [RGBColor; 8] = [
    RGBColor(68, 1, 84),
    RGBColor(70, 50, 127),
    RGBColor(54, 92, 141),
    RGBColor(39, 127, 142),
    RGBColor(31, 161, 135),
    RGBColor(74, 194, 109),
    RGBColor(159, 218, 58),
    RGBColor(253, 231, 37),
];

const FONT: &str = "sans-serif";

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Failed to create output directory {path}: {source}")]
    OutputDir {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to draw {chart}: {message}")]
    Draw { chart: &'static str, message: String },
}

fn draw_err<E: std::fmt::Display>(chart: &'static str) -> impl Fn(E) -> RenderError {
    move |e| RenderError::Draw {
        chart,
        message: e.to_string(),
    }
}

/// Upper end of a value axis with some headroom, never empty.
fn axis_max(max: f64) -> f64 {
    if max > 0.0 {
        max * 1.1
    } else {
        1.0
    }
}

pub struct StaticChartRenderer;

impl StaticChartRenderer {
    /// Render every chart into `output_dir`, returning the written paths.
    pub fn render_all(
        set: &ChartSet,
        output_dir: &Path,
        size: (u32, u32),
    ) -> Result<Vec<PathBuf>, RenderError> {
        std::fs::create_dir_all(output_dir).map_err(|source| RenderError::OutputDir {
            path: output_dir.to_path_buf(),
            source,
        })?;

        let line = output_dir.join(LINE_CHART_FILE);
        Self::draw_trend(&set.trend, &line, size)?;

        let bar = output_dir.join(BAR_CHART_FILE);
        Self::draw_region_bars(&set.regions, &bar, size)?;

        let hist = output_dir.join(HISTOGRAM_FILE);
        Self::draw_histogram(&set.deaths, &hist, size)?;

        let scatter = output_dir.join(SCATTER_FILE);
        Self::draw_scatter(&set.scatter, &scatter, size)?;

        let written = vec![line, bar, hist, scatter];
        for path in &written {
            log::info!("wrote {}", path.display());
        }
        Ok(written)
    }

    /// Line chart: global new cases per day
    pub fn draw_trend(
        series: &TrendLine,
        path: &Path,
        size: (u32, u32),
    ) -> Result<(), RenderError> {
        let err = draw_err("line chart");
        let root = BitMapBackend::new(path, size).into_drawing_area();
        root.fill(&WHITE).map_err(&err)?;

        // X axis is days since the first report date
        let first = series.points.first().map(|(d, _)| *d);
        let days = match (series.points.first(), series.points.last()) {
            (Some((a, _)), Some((b, _))) => ((*b - *a).num_days() as f64).max(1.0),
            _ => 1.0,
        };
        let y_max = axis_max(series.points.iter().map(|(_, v)| *v).fold(0.0, f64::max));

        let mut chart = ChartBuilder::on(&root)
            .caption("Global New COVID-19 Cases Trend", (FONT, 26))
            .margin(15)
            .x_label_area_size(60)
            .y_label_area_size(80)
            .build_cartesian_2d(0f64..days, 0f64..y_max)
            .map_err(&err)?;

        let date_label = |x: &f64| match first {
            Some(start) => (start + Duration::days(x.round() as i64))
                .format("%Y-%m-%d")
                .to_string(),
            None => String::new(),
        };
        chart
            .configure_mesh()
            .light_line_style(GRID)
            .x_desc("Date")
            .y_desc("New Cases")
            .x_labels(8)
            .x_label_formatter(&date_label)
            .draw()
            .map_err(&err)?;

        if let Some(start) = first {
            chart
                .draw_series(LineSeries::new(
                    series
                        .points
                        .iter()
                        .map(|(d, v)| ((*d - start).num_days() as f64, *v)),
                    LINE_BLUE.stroke_width(2),
                ))
                .map_err(&err)?
                .label("Global New Cases")
                .legend(|(x, y)| {
                    PathElement::new(vec![(x, y), (x + 20, y)], LINE_BLUE.stroke_width(2))
                });
        }

        chart
            .configure_series_labels()
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .draw()
            .map_err(&err)?;

        root.present().map_err(&err)?;
        Ok(())
    }

    /// Bar chart: total new cases per region
    pub fn draw_region_bars(
        series: &RegionBars,
        path: &Path,
        size: (u32, u32),
    ) -> Result<(), RenderError> {
        let err = draw_err("bar chart");
        let root = BitMapBackend::new(path, size).into_drawing_area();
        root.fill(&WHITE).map_err(&err)?;

        let n = series.bars.len().max(1);
        let y_max = axis_max(series.bars.iter().map(|(_, v)| *v).fold(0.0, f64::max));

        let mut chart = ChartBuilder::on(&root)
            .caption("Total New COVID-19 Cases by WHO Region", (FONT, 26))
            .margin(15)
            .x_label_area_size(50)
            .y_label_area_size(90)
            .build_cartesian_2d((0..n).into_segmented(), 0f64..y_max)
            .map_err(&err)?;

        let region_label = |v: &SegmentValue<usize>| match v {
            SegmentValue::CenterOf(i) => series
                .bars
                .get(*i)
                .map(|(name, _)| name.clone())
                .unwrap_or_default(),
            _ => String::new(),
        };
        chart
            .configure_mesh()
            .disable_x_mesh()
            .light_line_style(GRID)
            .x_desc("WHO Region")
            .y_desc("Total New Cases")
            .x_labels(n)
            .x_label_formatter(&region_label)
            .draw()
            .map_err(&err)?;

        for (i, (_, value)) in series.bars.iter().enumerate() {
            let color = PALETTE[i % PALETTE.len()];
            let bars = chart
                .draw_series(
                    Histogram::vertical(&chart)
                        .style(color.filled())
                        .margin(12)
                        .data(std::iter::once((i, *value))),
                )
                .map_err(&err)?;
            // One legend entry for the whole bar group
            if i == 0 {
                bars.label("Regional Totals").legend(move |(x, y)| {
                    Rectangle::new([(x, y - 5), (x + 10, y + 5)], color.filled())
                });
            }
        }

        chart
            .configure_series_labels()
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .draw()
            .map_err(&err)?;

        root.present().map_err(&err)?;
        Ok(())
    }

    /// Histogram: distribution of daily new deaths
    pub fn draw_histogram(
        series: &DeathHistogram,
        path: &Path,
        size: (u32, u32),
    ) -> Result<(), RenderError> {
        let err = draw_err("histogram");
        let root = BitMapBackend::new(path, size).into_drawing_area();
        root.fill(&WHITE).map_err(&err)?;

        let (x_min, x_max) = match (series.bins.first(), series.bins.last()) {
            (Some(first), Some(last)) => (first.lower, last.upper),
            _ => (0.0, 1.0),
        };
        let y_max = axis_max(series.bins.iter().map(|b| b.count as f64).fold(0.0, f64::max));

        let mut chart = ChartBuilder::on(&root)
            .caption("Distribution of Daily New COVID-19 Deaths", (FONT, 26))
            .margin(15)
            .x_label_area_size(50)
            .y_label_area_size(80)
            .build_cartesian_2d(x_min..x_max, 0f64..y_max)
            .map_err(&err)?;

        chart
            .configure_mesh()
            .light_line_style(GRID)
            .x_desc("New Deaths")
            .y_desc("Frequency")
            .draw()
            .map_err(&err)?;

        chart
            .draw_series(series.bins.iter().map(|bin| {
                Rectangle::new(
                    [(bin.lower, 0.0), (bin.upper, bin.count as f64)],
                    HIST_RED.mix(0.7).filled(),
                )
            }))
            .map_err(&err)?
            .label("Death Distribution")
            .legend(|(x, y)| Rectangle::new([(x, y - 5), (x + 10, y + 5)], HIST_RED.filled()));

        chart
            .draw_series(series.bins.iter().map(|bin| {
                Rectangle::new([(bin.lower, 0.0), (bin.upper, bin.count as f64)], BLACK)
            }))
            .map_err(&err)?;

        chart
            .configure_series_labels()
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .draw()
            .map_err(&err)?;

        root.present().map_err(&err)?;
        Ok(())
    }

    /// Scatter plot: new cases vs. new deaths by region
    pub fn draw_scatter(
        series: &CaseDeathScatter,
        path: &Path,
        size: (u32, u32),
    ) -> Result<(), RenderError> {
        let err = draw_err("scatter plot");
        if series.is_empty() {
            log::warn!("scatter plot has no points");
        }
        let root = BitMapBackend::new(path, size).into_drawing_area();
        root.fill(&WHITE).map_err(&err)?;

        let points = || series.groups.values().flatten();
        let x_max = axis_max(points().map(|(x, _)| *x).fold(0.0, f64::max));
        let y_max = axis_max(points().map(|(_, y)| *y).fold(0.0, f64::max));

        let mut chart = ChartBuilder::on(&root)
            .caption("New COVID-19 Cases vs. New Deaths by Region", (FONT, 26))
            .margin(15)
            .x_label_area_size(50)
            .y_label_area_size(80)
            .build_cartesian_2d(0f64..x_max, 0f64..y_max)
            .map_err(&err)?;

        chart
            .configure_mesh()
            .light_line_style(GRID)
            .x_desc("New Cases")
            .y_desc("New Deaths")
            .draw()
            .map_err(&err)?;

        for (i, (region, group)) in series.groups.iter().enumerate() {
            let color = PALETTE[(i * 3) % PALETTE.len()];
            chart
                .draw_series(
                    group
                        .iter()
                        .map(|&(x, y)| Circle::new((x, y), 4, color.mix(0.6).filled())),
                )
                .map_err(&err)?
                .label(region.as_str())
                .legend(move |(x, y)| Circle::new((x + 5, y), 4, color.filled()));
        }

        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperLeft)
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .draw()
            .map_err(&err)?;

        root.present().map_err(&err)?;
        Ok(())
    }

    /// Show rendered charts in the system image viewer.
    pub fn open_all(paths: &[PathBuf]) {
        for path in paths {
            if let Err(e) = open::that(path) {
                log::warn!("could not open {}: {}", path.display(), e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::charts::HistogramBin;
    use chrono::NaiveDate;
    use std::collections::BTreeMap;

    #[test]
    fn test_axis_max_has_headroom_and_is_never_empty() {
        assert_eq!(axis_max(0.0), 1.0);
        assert_eq!(axis_max(-3.0), 1.0);
        assert!((axis_max(100.0) - 110.0).abs() < 1e-9);
    }

    fn sample_set() -> ChartSet {
        let day = |d| NaiveDate::from_ymd_opt(2025, 1, d).unwrap();
        let mut groups = BTreeMap::new();
        groups.insert("AFR".to_string(), vec![(10.0, 0.0), (5.0, 1.0)]);
        groups.insert("EUR".to_string(), vec![(120.0, 3.0)]);
        ChartSet {
            trend: TrendLine {
                points: vec![(day(1), 130.0), (day(2), 85.0), (day(3), 40.0)],
            },
            regions: RegionBars {
                bars: vec![("AFR".to_string(), 15.0), ("EUR".to_string(), 120.0)],
            },
            deaths: DeathHistogram {
                bins: vec![
                    HistogramBin {
                        lower: 0.0,
                        upper: 1.5,
                        count: 2,
                    },
                    HistogramBin {
                        lower: 1.5,
                        upper: 3.0,
                        count: 1,
                    },
                ],
            },
            scatter: CaseDeathScatter { groups },
        }
    }

    fn assert_rendered(written: &[PathBuf], dir: &Path) {
        let names = [LINE_CHART_FILE, BAR_CHART_FILE, HISTOGRAM_FILE, SCATTER_FILE];
        let expected: Vec<PathBuf> = names.iter().map(|name| dir.join(name)).collect();
        assert_eq!(written, expected.as_slice());
        for path in written {
            let size = std::fs::metadata(path).unwrap().len();
            assert!(size > 0, "{} is empty", path.display());
        }
    }

    #[test]
    fn test_render_all_writes_four_charts() {
        let dir = std::env::temp_dir().join("covid_tracker_render_test");
        let _ = std::fs::remove_dir_all(&dir);

        let written = StaticChartRenderer::render_all(&sample_set(), &dir, (640, 480)).unwrap();
        assert_rendered(&written, &dir);
    }

    #[test]
    fn test_empty_series_still_render() {
        let dir = std::env::temp_dir().join("covid_tracker_render_empty_test");
        let _ = std::fs::remove_dir_all(&dir);

        let written =
            StaticChartRenderer::render_all(&ChartSet::default(), &dir, (400, 300)).unwrap();
        assert_rendered(&written, &dir);
    }

    #[test]
    fn test_output_dir_failure_is_reported() {
        // A regular file cannot act as the output directory
        let file = std::env::temp_dir().join("covid_tracker_not_a_dir");
        std::fs::write(&file, b"x").unwrap();
        let result =
            StaticChartRenderer::render_all(&ChartSet::default(), &file.join("charts"), (400, 300));
        assert!(matches!(result, Err(RenderError::OutputDir { .. })));
    }
}
