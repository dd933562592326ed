//! Report Module
//! Derives text findings, prints the console report and exports `summary.json`.

use crate::analysis::Analysis;
use crate::data::{CleaningReport, DataProcessor};
use crate::stats::{ColumnSummary, CountrySummary, DailyTotal, RegionSummary};
use chrono::NaiveDate;
use polars::prelude::*;
use serde::Serialize;
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const SUMMARY_FILE: &str = "summary.json";

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to serialize summary: {0}")]
    Json(#[from] serde_json::Error),
}

/// Plain sentences describing what the data shows.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Findings {
    pub sentences: Vec<String>,
}

impl Findings {
    pub fn derive(
        regions: &[RegionSummary],
        countries: &[CountrySummary],
        daily: &[DailyTotal],
        correlation: Option<f64>,
    ) -> Self {
        if countries.is_empty() {
            return Self {
                sentences: vec!["No observations were available after cleaning.".to_string()],
            };
        }

        let mut sentences = Vec::new();

        if let Some(top) = max_by_key(regions, |r| r.cumulative_cases) {
            sentences.push(format!(
                "Region {} has the highest cumulative cases ({:.0}).",
                top.region, top.cumulative_cases
            ));
        }
        if let Some(top) = max_by_key(regions, |r| r.mean_new_cases) {
            sentences.push(format!(
                "Region {} has the highest mean new cases per report ({:.2}).",
                top.region, top.mean_new_cases
            ));
        }
        if let Some(top) = max_by_key(countries, |c| c.latest_cumulative_deaths) {
            sentences.push(format!(
                "{} ({}) has the most cumulative deaths ({:.0}).",
                top.country, top.region, top.latest_cumulative_deaths
            ));
        }
        if let Some(peak) = max_by_key(daily, |d| d.new_cases) {
            sentences.push(format!(
                "Global new cases peaked at {:.0} on {}.",
                peak.new_cases, peak.date
            ));
        }

        sentences.push(match correlation {
            Some(r) => format!(
                "New cases and new deaths are {} (r = {:.2}).",
                describe_correlation(r),
                r
            ),
            None => "The correlation between new cases and new deaths could not be computed."
                .to_string(),
        });

        Self { sentences }
    }
}

/// First item with the largest key.
fn max_by_key<T>(items: &[T], key: impl Fn(&T) -> f64) -> Option<&T> {
    items.iter().fold(None, |best: Option<&T>, item| match best {
        Some(b) if key(b) >= key(item) => Some(b),
        _ => Some(item),
    })
}

fn describe_correlation(r: f64) -> String {
    let strength = match r.abs() {
        a if a >= 0.7 => "strongly",
        a if a >= 0.3 => "moderately",
        _ => "weakly",
    };
    let direction = if r >= 0.0 { "positively" } else { "negatively" };
    format!("{} {} correlated", strength, direction)
}

/// Everything the run computed, as written to `summary.json`.
#[derive(Serialize)]
pub struct SummaryExport<'a> {
    pub source: String,
    pub since: Option<NaiveDate>,
    pub cleaning: &'a CleaningReport,
    pub descriptive: &'a [ColumnSummary],
    pub regions: &'a [RegionSummary],
    pub countries: &'a [CountrySummary],
    pub top_countries: &'a [CountrySummary],
    pub daily: &'a [DailyTotal],
    pub correlation: Option<f64>,
    pub findings: &'a [String],
}

impl<'a> SummaryExport<'a> {
    pub fn new(analysis: &'a Analysis, source: String, since: Option<NaiveDate>) -> Self {
        Self {
            source,
            since,
            cleaning: &analysis.cleaning,
            descriptive: &analysis.descriptive,
            regions: &analysis.regions,
            countries: &analysis.countries,
            top_countries: &analysis.top_countries,
            daily: &analysis.daily,
            correlation: analysis.correlation,
            findings: &analysis.findings.sentences,
        }
    }

    pub fn write(&self, output_dir: &Path) -> Result<PathBuf, ReportError> {
        let path = output_dir.join(SUMMARY_FILE);
        let io_err = |source| ReportError::Io {
            path: path.clone(),
            source,
        };
        std::fs::create_dir_all(output_dir).map_err(io_err)?;
        let file = File::create(&path).map_err(io_err)?;
        serde_json::to_writer_pretty(BufWriter::new(file), self)?;
        log::info!("wrote {}", path.display());
        Ok(path)
    }
}

/// Console output of the analysis.
pub struct ReportPrinter;

impl ReportPrinter {
    /// First rows, column types and missing values of the raw table.
    pub fn print_exploration(raw: &DataFrame) {
        println!("First 5 Rows of the Dataset:");
        println!("{}", raw.head(Some(5)));

        println!("\nDataset Info: {} rows x {} columns", raw.height(), raw.width());
        for column in raw.get_columns() {
            println!(
                "  {:<20} {:<10} {} non-null",
                column.name().as_str(),
                column.dtype().to_string(),
                raw.height() - column.null_count()
            );
        }

        println!("\nMissing Values:");
        for (name, nulls) in DataProcessor::null_counts(raw) {
            println!("  {:<20} {}", name, nulls);
        }
    }

    pub fn print_summary(analysis: &Analysis, since: Option<NaiveDate>) {
        let cleaning = &analysis.cleaning;
        println!(
            "\nDataset cleaned: dropped {} rows with missing core data, \
             filled numeric gaps ({:?}), clipped {} negative counts.",
            cleaning.rows_dropped, cleaning.fill, cleaning.clipped_negatives
        );
        if !cleaning.defaulted_columns.is_empty() {
            println!("Defaulted missing columns: {}", cleaning.defaulted_columns.join(", "));
        }

        let scope = since
            .map(|d| format!(" (since {})", d))
            .unwrap_or_default();

        println!("\nSummary Statistics{}:", scope);
        println!(
            "  {:<18} {:>9} {:>12} {:>12} {:>10} {:>10} {:>10} {:>10} {:>12}",
            "column", "count", "mean", "std", "min", "25%", "50%", "75%", "max"
        );
        for s in &analysis.descriptive {
            println!(
                "  {:<18} {:>9} {:>12.2} {:>12.2} {:>10.0} {:>10.2} {:>10.2} {:>10.2} {:>12.0}",
                s.column, s.count, s.mean, s.std, s.min, s.q25, s.median, s.q75, s.max
            );
        }

        println!("\nNew Cases by WHO Region{}:", scope);
        println!(
            "  {:<8} {:>9} {:>14} {:>12} {:>16} {:>16}",
            "region", "countries", "sum", "mean", "cumulative cases", "cumulative deaths"
        );
        for r in &analysis.regions {
            println!(
                "  {:<8} {:>9} {:>14.0} {:>12.2} {:>16.0} {:>16.0}",
                r.region,
                r.countries,
                r.total_new_cases,
                r.mean_new_cases,
                r.cumulative_cases,
                r.cumulative_deaths
            );
        }

        println!(
            "\nTop {} Countries by Mean Cumulative Deaths{}:",
            analysis.top_countries.len(),
            scope
        );
        for c in &analysis.top_countries {
            println!("  {:<40} {:>14.2}", c.country, c.mean_cumulative_deaths);
        }

        println!("\nFindings from Analysis:");
        for sentence in &analysis.findings.sentences {
            println!("- {}", sentence);
        }
    }

    pub fn print_charts(paths: &[PathBuf]) {
        if paths.is_empty() {
            return;
        }
        println!("\nVisualizations saved as PNG files:");
        for path in paths {
            println!("- {}", path.display());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn region(name: &str, cumulative_cases: f64, mean_new_cases: f64) -> RegionSummary {
        RegionSummary {
            region: name.to_string(),
            cumulative_cases,
            mean_new_cases,
            ..Default::default()
        }
    }

    #[test]
    fn test_findings_sentences() {
        let regions = vec![region("AMR", 500.0, 4.0), region("EUR", 900.0, 2.5)];
        let countries = vec![CountrySummary {
            country: "Brazil".to_string(),
            region: "AMR".to_string(),
            latest_cumulative_deaths: 70.0,
            ..Default::default()
        }];
        let daily = vec![
            DailyTotal {
                date: NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
                new_cases: 12.0,
                new_deaths: 0.0,
            },
            DailyTotal {
                date: NaiveDate::from_ymd_opt(2025, 3, 2).unwrap(),
                new_cases: 30.0,
                new_deaths: 1.0,
            },
        ];

        let findings = Findings::derive(&regions, &countries, &daily, Some(0.82));
        assert_eq!(
            findings.sentences,
            vec![
                "Region EUR has the highest cumulative cases (900).",
                "Region AMR has the highest mean new cases per report (4.00).",
                "Brazil (AMR) has the most cumulative deaths (70).",
                "Global new cases peaked at 30 on 2025-03-02.",
                "New cases and new deaths are strongly positively correlated (r = 0.82).",
            ]
        );
    }

    #[test]
    fn test_findings_empty() {
        let findings = Findings::derive(&[], &[], &[], None);
        assert_eq!(findings.sentences.len(), 1);
        assert!(findings.sentences[0].starts_with("No observations"));
    }

    #[test]
    fn test_max_by_key_prefers_first_on_ties() {
        let regions = vec![region("AFR", 5.0, 0.0), region("SEAR", 5.0, 0.0)];
        let top = max_by_key(&regions, |r| r.cumulative_cases).unwrap();
        assert_eq!(top.region, "AFR");
    }

    #[test]
    fn test_describe_correlation() {
        assert_eq!(describe_correlation(-0.5), "moderately negatively correlated");
        assert_eq!(describe_correlation(0.1), "weakly positively correlated");
    }
}
