//! Data Processor Module
//! Handles data cleaning: type coercion, malformed-row removal and missing-value fill.

use crate::data::columns::{
    self, COUNTRY, CUMULATIVE_COLUMNS, DATE, NEW_COLUMNS, NUMERIC_COLUMNS, OTHER_REGION, REGION,
};
use chrono::NaiveDate;
use polars::prelude::*;
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProcessorError {
    #[error("Polars error: {0}")]
    PolarsError(#[from] PolarsError),
    #[error("Required column '{0}' is missing")]
    MissingColumn(String),
}

/// How missing numeric values are filled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum FillStrategy {
    /// Every missing count becomes zero
    #[default]
    Zero,
    /// Cumulative counts carry the last known value of the same country, then zero
    ForwardFill,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CleaningOptions {
    pub fill: FillStrategy,
}

/// What cleaning did to the table.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CleaningReport {
    pub rows_before: usize,
    pub rows_after: usize,
    pub rows_dropped: usize,
    pub nulls_before: Vec<(String, usize)>,
    pub defaulted_columns: Vec<String>,
    pub clipped_negatives: usize,
    pub fill: FillStrategy,
}

/// Handles data cleaning and transformation operations.
pub struct DataProcessor;

impl DataProcessor {
    /// Clean a raw observations table.
    ///
    /// Rows without a parseable date or a country are dropped, numeric
    /// columns become `Float64` with no nulls, negative daily counts are
    /// clipped to zero and the result is ordered by (country, date).
    pub fn clean(
        df: &DataFrame,
        options: &CleaningOptions,
    ) -> Result<(DataFrame, CleaningReport), ProcessorError> {
        for required in [DATE, COUNTRY] {
            if df.column(required).is_err() {
                return Err(ProcessorError::MissingColumn(required.to_string()));
            }
        }

        let mut report = CleaningReport {
            rows_before: df.height(),
            nulls_before: Self::null_counts(df),
            fill: options.fill,
            ..Default::default()
        };

        let mut df = df.clone();
        let height = df.height();
        if df.column(REGION).is_err() {
            log::warn!("column {} missing, defaulting to {}", REGION, OTHER_REGION);
            df.with_column(Series::new(REGION.into(), vec![OTHER_REGION; height]))?;
            report.defaulted_columns.push(REGION.to_string());
        }
        for name in NUMERIC_COLUMNS {
            if df.column(name).is_err() {
                log::warn!("column {} missing, defaulting to zero", name);
                df.with_column(Series::new(name.into(), vec![0.0f64; height]))?;
                report.defaulted_columns.push(name.to_string());
            }
        }

        let date_options = StrptimeOptions {
            format: Some("%Y-%m-%d".into()),
            strict: false,
            ..Default::default()
        };
        let mut coercions = vec![
            col(DATE)
                .cast(DataType::String)
                .str()
                .to_date(date_options),
            col(COUNTRY).cast(DataType::String),
            col(REGION).cast(DataType::String).fill_null(lit(OTHER_REGION)),
        ];
        coercions.extend(NUMERIC_COLUMNS.iter().map(|c| col(*c).cast(DataType::Float64)));

        let mut df = df
            .lazy()
            .with_columns(coercions)
            .filter(
                col(DATE)
                    .is_not_null()
                    .and(col(COUNTRY).is_not_null())
                    .and(col(COUNTRY).neq(lit(""))),
            )
            .sort([COUNTRY, DATE], SortMultipleOptions::default())
            .collect()?;

        report.rows_after = df.height();
        report.rows_dropped = report.rows_before - report.rows_after;
        if report.rows_dropped > 0 {
            log::warn!(
                "dropped {} rows with a missing or malformed date/country",
                report.rows_dropped
            );
        }

        if options.fill == FillStrategy::ForwardFill {
            for name in CUMULATIVE_COLUMNS {
                Self::forward_fill_by_country(&mut df, name)?;
            }
        }

        for name in NEW_COLUMNS {
            report.clipped_negatives += columns::f64_values(&df, name)?
                .iter()
                .filter(|v| **v < 0.0)
                .count();
        }

        let mut fills: Vec<Expr> = CUMULATIVE_COLUMNS
            .iter()
            .map(|c| col(*c).fill_null(lit(0.0)))
            .collect();
        fills.extend(NEW_COLUMNS.iter().map(|c| {
            let filled = col(*c).fill_null(lit(0.0));
            when(filled.clone().lt(lit(0.0)))
                .then(lit(0.0))
                .otherwise(filled)
                .alias(*c)
        }));

        let df = df.lazy().with_columns(fills).collect()?;

        log::info!(
            "cleaned dataset: {} -> {} rows ({:?} fill, {} negatives clipped)",
            report.rows_before,
            report.rows_after,
            report.fill,
            report.clipped_negatives
        );

        Ok((df, report))
    }

    /// Carry the last known value forward within each country.
    /// Expects rows ordered by (country, date).
    fn forward_fill_by_country(df: &mut DataFrame, name: &str) -> Result<(), ProcessorError> {
        let countries = columns::str_values(df, COUNTRY)?;
        let values: Vec<Option<f64>> = df.column(name)?.f64()?.into_iter().collect();

        let mut filled: Vec<Option<f64>> = Vec::with_capacity(values.len());
        let mut last: Option<(&str, f64)> = None;
        for (country, value) in countries.iter().zip(values) {
            let carried = match (value, last) {
                (Some(v), _) => Some(v),
                (None, Some((prev, v))) if prev == country.as_str() => Some(v),
                _ => None,
            };
            last = carried.map(|v| (country.as_str(), v));
            filled.push(carried);
        }

        df.with_column(Series::new(name.into(), filled))?;
        Ok(())
    }

    /// Keep observations reported on or after `since`.
    pub fn filter_since(df: &DataFrame, since: NaiveDate) -> Result<DataFrame, ProcessorError> {
        let filtered = df
            .clone()
            .lazy()
            .filter(col(DATE).gt_eq(lit(since)))
            .collect()?;
        Ok(filtered)
    }

    /// Missing-value count per column.
    pub fn null_counts(df: &DataFrame) -> Vec<(String, usize)> {
        df.get_columns()
            .iter()
            .map(|c| (c.name().to_string(), c.null_count()))
            .collect()
    }
}
