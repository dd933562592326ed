//! Dataset Column Names
//! Column layout of the WHO global data CSV plus typed extraction helpers.

use chrono::NaiveDate;
use polars::prelude::*;

pub const DATE: &str = "Date_reported";
pub const COUNTRY_CODE: &str = "Country_code";
pub const COUNTRY: &str = "Country";
pub const REGION: &str = "WHO_region";
pub const NEW_CASES: &str = "New_cases";
pub const CUMULATIVE_CASES: &str = "Cumulative_cases";
pub const NEW_DEATHS: &str = "New_deaths";
pub const CUMULATIVE_DEATHS: &str = "Cumulative_deaths";

/// Region code used by the WHO feed for territories outside the six regions.
pub const OTHER_REGION: &str = "OTHER";

/// Daily delta columns.
pub const NEW_COLUMNS: [&str; 2] = [NEW_CASES, NEW_DEATHS];

/// Running total columns.
pub const CUMULATIVE_COLUMNS: [&str; 2] = [CUMULATIVE_CASES, CUMULATIVE_DEATHS];

/// All count columns in the order they are summarized.
pub const NUMERIC_COLUMNS: [&str; 4] = [NEW_CASES, NEW_DEATHS, CUMULATIVE_CASES, CUMULATIVE_DEATHS];

/// Non-null values of a numeric column as `f64`.
pub fn f64_values(df: &DataFrame, name: &str) -> PolarsResult<Vec<f64>> {
    let column = df.column(name)?.cast(&DataType::Float64)?;
    Ok(column.f64()?.into_iter().flatten().collect())
}

/// Values of a string column, nulls replaced by an empty string.
pub fn str_values(df: &DataFrame, name: &str) -> PolarsResult<Vec<String>> {
    let column = df.column(name)?;
    Ok(column
        .str()?
        .into_iter()
        .map(|v| v.unwrap_or_default().to_string())
        .collect())
}

/// Values of a `Date` column.
pub fn date_values(df: &DataFrame, name: &str) -> PolarsResult<Vec<Option<NaiveDate>>> {
    Ok(df.column(name)?.date()?.as_date_iter().collect())
}
