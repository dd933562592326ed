//! CSV Data Loader Module
//! Fetches the dataset (remote URL or local file) and parses it using Polars.

use crate::data::columns::NUMERIC_COLUMNS;
use polars::prelude::*;
use std::fmt;
use std::io::Cursor;
use std::path::PathBuf;
use thiserror::Error;

/// Public WHO daily global data feed.
pub const WHO_DATA_URL: &str = "https://covid19.who.int/WHO-COVID-19-global-data.csv";

#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("Failed to download dataset: {0}")]
    FetchError(#[from] reqwest::Error),
    #[error("Failed to read {path}: {source}")]
    FileError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to load CSV: {0}")]
    CsvError(#[from] PolarsError),
    #[error("No data loaded")]
    NoData,
}

/// Where the dataset comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataSource {
    Url(String),
    File(PathBuf),
}

impl DataSource {
    /// `http://` and `https://` values are URLs, anything else is a path.
    pub fn parse(value: &str) -> Self {
        if value.starts_with("http://") || value.starts_with("https://") {
            DataSource::Url(value.to_string())
        } else {
            DataSource::File(PathBuf::from(value))
        }
    }
}

impl Default for DataSource {
    fn default() -> Self {
        DataSource::Url(WHO_DATA_URL.to_string())
    }
}

impl fmt::Display for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataSource::Url(url) => write!(f, "{}", url),
            DataSource::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Handles dataset loading with Polars.
pub struct DataLoader {
    df: Option<DataFrame>,
    source: Option<DataSource>,
}

impl Default for DataLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl DataLoader {
    pub fn new() -> Self {
        Self {
            df: None,
            source: None,
        }
    }

    /// Load the dataset from a URL or a local file.
    pub fn load(&mut self, source: &DataSource) -> Result<&DataFrame, LoaderError> {
        self.source = Some(source.clone());

        let bytes = match source {
            DataSource::Url(url) => Self::fetch(url)?,
            DataSource::File(path) => std::fs::read(path).map_err(|source| LoaderError::FileError {
                path: path.clone(),
                source,
            })?,
        };
        log::debug!("read {} bytes from {}", bytes.len(), source);

        let df = Self::parse_csv(bytes)?;
        log::info!("loaded {} rows x {} columns", df.height(), df.width());

        self.df = Some(df);
        self.df.as_ref().ok_or(LoaderError::NoData)
    }

    /// Blocking GET; a non-success status is an error.
    fn fetch(url: &str) -> Result<Vec<u8>, LoaderError> {
        log::info!("downloading {}", url);
        let response = reqwest::blocking::get(url)?.error_for_status()?;
        Ok(response.bytes()?.to_vec())
    }

    /// Parse CSV text held in memory. Malformed cells become null.
    ///
    /// Count columns are read as `Float64` whatever schema inference
    /// decided, so a stray word in a count cell nulls that cell instead of
    /// turning the whole column into text.
    pub fn parse_csv(bytes: Vec<u8>) -> Result<DataFrame, LoaderError> {
        let df = CsvReadOptions::default()
            .with_has_header(true)
            .with_infer_schema_length(Some(10000))
            .with_ignore_errors(true)
            .into_reader_with_file_handle(Cursor::new(bytes))
            .finish()?;

        let counts: Vec<Expr> = NUMERIC_COLUMNS
            .iter()
            .filter(|name| df.get_column_index(name).is_some())
            .map(|name| col(*name).cast(DataType::Float64))
            .collect();
        if counts.is_empty() {
            return Ok(df);
        }
        Ok(df.lazy().with_columns(counts).collect()?)
    }

    /// Get list of column names from loaded DataFrame.
    pub fn get_columns(&self) -> Vec<String> {
        self.df
            .as_ref()
            .map(|df| {
                df.get_column_names()
                    .iter()
                    .map(|s| s.to_string())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Get list of numeric column names.
    pub fn get_numeric_columns(&self) -> Vec<String> {
        let Some(df) = &self.df else {
            return Vec::new();
        };

        df.get_columns()
            .iter()
            .filter(|col| {
                matches!(
                    col.dtype(),
                    DataType::Float32
                        | DataType::Float64
                        | DataType::Int8
                        | DataType::Int16
                        | DataType::Int32
                        | DataType::Int64
                        | DataType::UInt8
                        | DataType::UInt16
                        | DataType::UInt32
                        | DataType::UInt64
                )
            })
            .map(|col| col.name().to_string())
            .collect()
    }

    /// Get the number of rows in the DataFrame.
    pub fn get_row_count(&self) -> usize {
        self.df.as_ref().map(|df| df.height()).unwrap_or(0)
    }

    /// Hand the loaded DataFrame over to the cleaning stage.
    pub fn take_dataframe(&mut self) -> Result<DataFrame, LoaderError> {
        self.df.take().ok_or(LoaderError::NoData)
    }

    pub fn get_source(&self) -> Option<&DataSource> {
        self.source.as_ref()
    }
}
