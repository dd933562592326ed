//! Data module - Dataset loading and cleaning

pub mod columns;
mod loader;
mod processor;

pub use loader::{DataLoader, DataSource, LoaderError, WHO_DATA_URL};
pub use processor::{CleaningOptions, CleaningReport, DataProcessor, FillStrategy, ProcessorError};
