//! Structural errors that abort a run
//!
//! Mapping problems and bad rows are not errors in this sense: they are
//! accumulated as `ValidationIssue`s so one bad row never stops the rest.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    /// Input had no bytes (or only whitespace/BOM)
    #[error("input file is empty")]
    EmptyInput,

    /// First record could not be read as a header row
    #[error("no header row found")]
    MissingHeader,

    /// Header row present but nothing after it
    #[error("file contains a header row but no data rows")]
    NoDataRows,

    /// Headers did not resemble any known carrier export
    #[error("could not classify columns as a known schema: {columns:?}")]
    UnknownSchema { columns: Vec<String> },

    /// Invalid configuration value
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Exported claim file could not be read back
    #[error("row {row}, field '{field}': cannot parse '{value}'")]
    MalformedExport {
        row: usize,
        field: String,
        value: String,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, EngineError>;
