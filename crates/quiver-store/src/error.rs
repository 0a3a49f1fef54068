//! Cache store errors.

use std::path::PathBuf;

use chrono::NaiveDate;
use quiver_types::QuiverError;
use thiserror::Error;

/// Errors raised while decoding or encoding a series table.
#[derive(Error, Debug)]
pub enum TableError {
    /// The CSV layer failed.
    #[error("CSV error: {0}")]
    Csv(#[from] csv_async::Error),

    /// Flushing the underlying writer failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The header lacks a required column.
    #[error("missing column '{0}'")]
    MissingColumn(&'static str),

    /// A date cell could not be parsed.
    #[error("line {line}: invalid date '{value}'")]
    InvalidDate {
        /// 1-based line number.
        line: u64,
        /// Offending cell.
        value: String,
    },

    /// A numeric cell could not be parsed.
    #[error("line {line}: column '{column}' is not numeric: '{value}'")]
    InvalidNumber {
        /// 1-based line number.
        line: u64,
        /// Column name.
        column: String,
        /// Offending cell.
        value: String,
    },
}

/// Errors raised by the merge algorithm.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MergeError {
    /// The fresh rows do not contain the existing series' anchor date.
    #[error("fresh data does not contain overlap date {0}")]
    OverlapNotFound(NaiveDate),
}

/// Errors that can occur during cache operations.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Failed to determine the application data directory.
    #[error("Failed to determine application data directory")]
    NoDataDir,

    /// Failed to create a directory.
    #[error("Failed to create directory '{path}': {source}")]
    CreateDir {
        /// The path that could not be created.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// Failed to read a file.
    #[error("Failed to read file '{path}': {source}")]
    ReadFile {
        /// The path that could not be read.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// Failed to write a file.
    #[error("Failed to write file '{path}': {source}")]
    WriteFile {
        /// The path that could not be written.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// Failed to read a directory.
    #[error("Failed to read directory '{path}': {source}")]
    ReadDir {
        /// The path that could not be read.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// A series table is malformed.
    #[error("Malformed series file '{path}': {source}")]
    Table {
        /// The offending file.
        path: PathBuf,
        /// The decoding error.
        source: TableError,
    },

    /// A metadata sidecar is malformed.
    #[error("Failed to parse metadata file '{path}': {source}")]
    ParseJson {
        /// The offending file.
        path: PathBuf,
        /// The underlying JSON error.
        source: serde_json::Error,
    },

    /// Failed to serialize JSON.
    #[error("Failed to serialize metadata: {0}")]
    SerializeJson(#[from] serde_json::Error),

    /// The merge was rejected; nothing was written.
    #[error("Cannot merge into '{path}': {source}")]
    Merge {
        /// The series file that was left untouched.
        path: PathBuf,
        /// The merge failure.
        source: MergeError,
    },
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

impl From<StoreError> for QuiverError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Merge {
                path,
                source: MergeError::OverlapNotFound(date),
            } => Self::MergeOverlapNotFound {
                key: path.display().to_string(),
                date,
            },
            other => Self::Storage(other.to_string()),
        }
    }
}
