//! Error types for quiver.

use chrono::NaiveDate;
use thiserror::Error;

use crate::Category;

/// Result type alias for quiver operations.
pub type Result<T> = std::result::Result<T, QuiverError>;

/// Failures of a single series operation.
///
/// Every variant is scoped to one instrument; none of them aborts a batch.
#[derive(Error, Debug)]
pub enum QuiverError {
    /// The instrument does not fit the category.
    #[error("validation error: {0}")]
    Validation(#[from] InstrumentError),

    /// The provider answered with a hard error.
    #[error("provider rejected {instrument}: {message}")]
    Provider {
        /// Instrument identifier.
        instrument: String,
        /// Provider message.
        message: String,
    },

    /// The provider kept throttling past the retry limit.
    #[error("provider still throttling {instrument} after {attempts} attempts")]
    ThrottleRetryExhausted {
        /// Instrument identifier.
        instrument: String,
        /// Attempts made.
        attempts: u32,
    },

    /// The fresh rows do not overlap the cached series.
    #[error("cannot merge {key}: fresh data does not contain {date}")]
    MergeOverlapNotFound {
        /// Series identifier.
        key: String,
        /// Anchor date that was looked up.
        date: NaiveDate,
    },

    /// Reading or writing the cache failed.
    #[error("storage error: {0}")]
    Storage(String),

    /// Transport failure.
    #[error("HTTP error: {0}")]
    Http(String),

    /// The response or a cached file could not be decoded.
    #[error("parse error: {0}")]
    Parse(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Reasons an instrument cannot be used with a category.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InstrumentError {
    /// The input form is not accepted for the category.
    #[error("{form} input is not accepted for category {category}")]
    Unsupported {
        /// Target category.
        category: Category,
        /// Input form that was given.
        form: &'static str,
    },

    /// An already resolved instrument has the wrong shape.
    #[error("category {category} requires {expected}")]
    ShapeMismatch {
        /// Target category.
        category: Category,
        /// Description of the required shape.
        expected: &'static str,
    },

    /// A delimited pair could not be split.
    #[error("'{0}' is not an underscore-delimited currency pair")]
    InvalidPair(String),

    /// A list input did not have two elements.
    #[error("expected a pair, got {0} elements")]
    PairLength(usize),

    /// A mapping input lacks a required field.
    #[error("required field '{0}' not provided")]
    MissingField(&'static str),

    /// A currency code is not 3-4 ASCII letters.
    #[error("'{0}' is not a valid currency code")]
    InvalidCode(String),

    /// The digital symbol is not in the currency registry.
    #[error("'{0}' is not a known digital currency")]
    UnknownDigital(String),

    /// An equity symbol was empty.
    #[error("empty symbol")]
    EmptySymbol,

    /// An equity symbol contains characters that cannot name a cache folder.
    #[error("'{0}' is not a valid ticker symbol")]
    InvalidSymbol(String),
}

/// Error for invalid date ranges.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DateRangeError {
    /// Start date is after end date.
    #[error("Invalid date range: {start} > {end}")]
    InvalidRange {
        /// The start date.
        start: NaiveDate,
        /// The end date.
        end: NaiveDate,
    },
}
