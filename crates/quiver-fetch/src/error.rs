//! Fetch errors.

use quiver_types::{InstrumentError, QuiverError};
use thiserror::Error;

use crate::ParseError;

/// Errors that can occur while fetching from the provider.
#[derive(Error, Debug)]
pub enum FetchError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Server returned an error status.
    #[error("Server error: {status}")]
    Status {
        /// HTTP status code.
        status: u16,
    },

    /// The request URL could not be built.
    #[error("invalid request URL: {0}")]
    InvalidUrl(String),

    /// The instrument was rejected before any request was made.
    #[error(transparent)]
    Validation(#[from] InstrumentError),

    /// The provider returned a hard error.
    #[error("provider rejected {subject}: {message}")]
    Provider {
        /// What the request was about.
        subject: String,
        /// Provider message.
        message: String,
    },

    /// The payload could not be decoded.
    #[error("{subject}: {source}")]
    Parse {
        /// What the request was about.
        subject: String,
        /// Decoding failure.
        #[source]
        source: ParseError,
    },

    /// The provider's gate was closed.
    #[error("concurrency gate for provider '{0}' is closed")]
    GateClosed(String),
}

impl From<FetchError> for QuiverError {
    fn from(err: FetchError) -> Self {
        match err {
            FetchError::Validation(e) => Self::Validation(e),
            FetchError::Provider { subject, message } => Self::Provider {
                instrument: subject,
                message,
            },
            parse @ FetchError::Parse { .. } => Self::Parse(parse.to_string()),
            other => Self::Http(other.to_string()),
        }
    }
}
