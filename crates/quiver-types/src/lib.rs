//! Core types for the quiver quote cache.
//!
//! - [`Category`] - provider series category, carrying its endpoint, shape and granularity
//! - [`Instrument`] / [`InstrumentInput`] - canonical instruments and their loose input forms
//! - [`SeriesKey`] - address of one cached series
//! - [`TimeSeries`] - date-ordered OHLC(V) rows
//! - [`DateWindow`] - inclusive date window for range queries

#![doc(issue_tracker_base_url = "https://github.com/quiver-rs/quiver/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod category;
mod currency;
mod date_range;
mod error;
mod granularity;
mod instrument;
mod series;

pub use category::{AssetClass, Category, CategoryParseError, EndpointTemplate, InstrumentShape};
pub use currency::{Currency, CurrencyKind};
pub use date_range::DateWindow;
pub use error::{DateRangeError, InstrumentError, QuiverError, Result};
pub use granularity::{Granularity, GranularityParseError};
pub use instrument::{
    DIGITAL_FOLDER_PREFIX, Instrument, InstrumentInput, SeriesKey, currency_code, ticker_symbol,
};
pub use series::{Schema, SeriesRow, TimeSeries};
