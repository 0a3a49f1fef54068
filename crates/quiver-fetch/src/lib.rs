//! Provider access for the quiver quote cache.
//!
//! - [`ConcurrencyGate`] - per-provider bound on in-flight requests
//! - [`ProviderRequest`] - request construction from (instrument, category)
//! - [`classify`] / [`parse_series`] - response interpretation
//! - [`RetryState`] - throttle retry state machine
//! - [`Clock`] - injectable time source
//! - [`RequestExecutor`] - gated, retried execution

#![doc(issue_tracker_base_url = "https://github.com/quiver-rs/quiver/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod client;
mod clock;
mod error;
mod executor;
mod gate;
pub mod query;
mod response;
mod retry;

pub use client::{ClientConfig, DEFAULT_PROVIDER, HttpSource, QuoteSource, ScriptedSource};
pub use clock::{Clock, RecordingClock, SystemClock};
pub use error::FetchError;
pub use executor::{FetchOutcome, RequestExecutor};
pub use gate::{ConcurrencyGate, GatePermit};
pub use query::{OutputSize, ProviderRequest};
pub use response::{
    ParseError, ResponseKind, SearchMatch, SeriesPayload, THROTTLE_NOTICE, classify,
    clean_field_name, clean_keys, parse_search, parse_series,
};
pub use retry::{RetryPolicy, RetryState};
