//! Cached historical quotes and exchange rates.
//!
//! This is a facade crate that re-exports functionality from the quiver
//! workspace crates for convenient access.
//!
//! # Quick Start
//!
//! ```ignore
//! use quiver_lib::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = CacheStore::with_default_path()?;
//!     let executor = RequestExecutor::from_config(ClientConfig::default())?;
//!     let refresher = Refresher::new(executor, store.clone());
//!
//!     let key = SeriesKey::new(Instrument::currency("EUR", "USD"), Category::FxDaily)?;
//!     let report = refresher.refresh_all(vec![RefreshTask::new(key, 1)]).await;
//!     println!("{} updated", report.count(RefreshStatus::Updated));
//!
//!     let rates = RateIndex::load(&store, Granularity::Daily).await?;
//!     println!("EUR/USD {:?}", rates.latest_close("EUR", "USD"));
//!     Ok(())
//! }
//! ```

#![doc(issue_tracker_base_url = "https://github.com/quiver-rs/quiver/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Re-export core types
pub use quiver_types::*;

// Re-export currency registry
pub use quiver_currencies::CurrencyRegistry;

// Re-export the cache store
pub use quiver_store::{
    CacheLayout, CacheStore, FIRST_TIMESTAMP_KEY, MergeError, MetadataRecord, StoreError,
    TableError, merge_series,
};

// Re-export provider access
#[cfg(feature = "fetch")]
pub use quiver_fetch::{
    ClientConfig, Clock, ConcurrencyGate, FetchError, FetchOutcome, GatePermit, HttpSource,
    OutputSize, ParseError, ProviderRequest, QuoteSource, RequestExecutor, RetryPolicy,
    RetryState, SearchMatch, SeriesPayload, SystemClock,
};

// Re-export cross rates
#[cfg(feature = "fx")]
pub use quiver_fx::{RateIndex, RatePath, RateQuery, RateRow, Rates};

// Re-export refresh orchestration
#[cfg(feature = "refresh")]
pub use quiver_refresh::{
    RefreshOutcome, RefreshReport, RefreshStatus, RefreshTask, Refresher, needs_refresh,
};

/// Prelude module for convenient imports.
///
/// ```
/// use quiver_lib::prelude::*;
/// ```
pub mod prelude {
    pub use quiver_types::{
        AssetClass, Category, DateWindow, Granularity, Instrument, InstrumentInput, QuiverError,
        Result, SeriesKey, SeriesRow, TimeSeries,
    };

    pub use quiver_currencies::CurrencyRegistry;
    pub use quiver_store::{CacheStore, MetadataRecord};

    #[cfg(feature = "fetch")]
    pub use quiver_fetch::{ClientConfig, FetchOutcome, OutputSize, RequestExecutor};

    #[cfg(feature = "fx")]
    pub use quiver_fx::{RateIndex, RateQuery, Rates};

    #[cfg(feature = "refresh")]
    pub use quiver_refresh::{RefreshReport, RefreshStatus, RefreshTask, Refresher};
}
