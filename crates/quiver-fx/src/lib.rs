//! Cross-rate resolution for quiver.
//!
//! [`RateIndex`] holds every cached FX and digital currency series of one
//! granularity and answers `from -> to` rate queries, either directly,
//! by inverting a cached pair, or by going through one common base
//! currency.
//!
//! ```no_run
//! # async fn demo(store: &quiver_store::CacheStore) -> quiver_store::Result<()> {
//! use quiver_fx::{RateIndex, RateQuery};
//! use quiver_types::Granularity;
//!
//! let index = RateIndex::load(store, Granularity::Daily).await?;
//! if let Some(close) = index.latest_close("GBP", "JPY") {
//!     println!("GBP/JPY {close}");
//! }
//! let _history = index.rate("BTC", "EUR", RateQuery::Range(Default::default()));
//! # Ok(())
//! # }
//! ```

#![doc(issue_tracker_base_url = "https://github.com/quiver-rs/quiver/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod index;
mod rate;

pub use index::RateIndex;
pub use rate::{RatePath, RateQuery, RateRow, Rates};
