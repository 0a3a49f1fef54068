//! Refreshing the quiver cache.
//!
//! [`needs_refresh`] decides whether a cached series is stale, and
//! [`Refresher`] runs the fetch, merge, persist and metadata steps for one
//! series or a whole batch, returning a [`RefreshReport`] with one
//! [`RefreshOutcome`] per series.

#![doc(issue_tracker_base_url = "https://github.com/quiver-rs/quiver/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod refresher;
mod report;
mod staleness;

pub use refresher::{DEFAULT_BATCH_CONCURRENCY, Refresher};
pub use report::{BatchId, RefreshOutcome, RefreshReport, RefreshStatus, RefreshTask};
pub use staleness::needs_refresh;
