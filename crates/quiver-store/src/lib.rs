//! On-disk cache of price series for quiver.
//!
//! Each series lives in `<root>/<folder>/series_<category>.csv` with a JSON
//! sidecar `info_<category>.json`. See [`CacheStore`] for the operations and
//! [`merge_series`] for how fresh rows are folded into a cached series.

#![doc(issue_tracker_base_url = "https://github.com/quiver-rs/quiver/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod error;
pub mod layout;
mod merge;
mod metadata;
mod store;
mod table;

pub use error::{MergeError, Result, StoreError, TableError};
pub use layout::CacheLayout;
pub use merge::{PROVISIONAL_ROWS, merge_series};
pub use metadata::{FIRST_TIMESTAMP_KEY, MetadataRecord, TIMESTAMP_FORMAT};
pub use store::CacheStore;
pub use table::{read_table, write_table};
