//! Incremental merge of fresh rows into a cached series.

use quiver_types::TimeSeries;

use crate::MergeError;

/// Number of trailing cached rows treated as provisional.
pub const PROVISIONAL_ROWS: usize = 2;

/// Merges `fresh` into `existing`.
///
/// The last [`PROVISIONAL_ROWS`] cached rows may describe an unfinished
/// period, so they are replaced by the fresh data. The fresh rows must
/// contain the date of the first provisional row; the result is the cached
/// rows before it followed by the fresh rows from that date on. Fresh
/// columns are projected onto the cached schema.
///
/// A cached series shorter than two rows carries nothing confirmed and is
/// replaced by `fresh`.
///
/// # Errors
///
/// Returns [`MergeError::OverlapNotFound`] if the fresh rows do not contain
/// the anchor date. Nothing is merged in that case.
pub fn merge_series(existing: &TimeSeries, fresh: &TimeSeries) -> Result<TimeSeries, MergeError> {
    let n = existing.len();
    if n < PROVISIONAL_ROWS {
        return Ok(fresh.clone());
    }
    let kept = n - PROVISIONAL_ROWS;
    let anchor = existing.rows()[kept].date;
    let start = fresh
        .position(anchor)
        .ok_or(MergeError::OverlapNotFound(anchor))?;

    let projected = fresh.project(existing.schema());
    let rows = existing.rows()[..kept]
        .iter()
        .cloned()
        .chain(projected.into_rows().into_iter().skip(start));
    Ok(TimeSeries::from_rows(existing.schema().clone(), rows))
}
