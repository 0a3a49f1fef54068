//! When a cached series is due for a refresh.

use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime};
use quiver_types::{Category, Granularity};

/// Returns true if a series last dated `last` should be fetched again.
///
/// Nothing is due while at most `max_gap_days` whole days have passed.
/// Past that, monthly series wait for a new calendar month, weekly series
/// wait for more than seven days regardless of `max_gap_days`, and daily
/// series are always due.
#[must_use]
pub fn needs_refresh(
    last: NaiveDate,
    max_gap_days: u32,
    category: Category,
    now: NaiveDateTime,
) -> bool {
    let elapsed = (now - last.and_time(NaiveTime::MIN)).num_days();
    if elapsed <= i64::from(max_gap_days) {
        return false;
    }
    let today = now.date();
    match category.granularity() {
        Granularity::Monthly => today.month() != last.month() || today.year() != last.year(),
        Granularity::Weekly => elapsed > 7,
        Granularity::Daily => true,
    }
}
