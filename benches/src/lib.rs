//! Synthetic data for quiver benchmarks.

use chrono::{Days, NaiveDate};
use quiver_fx::RateIndex;
use quiver_types::{Granularity, Instrument, Schema, SeriesRow, TimeSeries};

/// First date of every generated series.
pub fn epoch() -> NaiveDate {
    NaiveDate::from_ymd_opt(2000, 1, 3).unwrap_or_default()
}

/// A daily OHLCV series of `len` rows starting `offset` days after [`epoch`].
///
/// Prices follow a deterministic saw-tooth around `level`.
pub fn series(len: usize, offset: u64, level: f64) -> TimeSeries {
    let rows = (0..len).map(|i| {
        let date = epoch() + Days::new(offset + i as u64);
        let wiggle = ((i % 17) as f64 - 8.0) / 400.0;
        let close = level * (1.0 + wiggle);
        SeriesRow::new(date, close, close * 1.002, close * 0.998, close)
            .with_volume(1_000 + i as u64)
    });
    TimeSeries::from_rows(Schema::ohlcv(), rows)
}

/// A cached series of `len` rows and a compact fetch overlapping its last
/// `overlap` rows and extending `ahead` rows further.
pub fn merge_inputs(len: usize, overlap: usize, ahead: usize) -> (TimeSeries, TimeSeries) {
    let existing = series(len, 0, 100.0);
    let fresh = series(overlap + ahead, (len - overlap) as u64, 101.0);
    (existing, fresh)
}

/// A rate index of `quotes` USD-based pairs with `len` daily rows each.
pub fn rate_index(quotes: &[&str], len: usize) -> RateIndex {
    let mut index = RateIndex::new(Granularity::Daily);
    for (i, quote) in quotes.iter().enumerate() {
        let level = 0.5 + i as f64;
        index.insert(&Instrument::currency("USD", *quote), series(len, 0, level));
    }
    index
}
