//! Tabular price series.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::DateWindow;

/// One row of a price series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesRow {
    /// Row date.
    pub date: NaiveDate,
    /// Opening price.
    pub open: f64,
    /// Highest price.
    pub high: f64,
    /// Lowest price.
    pub low: f64,
    /// Closing price.
    pub close: f64,
    /// Traded volume, absent for FX series.
    pub volume: Option<u64>,
    /// Provider-specific extra columns, aligned with [`Schema::extra`].
    pub extra: Vec<Option<f64>>,
}

impl SeriesRow {
    /// Creates a row with no volume and no extra columns.
    #[must_use]
    pub const fn new(date: NaiveDate, open: f64, high: f64, low: f64, close: f64) -> Self {
        Self {
            date,
            open,
            high,
            low,
            close,
            volume: None,
            extra: Vec::new(),
        }
    }

    /// Sets the volume.
    #[must_use]
    pub fn with_volume(mut self, volume: u64) -> Self {
        self.volume = Some(volume);
        self
    }

    /// Sets the extra column values.
    #[must_use]
    pub fn with_extra(mut self, extra: Vec<Option<f64>>) -> Self {
        self.extra = extra;
        self
    }
}

/// Column layout of a series beyond the fixed OHLC columns.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    /// Whether a volume column is present.
    pub has_volume: bool,
    /// Names of extra columns in order.
    pub extra: Vec<String>,
}

impl Schema {
    /// Schema with OHLC only.
    #[must_use]
    pub const fn ohlc() -> Self {
        Self {
            has_volume: false,
            extra: Vec::new(),
        }
    }

    /// Schema with OHLC and volume.
    #[must_use]
    pub const fn ohlcv() -> Self {
        Self {
            has_volume: true,
            extra: Vec::new(),
        }
    }

    /// Returns the full header, starting with `date`.
    #[must_use]
    pub fn header(&self) -> Vec<String> {
        let mut header: Vec<String> = ["date", "open", "high", "low", "close"]
            .iter()
            .map(|s| (*s).to_string())
            .collect();
        if self.has_volume {
            header.push("volume".to_string());
        }
        header.extend(self.extra.iter().cloned());
        header
    }
}

/// A price series with strictly increasing, unique dates.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TimeSeries {
    schema: Schema,
    rows: Vec<SeriesRow>,
}

impl TimeSeries {
    /// Creates an empty series.
    #[must_use]
    pub const fn empty(schema: Schema) -> Self {
        Self {
            schema,
            rows: Vec::new(),
        }
    }

    /// Builds a series from rows in any order.
    ///
    /// Rows are sorted by date. When a date repeats, the last row given for
    /// it wins. Extra values are padded or truncated to the schema width, and
    /// volumes are cleared when the schema has no volume column.
    #[must_use]
    pub fn from_rows(schema: Schema, rows: impl IntoIterator<Item = SeriesRow>) -> Self {
        let width = schema.extra.len();
        let by_date: BTreeMap<NaiveDate, SeriesRow> = rows
            .into_iter()
            .map(|mut row| {
                row.extra.resize(width, None);
                if !schema.has_volume {
                    row.volume = None;
                }
                (row.date, row)
            })
            .collect();
        Self {
            schema,
            rows: by_date.into_values().collect(),
        }
    }

    /// Builds a series from rows that are already strictly ascending.
    ///
    /// Returns `None` if the ordering invariant does not hold.
    #[must_use]
    pub fn from_sorted(schema: Schema, rows: Vec<SeriesRow>) -> Option<Self> {
        if rows.windows(2).any(|w| w[0].date >= w[1].date) {
            return None;
        }
        Some(Self { schema, rows })
    }

    /// Returns the column schema.
    #[must_use]
    pub const fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Returns the rows in date order.
    #[must_use]
    pub fn rows(&self) -> &[SeriesRow] {
        &self.rows
    }

    /// Consumes the series and returns its rows.
    #[must_use]
    pub fn into_rows(self) -> Vec<SeriesRow> {
        self.rows
    }

    /// Returns the number of rows.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns true if the series has no rows.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Returns the earliest date.
    #[must_use]
    pub fn first_date(&self) -> Option<NaiveDate> {
        self.rows.first().map(|r| r.date)
    }

    /// Returns the latest date.
    #[must_use]
    pub fn last_date(&self) -> Option<NaiveDate> {
        self.rows.last().map(|r| r.date)
    }

    /// Returns the most recent row.
    #[must_use]
    pub fn latest(&self) -> Option<&SeriesRow> {
        self.rows.last()
    }

    /// Returns the index of the row with the given date.
    #[must_use]
    pub fn position(&self, date: NaiveDate) -> Option<usize> {
        self.rows.binary_search_by_key(&date, |r| r.date).ok()
    }

    /// Returns the rows that fall inside `window`.
    pub fn window<'a>(
        &'a self,
        window: &'a DateWindow,
    ) -> impl Iterator<Item = &'a SeriesRow> + 'a {
        self.rows.iter().filter(move |r| window.contains(r.date))
    }

    /// Returns the series with its columns projected onto `target`.
    ///
    /// Extra columns are matched by name; columns missing from `self` become
    /// empty values.
    #[must_use]
    pub fn project(&self, target: &Schema) -> Self {
        if &self.schema == target {
            return self.clone();
        }
        let mapping: Vec<Option<usize>> = target
            .extra
            .iter()
            .map(|name| self.schema.extra.iter().position(|n| n == name))
            .collect();
        let rows = self
            .rows
            .iter()
            .map(|row| SeriesRow {
                volume: if target.has_volume { row.volume } else { None },
                extra: mapping
                    .iter()
                    .map(|idx| idx.and_then(|i| row.extra.get(i).copied().flatten()))
                    .collect(),
                ..row.clone()
            })
            .collect();
        Self {
            schema: target.clone(),
            rows,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
    }

    #[test]
    fn test_from_rows_sorts_and_dedups() {
        let series = TimeSeries::from_rows(
            Schema::ohlc(),
            vec![
                SeriesRow::new(d(3), 1.0, 1.0, 1.0, 1.0),
                SeriesRow::new(d(1), 2.0, 2.0, 2.0, 2.0),
                SeriesRow::new(d(3), 3.0, 3.0, 3.0, 3.0),
            ],
        );
        assert_eq!(series.len(), 2);
        assert_eq!(series.first_date(), Some(d(1)));
        assert!((series.latest().unwrap().close - 3.0).abs() < 1e-12);
        assert_eq!(series.position(d(3)), Some(1));
        assert_eq!(series.position(d(2)), None);
    }

    #[test]
    fn test_from_sorted_rejects_duplicates() {
        let rows = vec![
            SeriesRow::new(d(1), 1.0, 1.0, 1.0, 1.0),
            SeriesRow::new(d(1), 1.0, 1.0, 1.0, 1.0),
        ];
        assert!(TimeSeries::from_sorted(Schema::ohlc(), rows).is_none());
    }

    #[test]
    fn test_project_by_name() {
        let source = Schema {
            has_volume: true,
            extra: vec!["a".into(), "b".into()],
        };
        let target = Schema {
            has_volume: false,
            extra: vec!["b".into(), "c".into()],
        };
        let series = TimeSeries::from_rows(
            source,
            vec![
                SeriesRow::new(d(1), 1.0, 2.0, 0.5, 1.5)
                    .with_volume(10)
                    .with_extra(vec![Some(7.0), Some(8.0)]),
            ],
        );
        let projected = series.project(&target);
        let row = &projected.rows()[0];
        assert_eq!(row.volume, None);
        assert_eq!(row.extra, vec![Some(8.0), None]);
    }

    #[test]
    fn test_window_filter() {
        let series = TimeSeries::from_rows(
            Schema::ohlc(),
            (1..=5).map(|i| SeriesRow::new(d(i), 1.0, 1.0, 1.0, 1.0)),
        );
        let window = DateWindow::new(Some(d(2)), Some(d(4))).unwrap();
        assert_eq!(series.window(&window).count(), 3);
    }

    #[test]
    fn test_header() {
        let schema = Schema {
            has_volume: true,
            extra: vec!["adjusted close".into()],
        };
        assert_eq!(
            schema.header(),
            vec!["date", "open", "high", "low", "close", "volume", "adjusted close"]
        );
    }
}
