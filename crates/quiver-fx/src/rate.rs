//! Rate rows and the arithmetic used to derive them.

use chrono::NaiveDate;
use quiver_types::{DateWindow, SeriesRow};
use serde::Serialize;
use std::cmp::Ordering;

/// One OHLC rate observation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RateRow {
    /// Observation date.
    pub date: NaiveDate,
    /// Opening rate.
    pub open: f64,
    /// Highest rate.
    pub high: f64,
    /// Lowest rate.
    pub low: f64,
    /// Closing rate.
    pub close: f64,
}

impl From<&SeriesRow> for RateRow {
    fn from(row: &SeriesRow) -> Self {
        Self {
            date: row.date,
            open: row.open,
            high: row.high,
            low: row.low,
            close: row.close,
        }
    }
}

impl RateRow {
    /// Returns the reciprocal rate.
    ///
    /// High and low trade places so that high stays the larger value.
    #[must_use]
    pub fn inverted(&self) -> Self {
        Self {
            date: self.date,
            open: 1.0 / self.open,
            high: 1.0 / self.low,
            low: 1.0 / self.high,
            close: 1.0 / self.close,
        }
    }

    fn is_finite(&self) -> bool {
        self.open.is_finite()
            && self.high.is_finite()
            && self.low.is_finite()
            && self.close.is_finite()
    }
}

/// How a rate was obtained.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum RatePath {
    /// Same currency on both sides.
    Identity,
    /// A cached digital currency pair, possibly inverted.
    Crypto {
        /// Whether the cached pair runs `to -> from`.
        inverted: bool,
    },
    /// A cached `from -> to` FX series.
    Direct,
    /// A cached `to -> from` FX series, inverted.
    Inverse,
    /// `(via -> to) / (via -> from)`.
    Triangulated {
        /// Common base currency.
        via: String,
    },
}

impl std::fmt::Display for RatePath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Identity => write!(f, "identity"),
            Self::Crypto { inverted: false } => write!(f, "digital"),
            Self::Crypto { inverted: true } => write!(f, "digital (inverted)"),
            Self::Direct => write!(f, "direct"),
            Self::Inverse => write!(f, "inverse"),
            Self::Triangulated { via } => write!(f, "via {via}"),
        }
    }
}

/// What part of a rate series to return.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateQuery {
    /// The most recent row.
    Latest,
    /// Rows inside an inclusive date window.
    Range(DateWindow),
}

/// A rate query answer.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Rates {
    /// Same currency on both sides; the rate is 1.
    Identity,
    /// The most recent row.
    Latest(RateRow),
    /// Rows inside the requested window.
    Range(Vec<RateRow>),
}

pub(crate) fn invert(rows: impl Iterator<Item = RateRow>) -> Vec<RateRow> {
    rows.map(|r| r.inverted()).filter(RateRow::is_finite).collect()
}

/// Column-wise `num / den` over the dates both sides share.
pub(crate) fn divide(num: &[RateRow], den: &[RateRow]) -> Vec<RateRow> {
    let mut out = Vec::with_capacity(num.len().min(den.len()));
    let (mut i, mut j) = (0, 0);
    while i < num.len() && j < den.len() {
        match num[i].date.cmp(&den[j].date) {
            Ordering::Less => i += 1,
            Ordering::Greater => j += 1,
            Ordering::Equal => {
                let (a, b) = (num[i], den[j]);
                let row = RateRow {
                    date: a.date,
                    open: a.open / b.open,
                    high: a.high / b.high,
                    low: a.low / b.low,
                    close: a.close / b.close,
                };
                if row.is_finite() {
                    out.push(row);
                }
                i += 1;
                j += 1;
            }
        }
    }
    out
}
