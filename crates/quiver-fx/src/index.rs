//! In-memory index of cached currency series.

use std::collections::BTreeMap;
use std::sync::Arc;

use quiver_store::CacheStore;
use quiver_types::{AssetClass, Granularity, Instrument, TimeSeries};
use tracing::{debug, warn};

use crate::rate::{RatePath, RateQuery, RateRow, Rates, divide, invert};

type PairMap = BTreeMap<String, BTreeMap<String, Arc<TimeSeries>>>;

/// Cached FX and digital series of one granularity, keyed `base -> quote`.
///
/// Lookup order for `from -> to`:
///
/// 1. identical codes give a rate of 1;
/// 2. a digital pair in either direction;
/// 3. a direct FX pair, then its inverse;
/// 4. `(k -> to) / (k -> from)` for the first base `k` (in code order)
///    that has both legs cached.
///
/// Only one intermediate hop is tried.
#[derive(Debug, Clone, Default)]
pub struct RateIndex {
    granularity: Granularity,
    fx: PairMap,
    crypto: PairMap,
}

impl RateIndex {
    /// Creates an empty index.
    #[must_use]
    pub fn new(granularity: Granularity) -> Self {
        Self {
            granularity,
            ..Self::default()
        }
    }

    /// Loads every cached FX and digital series of `granularity`.
    ///
    /// Series that fail to load are logged and left out.
    ///
    /// # Errors
    ///
    /// Returns an error if the cache directory cannot be listed.
    pub async fn load(store: &CacheStore, granularity: Granularity) -> quiver_store::Result<Self> {
        let mut index = Self::new(granularity);
        index.reload(store).await?;
        Ok(index)
    }

    /// Drops the current contents and reloads from `store`.
    ///
    /// # Errors
    ///
    /// Returns an error if the cache directory cannot be listed.
    pub async fn reload(&mut self, store: &CacheStore) -> quiver_store::Result<()> {
        self.fx.clear();
        self.crypto.clear();
        let keys = store.list_series().await?;
        for key in keys {
            if key.granularity() != self.granularity
                || key.category.asset_class() == AssetClass::Equity
            {
                continue;
            }
            match store.read_series(&key).await {
                Ok(Some(series)) => {
                    self.insert(&key.instrument, series);
                }
                Ok(None) => {}
                Err(e) => warn!(key = %key, error = %e, "skipping unreadable series"),
            }
        }
        debug!(granularity = %self.granularity, pairs = self.len(), "rate index loaded");
        Ok(())
    }

    /// Adds a series; returns false for equities, which are not rates.
    pub fn insert(&mut self, instrument: &Instrument, series: TimeSeries) -> bool {
        let (map, base, quote) = match instrument {
            Instrument::Currency { from, to } => (&mut self.fx, from, to),
            Instrument::Digital { symbol, market } => (&mut self.crypto, symbol, market),
            Instrument::Equity { .. } => return false,
        };
        map.entry(base.clone())
            .or_default()
            .insert(quote.clone(), Arc::new(series));
        true
    }

    /// Returns the granularity of the indexed series.
    #[must_use]
    pub const fn granularity(&self) -> Granularity {
        self.granularity
    }

    /// Returns the number of indexed pairs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fx.values().chain(self.crypto.values()).map(BTreeMap::len).sum()
    }

    /// Returns true if nothing is indexed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Lists indexed pairs as `(class, base, quote)`.
    #[must_use]
    pub fn pairs(&self) -> Vec<(AssetClass, &str, &str)> {
        let fx = self.fx.iter().map(|entry| (AssetClass::Fx, entry));
        let crypto = self.crypto.iter().map(|entry| (AssetClass::Digital, entry));
        fx.chain(crypto)
            .flat_map(|(class, (base, quotes))| {
                quotes.keys().map(move |quote| (class, base.as_str(), quote.as_str()))
            })
            .collect()
    }

    fn pair(map: &PairMap, base: &str, quote: &str) -> Option<Arc<TimeSeries>> {
        map.get(base).and_then(|q| q.get(quote)).cloned()
    }

    fn via(&self, from: &str, to: &str) -> Option<String> {
        self.fx
            .iter()
            .find(|(_, quotes)| quotes.contains_key(from) && quotes.contains_key(to))
            .map(|(base, _)| base.clone())
    }

    /// Returns how `from -> to` would be resolved.
    #[must_use]
    pub fn path(&self, from: &str, to: &str) -> Option<RatePath> {
        let (from, to) = (from.to_uppercase(), to.to_uppercase());
        if from == to {
            return Some(RatePath::Identity);
        }
        if Self::pair(&self.crypto, &from, &to).is_some() {
            return Some(RatePath::Crypto { inverted: false });
        }
        if Self::pair(&self.crypto, &to, &from).is_some() {
            return Some(RatePath::Crypto { inverted: true });
        }
        if Self::pair(&self.fx, &from, &to).is_some() {
            return Some(RatePath::Direct);
        }
        if Self::pair(&self.fx, &to, &from).is_some() {
            return Some(RatePath::Inverse);
        }
        self.via(&from, &to).map(|via| RatePath::Triangulated { via })
    }

    /// Returns the full derived rate series for `from -> to`.
    ///
    /// Identity has no series and yields `None`, as do unresolvable pairs.
    #[must_use]
    pub fn series(&self, from: &str, to: &str) -> Option<Vec<RateRow>> {
        let (from, to) = (from.to_uppercase(), to.to_uppercase());
        let rows = |s: &TimeSeries| s.rows().iter().map(RateRow::from).collect::<Vec<_>>();
        let inverted = |s: &TimeSeries| invert(s.rows().iter().map(RateRow::from));
        match self.path(&from, &to)? {
            RatePath::Identity => None,
            RatePath::Crypto { inverted: false } => {
                Self::pair(&self.crypto, &from, &to).map(|s| rows(&*s))
            }
            RatePath::Crypto { inverted: true } => {
                Self::pair(&self.crypto, &to, &from).map(|s| inverted(&*s))
            }
            RatePath::Direct => Self::pair(&self.fx, &from, &to).map(|s| rows(&*s)),
            RatePath::Inverse => Self::pair(&self.fx, &to, &from).map(|s| inverted(&*s)),
            RatePath::Triangulated { via } => {
                let num = Self::pair(&self.fx, &via, &to)?;
                let den = Self::pair(&self.fx, &via, &from)?;
                Some(divide(&rows(&*num), &rows(&*den)))
            }
        }
    }

    /// Answers a rate query for `from -> to`.
    ///
    /// Returns `None` if the pair cannot be resolved from the index, or if
    /// a latest-row query hits an empty series.
    #[must_use]
    pub fn rate(&self, from: &str, to: &str, query: RateQuery) -> Option<Rates> {
        if from.eq_ignore_ascii_case(to) {
            return Some(Rates::Identity);
        }
        let rows = self.series(from, to)?;
        match query {
            RateQuery::Latest => rows.last().copied().map(Rates::Latest),
            RateQuery::Range(window) => Some(Rates::Range(
                rows.into_iter().filter(|r| window.contains(r.date)).collect(),
            )),
        }
    }

    /// Returns the latest closing rate, 1.0 for identical codes.
    #[must_use]
    pub fn latest_close(&self, from: &str, to: &str) -> Option<f64> {
        match self.rate(from, to, RateQuery::Latest)? {
            Rates::Identity => Some(1.0),
            Rates::Latest(row) => Some(row.close),
            Rates::Range(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::NaiveDate;
    use quiver_types::{Category, DateWindow, Schema, SeriesKey, SeriesRow};
    use tempfile::TempDir;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, day).unwrap()
    }

    fn flat(days: impl IntoIterator<Item = u32>, close: f64) -> TimeSeries {
        TimeSeries::from_rows(
            Schema::ohlc(),
            days.into_iter()
                .map(|day| SeriesRow::new(d(day), close, close * 1.01, close * 0.99, close)),
        )
    }

    fn sample() -> RateIndex {
        let mut index = RateIndex::new(Granularity::Daily);
        index.insert(&Instrument::currency("USD", "EUR"), flat(1..=5, 0.9));
        index.insert(&Instrument::currency("USD", "JPY"), flat(2..=6, 150.0));
        index.insert(&Instrument::currency("EUR", "GBP"), flat(1..=5, 0.85));
        index.insert(&Instrument::digital("BTC", "USD"), flat(1..=3, 60_000.0));
        index
    }

    #[test]
    fn test_identity() {
        let index = RateIndex::new(Granularity::Daily);
        assert_eq!(index.path("usd", "USD"), Some(RatePath::Identity));
        assert_eq!(index.latest_close("USD", "USD"), Some(1.0));
        assert_eq!(
            index.rate("EUR", "EUR", RateQuery::Range(DateWindow::unbounded())),
            Some(Rates::Identity)
        );
    }

    #[test]
    fn test_direct_and_inverse() {
        let index = sample();
        assert_eq!(index.path("USD", "EUR"), Some(RatePath::Direct));
        assert_eq!(index.path("EUR", "USD"), Some(RatePath::Inverse));
        let forward = index.latest_close("USD", "EUR").unwrap();
        let back = index.latest_close("eur", "usd").unwrap();
        assert_relative_eq!(forward, 0.9);
        assert_relative_eq!(back, 1.0 / forward);
    }

    #[test]
    fn test_triangulated() {
        let index = sample();
        assert_eq!(
            index.path("EUR", "JPY"),
            Some(RatePath::Triangulated { via: "USD".into() })
        );
        let rows = index.series("EUR", "JPY").unwrap();
        // Only days both legs share.
        assert_eq!(rows.first().map(|r| r.date), Some(d(2)));
        assert_eq!(rows.len(), 4);
        assert_relative_eq!(rows[0].close, 150.0 / 0.9, max_relative = 1e-12);
        let back = index.latest_close("JPY", "EUR").unwrap();
        assert_relative_eq!(back, 0.9 / 150.0, max_relative = 1e-12);
    }

    #[test]
    fn test_crypto_both_directions() {
        let index = sample();
        assert_eq!(index.path("BTC", "USD"), Some(RatePath::Crypto { inverted: false }));
        assert_eq!(index.path("USD", "BTC"), Some(RatePath::Crypto { inverted: true }));
        assert_relative_eq!(index.latest_close("USD", "BTC").unwrap(), 1.0 / 60_000.0);
    }

    #[test]
    fn test_pairs_listing() {
        let index = sample();
        assert_eq!(index.len(), 4);
        let pairs = index.pairs();
        assert_eq!(pairs[0], (AssetClass::Fx, "EUR", "GBP"));
        assert_eq!(pairs[3], (AssetClass::Digital, "BTC", "USD"));
    }

    #[test]
    fn test_unresolvable() {
        let index = sample();
        assert_eq!(index.path("GBP", "JPY"), None);
        assert_eq!(index.latest_close("CHF", "USD"), None);
    }

    #[test]
    fn test_range_is_inclusive() {
        let index = sample();
        let window = DateWindow::new(Some(d(2)), Some(d(4))).unwrap();
        match index.rate("USD", "EUR", RateQuery::Range(window)) {
            Some(Rates::Range(rows)) => assert_eq!(rows.len(), 3),
            other => panic!("unexpected answer: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_load_filters_granularity() {
        let dir = TempDir::new().unwrap();
        let store = CacheStore::new(dir.path()).unwrap();
        let daily = SeriesKey::new(Instrument::currency("USD", "EUR"), Category::FxDaily).unwrap();
        let weekly =
            SeriesKey::new(Instrument::currency("USD", "JPY"), Category::FxWeekly).unwrap();
        let equity = SeriesKey::new(Instrument::equity("IBM"), Category::Daily).unwrap();
        store.write_series(&daily, &flat(1..=3, 0.9)).await.unwrap();
        store.write_series(&weekly, &flat(1..=3, 150.0)).await.unwrap();
        store.write_series(&equity, &flat(1..=3, 180.0)).await.unwrap();

        let index = RateIndex::load(&store, Granularity::Daily).await.unwrap();
        assert_eq!(index.len(), 1);
        assert_eq!(index.path("USD", "EUR"), Some(RatePath::Direct));
        assert_eq!(index.path("USD", "JPY"), None);
    }
}
