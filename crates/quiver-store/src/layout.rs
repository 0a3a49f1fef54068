//! On-disk naming of cached series.
//!
//! ```text
//! <root>/
//!   IBM/series_daily.csv
//!   IBM/info_daily.json
//!   EUR_USD/series_fx_daily.csv
//!   CRYPTO_BTC_USD/series_digital_daily.csv
//! ```

use std::path::{Path, PathBuf};

use quiver_types::{Category, Instrument, InstrumentInput, SeriesKey};

/// File name prefix of series tables.
pub const SERIES_PREFIX: &str = "series_";
/// File extension of series tables.
pub const SERIES_EXT: &str = "csv";
/// File name prefix of metadata sidecars.
pub const INFO_PREFIX: &str = "info_";
/// File extension of metadata sidecars.
pub const INFO_EXT: &str = "json";

/// Maps series keys to paths under a root directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheLayout {
    root: PathBuf,
}

impl CacheLayout {
    /// Creates a layout rooted at `root`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Returns the root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns the folder holding every series of `instrument`.
    #[must_use]
    pub fn folder(&self, instrument: &Instrument) -> PathBuf {
        self.root.join(instrument.folder_name())
    }

    /// Returns the series table path of `key`.
    #[must_use]
    pub fn series_path(&self, key: &SeriesKey) -> PathBuf {
        self.folder(&key.instrument)
            .join(format!("{SERIES_PREFIX}{}.{SERIES_EXT}", key.category))
    }

    /// Returns the metadata sidecar path of `key`.
    #[must_use]
    pub fn metadata_path(&self, key: &SeriesKey) -> PathBuf {
        self.folder(&key.instrument)
            .join(format!("{INFO_PREFIX}{}.{INFO_EXT}", key.category))
    }
}

/// Returns the category named by a series table file name.
#[must_use]
pub fn parse_series_file(file_name: &str) -> Option<Category> {
    file_name
        .strip_prefix(SERIES_PREFIX)?
        .strip_suffix(SERIES_EXT)?
        .strip_suffix('.')?
        .parse()
        .ok()
}

/// Recovers the series key from a folder name and a series file name.
///
/// Returns `None` unless the folder name is exactly what the key would
/// produce, so stray folders are skipped.
#[must_use]
pub fn parse_entry(folder: &str, file_name: &str) -> Option<SeriesKey> {
    let category = parse_series_file(file_name)?;
    let instrument =
        Instrument::resolve(&InstrumentInput::Text(folder.to_string()), category).ok()?;
    if instrument.folder_name() != folder {
        return None;
    }
    SeriesKey::new(instrument, category).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths() {
        let layout = CacheLayout::new("/data");
        let key = SeriesKey::new(Instrument::currency("EUR", "USD"), Category::FxDaily).unwrap();
        assert_eq!(
            layout.series_path(&key),
            PathBuf::from("/data/EUR_USD/series_fx_daily.csv")
        );
        assert_eq!(
            layout.metadata_path(&key),
            PathBuf::from("/data/EUR_USD/info_fx_daily.json")
        );
    }

    #[test]
    fn test_parse_entry() {
        let key = parse_entry("CRYPTO_BTC_USD", "series_digital_weekly.csv").unwrap();
        assert_eq!(key.instrument, Instrument::digital("BTC", "USD"));
        assert_eq!(key.category, Category::DigitalWeekly);

        let key = parse_entry("IBM", "series_daily-adjusted.csv").unwrap();
        assert_eq!(key.instrument, Instrument::equity("IBM"));

        assert!(parse_entry("BTC_USD", "series_digital_daily.csv").is_none());
        assert!(parse_entry("eur_usd", "series_fx_daily.csv").is_none());
        assert!(parse_entry("IBM", "info_daily.json").is_none());
        assert!(parse_entry("IBM", "series_daily.csv.tmp").is_none());
        assert!(parse_entry("..", "series_daily.csv").is_none());
    }
}
