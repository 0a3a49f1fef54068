//! Settings file loading.
//!
//! Settings are read from TOML. Every field is optional; the API key may
//! also come from `QUIVER_API_KEY`, which wins over the file.

use anyhow::{Context, Result};
use directories::ProjectDirs;
use quiver_lib::prelude::*;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable holding the provider API key.
const API_KEY_VAR: &str = "QUIVER_API_KEY";

/// Top-level settings.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct Settings {
    /// Cache directory.
    pub(crate) data_dir: Option<PathBuf>,
    /// Provider access.
    pub(crate) provider: ProviderSettings,
    /// Series refreshed by a bare `quiver refresh`.
    pub(crate) watchlist: Vec<WatchEntry>,
}

/// Provider access settings; unset fields keep the client defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct ProviderSettings {
    pub(crate) name: Option<String>,
    pub(crate) base_url: Option<String>,
    pub(crate) api_key: Option<String>,
    pub(crate) timeout_secs: Option<u64>,
    pub(crate) retry_limit: Option<u32>,
    pub(crate) cooldown_secs: Option<u64>,
    pub(crate) min_gate_hold_secs: Option<u64>,
    pub(crate) capacity: Option<usize>,
    pub(crate) output_size: Option<String>,
}

/// One watched series.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct WatchEntry {
    pub(crate) instrument: InstrumentInput,
    pub(crate) category: Category,
    #[serde(default = "default_max_gap")]
    pub(crate) max_gap_days: u32,
}

const fn default_max_gap() -> u32 {
    1
}

impl Settings {
    /// Returns the default settings path, if the platform has one.
    pub(crate) fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "quiver").map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Loads settings from `path`, or from the default path if it exists.
    ///
    /// An explicit path must exist. The API key environment variable is
    /// applied last.
    pub(crate) fn load(path: Option<&Path>) -> Result<Self> {
        let mut settings = match path {
            Some(path) => Self::read(path)?,
            None => match Self::default_path().filter(|p| p.exists()) {
                Some(path) => Self::read(&path)?,
                None => Self::default(),
            },
        };
        if let Ok(key) = std::env::var(API_KEY_VAR)
            && !key.trim().is_empty()
        {
            settings.provider.api_key = Some(key.trim().to_string());
        }
        Ok(settings)
    }

    fn read(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings: {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("Invalid settings: {}", path.display()))
    }

    fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Builds the client configuration.
    pub(crate) fn client_config(&self) -> Result<ClientConfig> {
        let p = &self.provider;
        let mut config = ClientConfig::default();
        if let Some(name) = &p.name {
            config.provider.clone_from(name);
        }
        if let Some(url) = &p.base_url {
            config.base_url.clone_from(url);
        }
        if let Some(key) = &p.api_key {
            config.api_key.clone_from(key);
        }
        if let Some(secs) = p.timeout_secs {
            config.timeout = Duration::from_secs(secs);
        }
        if let Some(limit) = p.retry_limit {
            config.retry_limit = limit;
        }
        if let Some(secs) = p.cooldown_secs {
            config.cooldown = Duration::from_secs(secs);
        }
        if let Some(secs) = p.min_gate_hold_secs {
            config.min_gate_hold = Duration::from_secs(secs);
        }
        if let Some(capacity) = p.capacity {
            config.capacity = capacity;
        }
        if let Some(size) = &p.output_size {
            config.output_size = size.parse::<OutputSize>().map_err(anyhow::Error::msg)?;
        }
        Ok(config)
    }

    /// Builds a request executor from the provider settings.
    pub(crate) fn executor(&self) -> Result<RequestExecutor> {
        RequestExecutor::from_config(self.client_config()?).context("Failed to create HTTP client")
    }

    /// Opens the cache store; `override_dir` beats the settings file.
    pub(crate) fn store(&self, override_dir: Option<PathBuf>) -> Result<CacheStore> {
        let dir = match override_dir.or_else(|| self.data_dir.clone()) {
            Some(dir) => dir,
            None => CacheStore::default_path()?,
        };
        CacheStore::new(&dir)
            .with_context(|| format!("Failed to open cache directory: {}", dir.display()))
    }

    /// Resolves the watch list into refresh tasks.
    pub(crate) fn watch_tasks(&self) -> Result<Vec<RefreshTask>> {
        self.watchlist
            .iter()
            .map(|entry| {
                let instrument = Instrument::resolve(&entry.instrument, entry.category)
                    .with_context(|| format!("Invalid watch list entry: {:?}", entry.instrument))?;
                let key = SeriesKey::new(instrument, entry.category)?;
                Ok(RefreshTask::new(key, entry.max_gap_days))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
data_dir = "/tmp/quiver"

[provider]
api_key = "secret"
retry_limit = 3
cooldown_secs = 5
output_size = "compact"

[[watchlist]]
instrument = "IBM"
category = "daily"
max_gap_days = 3

[[watchlist]]
instrument = ["EUR", "USD"]
category = "fx_daily"

[[watchlist]]
instrument = { symbol = "BTC", market = "EUR" }
category = "digital_daily"
"#;

    #[test]
    fn test_parse_settings() {
        let settings = Settings::parse(SAMPLE).unwrap();
        assert_eq!(settings.data_dir, Some(PathBuf::from("/tmp/quiver")));

        let config = settings.client_config().unwrap();
        assert_eq!(config.api_key, "secret");
        assert_eq!(config.retry_limit, 3);
        assert_eq!(config.cooldown, Duration::from_secs(5));
        assert_eq!(config.output_size, OutputSize::Compact);
        assert_eq!(config.capacity, 1);

        let tasks = settings.watch_tasks().unwrap();
        assert_eq!(tasks.len(), 3);
        assert_eq!(tasks[0].max_gap_days, 3);
        assert_eq!(tasks[1].key.instrument, Instrument::currency("EUR", "USD"));
        assert_eq!(tasks[1].max_gap_days, 1);
        assert_eq!(tasks[2].key.instrument, Instrument::digital("BTC", "EUR"));
    }

    #[test]
    fn test_empty_settings_use_defaults() {
        let settings = Settings::parse("").unwrap();
        assert!(settings.watchlist.is_empty());
        assert_eq!(settings.client_config().unwrap().retry_limit, 5);
    }

    #[test]
    fn test_watchlist_accepts_category_aliases() {
        let settings = Settings::parse(
            r#"
[[watchlist]]
instrument = "EUR_USD"
category = "fx"

[[watchlist]]
instrument = "BTC_USD"
category = "digital_fx"
"#,
        )
        .unwrap();
        let tasks = settings.watch_tasks().unwrap();
        assert_eq!(tasks[0].key.category, Category::FxDaily);
        assert_eq!(tasks[1].key.category, Category::DigitalDaily);
    }

    #[test]
    fn test_unknown_field_rejected() {
        assert!(Settings::parse("colour = \"blue\"").is_err());
    }
}
