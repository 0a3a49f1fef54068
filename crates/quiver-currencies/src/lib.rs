//! Registry of physical and digital currency codes accepted by the provider.
//!
//! The table is embedded at compile time and used to validate digital
//! currency symbols and to list the currencies the cache can hold.
//!
//! # Example
//!
//! ```
//! use quiver_currencies::CurrencyRegistry;
//!
//! let registry = CurrencyRegistry::global();
//! assert!(registry.is_digital("btc"));
//! assert!(registry.is_physical("EUR"));
//! ```

#![doc(issue_tracker_base_url = "https://github.com/quiver-rs/quiver/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

use std::collections::{BTreeMap, HashMap};
use std::sync::OnceLock;

use quiver_types::{Currency, CurrencyKind, Instrument, InstrumentError};
use serde::Deserialize;

/// The currency table embedded at compile time.
const CURRENCIES_JSON: &str = include_str!("../data/currencies.json");

/// Global currency registry instance.
static REGISTRY: OnceLock<CurrencyRegistry> = OnceLock::new();

#[derive(Deserialize)]
struct CurrencyTable {
    physical: BTreeMap<String, String>,
    digital: BTreeMap<String, String>,
}

/// Registry of known currency codes.
#[derive(Debug)]
pub struct CurrencyRegistry {
    physical: HashMap<String, Currency>,
    digital: HashMap<String, Currency>,
}

impl CurrencyRegistry {
    /// Returns the global currency registry.
    ///
    /// The registry is initialized lazily on first access.
    #[must_use]
    pub fn global() -> &'static Self {
        REGISTRY.get_or_init(Self::load)
    }

    fn load() -> Self {
        let table: CurrencyTable =
            serde_json::from_str(CURRENCIES_JSON).expect("Invalid currencies.json");
        let build = |entries: BTreeMap<String, String>, kind: CurrencyKind| {
            entries
                .into_iter()
                .map(|(code, name)| (code.clone(), Currency::new(code, name, kind)))
                .collect::<HashMap<_, _>>()
        };
        Self {
            physical: build(table.physical, CurrencyKind::Physical),
            digital: build(table.digital, CurrencyKind::Digital),
        }
    }

    /// Looks up a currency by code (case-insensitive).
    ///
    /// Digital entries take precedence when a code exists in both tables.
    #[must_use]
    pub fn get(&self, code: &str) -> Option<&Currency> {
        let code = code.to_uppercase();
        self.digital.get(&code).or_else(|| self.physical.get(&code))
    }

    /// Returns true if `code` is a known digital currency.
    #[must_use]
    pub fn is_digital(&self, code: &str) -> bool {
        self.digital.contains_key(&code.to_uppercase())
    }

    /// Returns true if `code` is a known physical currency.
    #[must_use]
    pub fn is_physical(&self, code: &str) -> bool {
        self.physical.contains_key(&code.to_uppercase())
    }

    /// Returns all digital currencies.
    pub fn digital(&self) -> impl Iterator<Item = &Currency> {
        self.digital.values()
    }

    /// Returns all physical currencies.
    pub fn physical(&self) -> impl Iterator<Item = &Currency> {
        self.physical.values()
    }

    /// Checks that a digital instrument names a registered digital currency.
    ///
    /// Other instruments pass unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`InstrumentError::UnknownDigital`] for unregistered symbols.
    pub fn check(&self, instrument: &Instrument) -> Result<(), InstrumentError> {
        match instrument {
            Instrument::Digital { symbol, .. } if !self.is_digital(symbol) => {
                Err(InstrumentError::UnknownDigital(symbol.clone()))
            }
            _ => Ok(()),
        }
    }

    /// Searches currencies by code or name (case-insensitive).
    pub fn search(&self, pattern: &str) -> Vec<&Currency> {
        let pattern = pattern.to_lowercase();
        let mut found: Vec<&Currency> = self
            .physical
            .values()
            .chain(self.digital.values())
            .filter(|c| {
                c.code().to_lowercase().contains(&pattern)
                    || c.name().to_lowercase().contains(&pattern)
            })
            .collect();
        found.sort_by(|a, b| a.code().cmp(b.code()));
        found
    }

    /// Returns the total number of currencies.
    #[must_use]
    pub fn len(&self) -> usize {
        self.physical.len() + self.digital.len()
    }

    /// Returns true if the registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.physical.is_empty() && self.digital.is_empty()
    }

    /// Returns all codes of the given kind sorted alphabetically.
    pub fn codes(&self, kind: CurrencyKind) -> Vec<&str> {
        let table = match kind {
            CurrencyKind::Physical => &self.physical,
            CurrencyKind::Digital => &self.digital,
        };
        let mut codes: Vec<&str> = table.keys().map(String::as_str).collect();
        codes.sort_unstable();
        codes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_loads() {
        let registry = CurrencyRegistry::global();
        assert!(!registry.is_empty());
        assert!(registry.digital().all(Currency::is_digital));
    }

    #[test]
    fn test_get_case_insensitive() {
        let registry = CurrencyRegistry::global();
        assert_eq!(registry.get("btc").map(Currency::code), Some("BTC"));
        assert_eq!(registry.get("Eur").map(Currency::kind), Some(CurrencyKind::Physical));
        assert!(registry.get("ZZZ").is_none());
    }

    #[test]
    fn test_check_digital_symbol() {
        let registry = CurrencyRegistry::global();
        assert!(registry.check(&Instrument::digital("BTC", "USD")).is_ok());
        assert_eq!(
            registry.check(&Instrument::digital("EUR", "USD")),
            Err(InstrumentError::UnknownDigital("EUR".into()))
        );
        assert!(registry.check(&Instrument::currency("EUR", "USD")).is_ok());
    }

    #[test]
    fn test_search_and_codes() {
        let registry = CurrencyRegistry::global();
        assert!(registry.search("dollar").iter().any(|c| c.code() == "USD"));
        let codes = registry.codes(CurrencyKind::Digital);
        assert!(codes.windows(2).all(|w| w[0] <= w[1]));
    }
}
