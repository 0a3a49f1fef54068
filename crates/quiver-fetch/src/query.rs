//! Provider request construction.

use std::str::FromStr;

use quiver_types::{Category, Instrument, InstrumentError};
use reqwest::Url;
use serde::{Deserialize, Serialize};

use crate::FetchError;

/// Default provider endpoint.
pub const BASE_URL: &str = "https://www.alphavantage.co/query";

/// Function name of the symbol search endpoint.
pub const SEARCH_FUNCTION: &str = "SYMBOL_SEARCH";

/// Response format requested from the provider.
const DATATYPE: &str = "json";

/// How much history the provider should return.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputSize {
    /// The latest 100 data points.
    Compact,
    /// The full available history.
    #[default]
    Full,
}

impl OutputSize {
    /// Returns the provider's name for the size.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Compact => "compact",
            Self::Full => "full",
        }
    }
}

impl std::fmt::Display for OutputSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for OutputSize {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "full" => Ok(Self::Full),
            _ => Err(format!("invalid output size '{s}', expected compact or full")),
        }
    }
}

/// A provider request with its query parameters, minus the API key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderRequest {
    function: &'static str,
    params: Vec<(&'static str, String)>,
    subject: String,
}

impl ProviderRequest {
    /// Builds a series request for `instrument` in `category`.
    ///
    /// # Errors
    ///
    /// Returns [`InstrumentError::ShapeMismatch`] if the instrument does not
    /// fit the category.
    pub fn series(
        instrument: &Instrument,
        category: Category,
        output_size: OutputSize,
    ) -> Result<Self, InstrumentError> {
        if instrument.shape() != category.shape() {
            return Err(InstrumentError::ShapeMismatch {
                category,
                expected: category.shape().describe(),
            });
        }
        let endpoint = category.endpoint();
        let mut params: Vec<(&'static str, String)> = endpoint
            .instrument_params
            .iter()
            .zip(instrument.components())
            .map(|(name, value)| (*name, value.to_string()))
            .collect();
        if category.accepts_output_size() {
            params.push(("outputsize", output_size.as_str().to_string()));
        }
        Ok(Self {
            function: endpoint.function,
            params,
            subject: instrument.to_string(),
        })
    }

    /// Builds a symbol search request.
    #[must_use]
    pub fn search(keywords: &str) -> Self {
        Self {
            function: SEARCH_FUNCTION,
            params: vec![("keywords", keywords.to_string())],
            subject: keywords.to_string(),
        }
    }

    /// Returns the provider function name.
    #[must_use]
    pub const fn function(&self) -> &'static str {
        self.function
    }

    /// Returns the query parameters besides function, datatype and key.
    #[must_use]
    pub fn params(&self) -> &[(&'static str, String)] {
        &self.params
    }

    /// Returns what the request is about, for log lines.
    #[must_use]
    pub fn subject(&self) -> &str {
        &self.subject
    }

    /// Returns the full request URL.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::InvalidUrl`] if `base` is not a valid URL.
    pub fn url(&self, base: &str, api_key: &str) -> Result<Url, FetchError> {
        let mut query: Vec<(&str, &str)> = Vec::with_capacity(self.params.len() + 3);
        query.push(("function", self.function));
        query.extend(self.params.iter().map(|(k, v)| (*k, v.as_str())));
        query.push(("datatype", DATATYPE));
        query.push(("apikey", api_key));
        Url::parse_with_params(base, &query).map_err(|e| FetchError::InvalidUrl(e.to_string()))
    }

    /// Returns the request URL with the API key masked, for logging.
    #[must_use]
    pub fn redacted_url(&self, base: &str) -> String {
        self.url(base, "***")
            .map_or_else(|_| format!("{base}?function={}", self.function), String::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query_of(url: &Url) -> Vec<(String, String)> {
        url.query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect()
    }

    #[test]
    fn test_equity_request() {
        let request = ProviderRequest::series(
            &Instrument::equity("IBM"),
            Category::DailyAdjusted,
            OutputSize::Compact,
        )
        .unwrap();
        let url = request.url(BASE_URL, "demo").unwrap();
        let pairs = query_of(&url);
        assert_eq!(pairs[0], ("function".into(), "TIME_SERIES_DAILY_ADJUSTED".into()));
        assert!(pairs.contains(&("symbol".into(), "IBM".into())));
        assert!(pairs.contains(&("outputsize".into(), "compact".into())));
        assert!(pairs.contains(&("datatype".into(), "json".into())));
        assert!(pairs.contains(&("apikey".into(), "demo".into())));
    }

    #[test]
    fn test_fx_and_digital_params() {
        let fx = ProviderRequest::series(
            &Instrument::currency("EUR", "USD"),
            Category::FxWeekly,
            OutputSize::Full,
        )
        .unwrap();
        assert_eq!(fx.function(), "FX_WEEKLY");
        assert_eq!(
            fx.params(),
            &[
                ("from_symbol", "EUR".to_string()),
                ("to_symbol", "USD".to_string()),
                ("outputsize", "full".to_string()),
            ]
        );

        let digital = ProviderRequest::series(
            &Instrument::digital("BTC", "EUR"),
            Category::DigitalMonthly,
            OutputSize::Full,
        )
        .unwrap();
        assert_eq!(
            digital.params(),
            &[("symbol", "BTC".to_string()), ("market", "EUR".to_string())]
        );
    }

    #[test]
    fn test_shape_mismatch_is_rejected() {
        let err = ProviderRequest::series(
            &Instrument::equity("IBM"),
            Category::FxDaily,
            OutputSize::Full,
        )
        .unwrap_err();
        assert!(matches!(err, InstrumentError::ShapeMismatch { .. }));
    }

    #[test]
    fn test_redacted_url_hides_key() {
        let request = ProviderRequest::search("tesco");
        let url = request.redacted_url(BASE_URL);
        assert!(url.contains("function=SYMBOL_SEARCH"));
        assert!(url.contains("keywords=tesco"));
        assert!(!url.contains("secret"));
        assert!(url.contains("apikey=***") || url.contains("apikey=%2A%2A%2A"));
    }
}
