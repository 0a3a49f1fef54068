//! Series categories offered by the quote provider.

use serde::{Deserialize, Deserializer, Serialize};
use std::str::FromStr;

use crate::Granularity;

/// Broad asset class of a category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetClass {
    /// Shares and other single-symbol listings.
    Equity,
    /// Physical currency pairs.
    Fx,
    /// Digital currency against a market currency.
    Digital,
}

impl AssetClass {
    /// Returns the asset class as a string slice.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Equity => "equity",
            Self::Fx => "fx",
            Self::Digital => "digital",
        }
    }
}

impl std::fmt::Display for AssetClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Instrument shape a category requires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InstrumentShape {
    /// A single ticker symbol.
    Symbol,
    /// An ordered `(from, to)` currency pair.
    CurrencyPair,
    /// A digital currency symbol plus the market it is quoted in.
    SymbolMarket,
}

impl InstrumentShape {
    /// Returns a short human-readable description of the shape.
    #[must_use]
    pub const fn describe(&self) -> &'static str {
        match self {
            Self::Symbol => "a single symbol",
            Self::CurrencyPair => "a (from, to) currency pair",
            Self::SymbolMarket => "a (symbol, market) pair",
        }
    }
}

/// Provider endpoint template for a category.
///
/// `instrument_params` lists the query parameter names that receive the
/// instrument's components, in the instrument's canonical order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EndpointTemplate {
    /// Provider function name (e.g. `TIME_SERIES_DAILY`).
    pub function: &'static str,
    /// Query parameter names for the instrument components.
    pub instrument_params: &'static [&'static str],
}

const SYMBOL_PARAMS: &[&str] = &["symbol"];
const PAIR_PARAMS: &[&str] = &["from_symbol", "to_symbol"];
const MARKET_PARAMS: &[&str] = &["symbol", "market"];

/// A historical series category.
///
/// Every variant carries its endpoint, instrument shape and granularity as
/// data, so dispatch never depends on string matching.
///
/// Deserialization goes through [`FromStr`], so config files accept the same
/// aliases as the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Category {
    /// Daily equity prices.
    #[serde(rename = "daily")]
    Daily,
    /// Daily equity prices with adjustments.
    #[serde(rename = "daily-adjusted")]
    DailyAdjusted,
    /// Weekly equity prices.
    #[serde(rename = "weekly")]
    Weekly,
    /// Weekly equity prices with adjustments.
    #[serde(rename = "weekly-adjusted")]
    WeeklyAdjusted,
    /// Monthly equity prices.
    #[serde(rename = "monthly")]
    Monthly,
    /// Monthly equity prices with adjustments.
    #[serde(rename = "monthly-adjusted")]
    MonthlyAdjusted,
    /// Daily FX rates.
    #[serde(rename = "fx_daily")]
    FxDaily,
    /// Weekly FX rates.
    #[serde(rename = "fx_weekly")]
    FxWeekly,
    /// Monthly FX rates.
    #[serde(rename = "fx_monthly")]
    FxMonthly,
    /// Daily digital currency prices.
    #[serde(rename = "digital_daily")]
    DigitalDaily,
    /// Weekly digital currency prices.
    #[serde(rename = "digital_weekly")]
    DigitalWeekly,
    /// Monthly digital currency prices.
    #[serde(rename = "digital_monthly")]
    DigitalMonthly,
}

impl Category {
    /// Returns the category identifier used in file names and on the CLI.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::DailyAdjusted => "daily-adjusted",
            Self::Weekly => "weekly",
            Self::WeeklyAdjusted => "weekly-adjusted",
            Self::Monthly => "monthly",
            Self::MonthlyAdjusted => "monthly-adjusted",
            Self::FxDaily => "fx_daily",
            Self::FxWeekly => "fx_weekly",
            Self::FxMonthly => "fx_monthly",
            Self::DigitalDaily => "digital_daily",
            Self::DigitalWeekly => "digital_weekly",
            Self::DigitalMonthly => "digital_monthly",
        }
    }

    /// Returns the provider endpoint template.
    #[must_use]
    pub const fn endpoint(&self) -> EndpointTemplate {
        let (function, instrument_params) = match self {
            Self::Daily => ("TIME_SERIES_DAILY", SYMBOL_PARAMS),
            Self::DailyAdjusted => ("TIME_SERIES_DAILY_ADJUSTED", SYMBOL_PARAMS),
            Self::Weekly => ("TIME_SERIES_WEEKLY", SYMBOL_PARAMS),
            Self::WeeklyAdjusted => ("TIME_SERIES_WEEKLY_ADJUSTED", SYMBOL_PARAMS),
            Self::Monthly => ("TIME_SERIES_MONTHLY", SYMBOL_PARAMS),
            Self::MonthlyAdjusted => ("TIME_SERIES_MONTHLY_ADJUSTED", SYMBOL_PARAMS),
            Self::FxDaily => ("FX_DAILY", PAIR_PARAMS),
            Self::FxWeekly => ("FX_WEEKLY", PAIR_PARAMS),
            Self::FxMonthly => ("FX_MONTHLY", PAIR_PARAMS),
            Self::DigitalDaily => ("DIGITAL_CURRENCY_DAILY", MARKET_PARAMS),
            Self::DigitalWeekly => ("DIGITAL_CURRENCY_WEEKLY", MARKET_PARAMS),
            Self::DigitalMonthly => ("DIGITAL_CURRENCY_MONTHLY", MARKET_PARAMS),
        };
        EndpointTemplate {
            function,
            instrument_params,
        }
    }

    /// Returns the asset class of the category.
    #[must_use]
    pub const fn asset_class(&self) -> AssetClass {
        match self {
            Self::Daily
            | Self::DailyAdjusted
            | Self::Weekly
            | Self::WeeklyAdjusted
            | Self::Monthly
            | Self::MonthlyAdjusted => AssetClass::Equity,
            Self::FxDaily | Self::FxWeekly | Self::FxMonthly => AssetClass::Fx,
            Self::DigitalDaily | Self::DigitalWeekly | Self::DigitalMonthly => {
                AssetClass::Digital
            }
        }
    }

    /// Returns the instrument shape the category requires.
    #[must_use]
    pub const fn shape(&self) -> InstrumentShape {
        match self.asset_class() {
            AssetClass::Equity => InstrumentShape::Symbol,
            AssetClass::Fx => InstrumentShape::CurrencyPair,
            AssetClass::Digital => InstrumentShape::SymbolMarket,
        }
    }

    /// Returns the sampling granularity of the category.
    #[must_use]
    pub const fn granularity(&self) -> Granularity {
        match self {
            Self::Daily | Self::DailyAdjusted | Self::FxDaily | Self::DigitalDaily => {
                Granularity::Daily
            }
            Self::Weekly | Self::WeeklyAdjusted | Self::FxWeekly | Self::DigitalWeekly => {
                Granularity::Weekly
            }
            Self::Monthly | Self::MonthlyAdjusted | Self::FxMonthly | Self::DigitalMonthly => {
                Granularity::Monthly
            }
        }
    }

    /// Returns the category of `class` sampled at `granularity`.
    ///
    /// Equity categories resolve to the unadjusted series.
    #[must_use]
    pub const fn for_class(class: AssetClass, granularity: Granularity) -> Self {
        match (class, granularity) {
            (AssetClass::Equity, Granularity::Daily) => Self::Daily,
            (AssetClass::Equity, Granularity::Weekly) => Self::Weekly,
            (AssetClass::Equity, Granularity::Monthly) => Self::Monthly,
            (AssetClass::Fx, Granularity::Daily) => Self::FxDaily,
            (AssetClass::Fx, Granularity::Weekly) => Self::FxWeekly,
            (AssetClass::Fx, Granularity::Monthly) => Self::FxMonthly,
            (AssetClass::Digital, Granularity::Daily) => Self::DigitalDaily,
            (AssetClass::Digital, Granularity::Weekly) => Self::DigitalWeekly,
            (AssetClass::Digital, Granularity::Monthly) => Self::DigitalMonthly,
        }
    }

    /// Returns true if the provider accepts an output size for this category.
    #[must_use]
    pub const fn accepts_output_size(&self) -> bool {
        !matches!(self.asset_class(), AssetClass::Digital)
    }

    /// Returns all categories.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::Daily,
            Self::DailyAdjusted,
            Self::Weekly,
            Self::WeeklyAdjusted,
            Self::Monthly,
            Self::MonthlyAdjusted,
            Self::FxDaily,
            Self::FxWeekly,
            Self::FxMonthly,
            Self::DigitalDaily,
            Self::DigitalWeekly,
            Self::DigitalMonthly,
        ]
    }

    /// Returns all categories of the given asset class.
    pub fn of_class(class: AssetClass) -> impl Iterator<Item = Self> {
        Self::all()
            .iter()
            .copied()
            .filter(move |c| c.asset_class() == class)
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Category {
    type Err = CategoryParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace(' ', "").as_str() {
            "daily" => Ok(Self::Daily),
            "daily-adjusted" | "daily_adjusted" => Ok(Self::DailyAdjusted),
            "weekly" => Ok(Self::Weekly),
            "weekly-adjusted" | "weekly_adjusted" => Ok(Self::WeeklyAdjusted),
            "monthly" => Ok(Self::Monthly),
            "monthly-adjusted" | "monthly_adjusted" => Ok(Self::MonthlyAdjusted),
            "fx" | "fx_daily" | "fx-daily" => Ok(Self::FxDaily),
            "fx_weekly" | "fx-weekly" => Ok(Self::FxWeekly),
            "fx_monthly" | "fx-monthly" => Ok(Self::FxMonthly),
            "digital" | "digital_fx" | "digital_daily" | "digital-daily" => Ok(Self::DigitalDaily),
            "digital_weekly" | "digital-weekly" => Ok(Self::DigitalWeekly),
            "digital_monthly" | "digital-monthly" => Ok(Self::DigitalMonthly),
            _ => Err(CategoryParseError(s.to_string())),
        }
    }
}

impl<'de> Deserialize<'de> for Category {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        name.parse().map_err(serde::de::Error::custom)
    }
}

/// Error returned when parsing an unknown category string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryParseError(String);

impl std::fmt::Display for CategoryParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid category '{}', expected one of: ", self.0)?;
        let names: Vec<&str> = Category::all().iter().map(Category::as_str).collect();
        write!(f, "{}", names.join(", "))
    }
}

impl std::error::Error for CategoryParseError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_deserializes_aliases() {
        let parsed: Vec<Category> =
            serde_json::from_str(r#"["fx", "digital_fx", "digital", "daily-adjusted"]"#).unwrap();
        assert_eq!(
            parsed,
            vec![
                Category::FxDaily,
                Category::DigitalDaily,
                Category::DigitalDaily,
                Category::DailyAdjusted
            ]
        );
        let json = serde_json::to_string(&Category::FxWeekly).unwrap();
        assert_eq!(json, "\"fx_weekly\"");
        assert_eq!(serde_json::from_str::<Category>(&json).unwrap(), Category::FxWeekly);
        assert!(serde_json::from_str::<Category>("\"hourly\"").is_err());
    }

    #[test]
    fn test_category_parse_aliases() {
        assert_eq!("fx".parse::<Category>().unwrap(), Category::FxDaily);
        assert_eq!("FX-Daily".parse::<Category>().unwrap(), Category::FxDaily);
        assert_eq!("digital".parse::<Category>().unwrap(), Category::DigitalDaily);
        assert_eq!("digital_fx".parse::<Category>().unwrap(), Category::DigitalDaily);
        assert_eq!(
            "Monthly-Adjusted".parse::<Category>().unwrap(),
            Category::MonthlyAdjusted
        );
        assert!("sector".parse::<Category>().is_err());
    }

    #[test]
    fn test_category_round_trips_through_as_str() {
        for category in Category::all() {
            assert_eq!(category.as_str().parse::<Category>().unwrap(), *category);
        }
    }

    #[test]
    fn test_endpoint_arity_matches_shape() {
        for category in Category::all() {
            let arity = category.endpoint().instrument_params.len();
            let expected = match category.shape() {
                InstrumentShape::Symbol => 1,
                InstrumentShape::CurrencyPair | InstrumentShape::SymbolMarket => 2,
            };
            assert_eq!(arity, expected, "{category}");
        }
    }

    #[test]
    fn test_granularity_and_class() {
        assert_eq!(Category::WeeklyAdjusted.granularity(), Granularity::Weekly);
        assert_eq!(Category::FxMonthly.granularity(), Granularity::Monthly);
        assert_eq!(Category::DigitalDaily.asset_class(), AssetClass::Digital);
        assert_eq!(
            Category::for_class(AssetClass::Fx, Granularity::Weekly),
            Category::FxWeekly
        );
        assert_eq!(Category::of_class(AssetClass::Equity).count(), 6);
        assert!(!Category::DigitalWeekly.accepts_output_size());
    }
}
