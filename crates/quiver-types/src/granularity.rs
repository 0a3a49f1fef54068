//! Sampling granularity of a cached series.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Sampling granularity of a time series.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    /// One row per trading day.
    #[default]
    Daily,
    /// One row per week.
    Weekly,
    /// One row per month.
    Monthly,
}

impl Granularity {
    /// Returns the granularity as a string identifier.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
        }
    }

    /// Returns all granularities.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::Daily, Self::Weekly, Self::Monthly]
    }
}

impl std::fmt::Display for Granularity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Granularity {
    type Err = GranularityParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "daily" | "day" | "d" | "1d" => Ok(Self::Daily),
            "weekly" | "week" | "w" | "1w" => Ok(Self::Weekly),
            "monthly" | "month" | "m" | "1mo" => Ok(Self::Monthly),
            _ => Err(GranularityParseError(s.to_string())),
        }
    }
}

/// Error returned when parsing an invalid granularity string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GranularityParseError(String);

impl std::fmt::Display for GranularityParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "invalid granularity '{}', expected one of: daily, weekly, monthly",
            self.0
        )
    }
}

impl std::error::Error for GranularityParseError {}
