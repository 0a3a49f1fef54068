//! Currency descriptors.

use serde::{Deserialize, Serialize};

/// Whether a currency is a physical (fiat) or digital currency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CurrencyKind {
    /// Fiat currency.
    Physical,
    /// Digital currency.
    Digital,
}

impl CurrencyKind {
    /// Returns the kind as a string slice.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Physical => "physical",
            Self::Digital => "digital",
        }
    }
}

impl std::fmt::Display for CurrencyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A known currency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Currency {
    code: String,
    name: String,
    kind: CurrencyKind,
}

impl Currency {
    /// Creates a currency.
    #[must_use]
    pub fn new(code: impl Into<String>, name: impl Into<String>, kind: CurrencyKind) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
            kind,
        }
    }

    /// Returns the currency code.
    #[must_use]
    pub fn code(&self) -> &str {
        &self.code
    }

    /// Returns the currency name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the currency kind.
    #[must_use]
    pub const fn kind(&self) -> CurrencyKind {
        self.kind
    }

    /// Returns true for digital currencies.
    #[must_use]
    pub const fn is_digital(&self) -> bool {
        matches!(self.kind, CurrencyKind::Digital)
    }
}

impl std::fmt::Display for Currency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.name, self.code)
    }
}
