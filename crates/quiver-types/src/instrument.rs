//! Instruments, the loose input forms they are resolved from, and series keys.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::{Category, InstrumentError, InstrumentShape};

/// Folder prefix marking digital currency series.
pub const DIGITAL_FOLDER_PREFIX: &str = "CRYPTO_";

/// A canonical instrument, already validated for one instrument shape.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Instrument {
    /// An equity ticker symbol.
    Equity {
        /// Ticker symbol as the provider knows it.
        symbol: String,
    },
    /// A physical currency pair.
    Currency {
        /// Base currency code.
        from: String,
        /// Quote currency code.
        to: String,
    },
    /// A digital currency quoted in a market currency.
    Digital {
        /// Digital currency code.
        symbol: String,
        /// Market currency code.
        market: String,
    },
}

impl Instrument {
    /// Creates an equity instrument.
    #[must_use]
    pub fn equity(symbol: impl Into<String>) -> Self {
        Self::Equity {
            symbol: symbol.into(),
        }
    }

    /// Creates a currency pair instrument.
    #[must_use]
    pub fn currency(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self::Currency {
            from: from.into(),
            to: to.into(),
        }
    }

    /// Creates a digital currency instrument.
    #[must_use]
    pub fn digital(symbol: impl Into<String>, market: impl Into<String>) -> Self {
        Self::Digital {
            symbol: symbol.into(),
            market: market.into(),
        }
    }

    /// Resolves a loose input into the canonical instrument for `category`.
    ///
    /// # Errors
    ///
    /// Returns an [`InstrumentError`] if the input form is not accepted for the
    /// category's shape or a currency code is malformed.
    pub fn resolve(input: &InstrumentInput, category: Category) -> Result<Self, InstrumentError> {
        match category.shape() {
            InstrumentShape::Symbol => match input {
                InstrumentInput::Text(symbol) => Ok(Self::equity(ticker_symbol(symbol)?)),
                other => Err(InstrumentError::Unsupported {
                    category,
                    form: other.form(),
                }),
            },
            InstrumentShape::CurrencyPair => {
                let (from, to) = match input {
                    InstrumentInput::Text(text) => split_pair(text, false)?,
                    InstrumentInput::List(items) => list_pair(items)?,
                    InstrumentInput::Fields(fields) => {
                        field_pair(fields, "from_currency", "to_currency")?
                    }
                };
                Ok(Self::Currency {
                    from: currency_code(&from)?,
                    to: currency_code(&to)?,
                })
            }
            InstrumentShape::SymbolMarket => {
                let (symbol, market) = match input {
                    InstrumentInput::Text(text) => split_pair(text, true)?,
                    InstrumentInput::List(items) => list_pair(items)?,
                    InstrumentInput::Fields(fields) => field_pair(fields, "symbol", "market")?,
                };
                Ok(Self::Digital {
                    symbol: currency_code(&symbol)?,
                    market: currency_code(&market)?,
                })
            }
        }
    }

    /// Returns the shape of this instrument.
    #[must_use]
    pub const fn shape(&self) -> InstrumentShape {
        match self {
            Self::Equity { .. } => InstrumentShape::Symbol,
            Self::Currency { .. } => InstrumentShape::CurrencyPair,
            Self::Digital { .. } => InstrumentShape::SymbolMarket,
        }
    }

    /// Returns the instrument components in query-parameter order.
    #[must_use]
    pub fn components(&self) -> Vec<&str> {
        match self {
            Self::Equity { symbol } => vec![symbol.as_str()],
            Self::Currency { from, to } => vec![from.as_str(), to.as_str()],
            Self::Digital { symbol, market } => vec![symbol.as_str(), market.as_str()],
        }
    }

    /// Returns the cache folder name (`SYMBOL`, `FROM_TO` or `CRYPTO_SYM_MKT`).
    #[must_use]
    pub fn folder_name(&self) -> String {
        match self {
            Self::Equity { symbol } => symbol.clone(),
            Self::Currency { from, to } => format!("{from}_{to}"),
            Self::Digital { symbol, market } => {
                format!("{DIGITAL_FOLDER_PREFIX}{symbol}_{market}")
            }
        }
    }
}

impl std::fmt::Display for Instrument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Equity { symbol } => write!(f, "{symbol}"),
            Self::Currency { from, to } => write!(f, "{from}/{to}"),
            Self::Digital { symbol, market } => write!(f, "{symbol}/{market} (digital)"),
        }
    }
}

/// The accepted loose forms of an instrument before resolution.
///
/// Deserializes from a string, a list of strings or a string map, so the
/// same value can come from a config file, the CLI or a caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum InstrumentInput {
    /// A symbol or an underscore-delimited pair.
    Text(String),
    /// An ordered pair.
    List(Vec<String>),
    /// Named components (`from_currency`/`to_currency` or `symbol`/`market`).
    Fields(BTreeMap<String, String>),
}

impl InstrumentInput {
    const fn form(&self) -> &'static str {
        match self {
            Self::Text(_) => "text",
            Self::List(_) => "list",
            Self::Fields(_) => "mapping",
        }
    }
}

impl From<&str> for InstrumentInput {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for InstrumentInput {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl<S: Into<String>> From<[S; 2]> for InstrumentInput {
    fn from([a, b]: [S; 2]) -> Self {
        Self::List(vec![a.into(), b.into()])
    }
}

fn split_pair(text: &str, digital: bool) -> Result<(String, String), InstrumentError> {
    let trimmed = text.trim();
    let body = if digital {
        trimmed
            .strip_prefix(DIGITAL_FOLDER_PREFIX)
            .or_else(|| trimmed.strip_prefix("crypto_"))
            .unwrap_or(trimmed)
    } else {
        trimmed
    };
    match body.split_once('_') {
        Some((a, b)) if !b.contains('_') => Ok((a.to_string(), b.to_string())),
        _ => Err(InstrumentError::InvalidPair(text.to_string())),
    }
}

fn list_pair(items: &[String]) -> Result<(String, String), InstrumentError> {
    match items {
        [a, b] => Ok((a.clone(), b.clone())),
        _ => Err(InstrumentError::PairLength(items.len())),
    }
}

fn field_pair(
    fields: &BTreeMap<String, String>,
    first: &'static str,
    second: &'static str,
) -> Result<(String, String), InstrumentError> {
    let a = fields.get(first).ok_or(InstrumentError::MissingField(first))?;
    let b = fields.get(second).ok_or(InstrumentError::MissingField(second))?;
    Ok((a.clone(), b.clone()))
}

/// Validates a 3-4 letter currency code and upper-cases it.
///
/// # Errors
///
/// Returns [`InstrumentError::InvalidCode`] for anything else.
pub fn currency_code(code: &str) -> Result<String, InstrumentError> {
    let code = code.trim();
    if (3..=4).contains(&code.len()) && code.chars().all(|c| c.is_ascii_alphabetic()) {
        Ok(code.to_ascii_uppercase())
    } else {
        Err(InstrumentError::InvalidCode(code.to_string()))
    }
}

/// Validates an equity ticker symbol.
///
/// Accepts ASCII letters, digits and `. - ^ =`, which also keeps the symbol
/// usable as a single cache folder name.
///
/// # Errors
///
/// Returns [`InstrumentError::EmptySymbol`] or [`InstrumentError::InvalidSymbol`].
pub fn ticker_symbol(symbol: &str) -> Result<String, InstrumentError> {
    let symbol = symbol.trim();
    if symbol.is_empty() {
        return Err(InstrumentError::EmptySymbol);
    }
    let allowed = |c: char| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '^' | '=');
    if !symbol.chars().all(allowed) || symbol.chars().all(|c| c == '.') {
        return Err(InstrumentError::InvalidSymbol(symbol.to_string()));
    }
    Ok(symbol.to_string())
}

/// Unique address of a cached series.
///
/// Granularity is carried by the category.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SeriesKey {
    /// The instrument.
    pub instrument: Instrument,
    /// The series category.
    pub category: Category,
}

impl SeriesKey {
    /// Creates a key, checking that the instrument fits the category.
    ///
    /// # Errors
    ///
    /// Returns [`InstrumentError::ShapeMismatch`] if the shapes differ, or a
    /// symbol error if an equity symbol cannot name a cache folder.
    pub fn new(instrument: Instrument, category: Category) -> Result<Self, InstrumentError> {
        if instrument.shape() != category.shape() {
            return Err(InstrumentError::ShapeMismatch {
                category,
                expected: category.shape().describe(),
            });
        }
        if let Instrument::Equity { symbol } = &instrument {
            ticker_symbol(symbol)?;
        }
        Ok(Self {
            instrument,
            category,
        })
    }

    /// Returns the granularity of the keyed series.
    #[must_use]
    pub const fn granularity(&self) -> crate::Granularity {
        self.category.granularity()
    }
}

impl std::fmt::Display for SeriesKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} [{}]", self.instrument, self.category)
    }
}
