//! Provider response classification and decoding.

use chrono::NaiveDate;
use quiver_types::{Schema, SeriesRow, TimeSeries};
use serde_json::{Map, Value};
use thiserror::Error;

/// Leading text of the provider's soft rate-limit notice.
pub const THROTTLE_NOTICE: &str =
    "Thank you for using Alpha Vantage! Our standard API call frequency is 5 calls per minute and 500 calls per day.";

/// Key carrying a hard provider error.
const ERROR_KEY: &str = "Error Message";

/// Key carrying a provider notice.
const NOTE_KEY: &str = "Note";

/// Key of the metadata block in series responses.
const META_KEY: &str = "Meta Data";

/// Prefix of the series block key in series responses.
const SERIES_KEY_PREFIX: &str = "Time Series";

/// Errors that can occur while decoding a response body.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// The body is not a JSON object.
    #[error("response is not a JSON object")]
    NotAnObject,

    /// No series block was found.
    #[error("response has no time series block")]
    MissingSeries,

    /// No `bestMatches` list was found.
    #[error("response has no search matches block")]
    MissingMatches,

    /// A row key is not an ISO date.
    #[error("invalid date '{0}'")]
    InvalidDate(String),

    /// A row lacks one of the OHLC columns.
    #[error("row {date} has no '{column}' column")]
    MissingColumn {
        /// Row date.
        date: NaiveDate,
        /// Missing column.
        column: &'static str,
    },

    /// A required value is not numeric.
    #[error("row {date} column '{column}' is not numeric: {value}")]
    InvalidNumber {
        /// Row date.
        date: NaiveDate,
        /// Column name.
        column: String,
        /// Offending value.
        value: String,
    },
}

/// How a response body should be treated.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseKind {
    /// A hard error: abort without retrying.
    HardError(String),
    /// The soft rate-limit notice: cool down and retry.
    Throttled,
    /// Anything else is accepted as payload.
    Payload(Value),
}

/// Classifies a response body.
#[must_use]
pub fn classify(body: Value) -> ResponseKind {
    if let Some(message) = body.get(ERROR_KEY) {
        let message = message
            .as_str()
            .map_or_else(|| message.to_string(), str::to_string);
        return ResponseKind::HardError(message);
    }
    let throttled = body
        .get(NOTE_KEY)
        .and_then(Value::as_str)
        .is_some_and(|note| note.starts_with(THROTTLE_NOTICE));
    if throttled {
        ResponseKind::Throttled
    } else {
        ResponseKind::Payload(body)
    }
}

/// Strips a leading enumeration such as `1. ` or `1a. ` from a field name.
#[must_use]
pub fn clean_field_name(name: &str) -> &str {
    match name.split_once('.') {
        Some((prefix, rest)) if prefix.chars().all(|c| c.is_alphanumeric() || c == '_') => {
            rest.trim_start()
        }
        _ => name,
    }
}

/// Returns a copy of `map` with every key cleaned.
#[must_use]
pub fn clean_keys(map: &Map<String, Value>) -> Map<String, Value> {
    map.iter()
        .map(|(k, v)| (clean_field_name(k).to_string(), v.clone()))
        .collect()
}

/// A decoded series response.
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesPayload {
    /// Provider metadata with cleaned keys.
    pub metadata: Map<String, Value>,
    /// The rows.
    pub series: TimeSeries,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    Open,
    High,
    Low,
    Close,
    Volume,
    Extra(usize),
}

/// Maps cleaned column names onto row fields.
///
/// The first column named after a price field (or `<field> (<market>)`)
/// fills that field; later duplicates such as a second market's prices
/// become extra columns.
fn column_layout(columns: &[String]) -> (Schema, Vec<Slot>) {
    let mut schema = Schema::ohlc();
    let mut taken = [false; 5];
    let slots: Vec<Slot> = columns
        .iter()
        .map(|name| {
            let base = name.split(" (").next().unwrap_or(name);
            let fixed = match base {
                "open" => Some((0, Slot::Open)),
                "high" => Some((1, Slot::High)),
                "low" => Some((2, Slot::Low)),
                "close" => Some((3, Slot::Close)),
                "volume" => Some((4, Slot::Volume)),
                _ => None,
            };
            match fixed {
                Some((i, slot)) if !taken[i] => {
                    taken[i] = true;
                    if slot == Slot::Volume {
                        schema.has_volume = true;
                    }
                    slot
                }
                _ => {
                    schema.extra.push(name.clone());
                    Slot::Extra(schema.extra.len() - 1)
                }
            }
        })
        .collect();
    (schema, slots)
}

fn number(value: &Value) -> Option<f64> {
    match value {
        Value::String(s) => s.trim().parse().ok(),
        Value::Number(n) => n.as_f64(),
        _ => None,
    }
}

/// Decodes a series payload.
///
/// # Errors
///
/// Returns a [`ParseError`] if the body has no series block or a row
/// cannot be decoded.
pub fn parse_series(body: &Value) -> Result<SeriesPayload, ParseError> {
    let object = body.as_object().ok_or(ParseError::NotAnObject)?;
    let metadata = object
        .get(META_KEY)
        .and_then(Value::as_object)
        .map(clean_keys)
        .unwrap_or_default();
    let block = object
        .iter()
        .find(|(key, _)| key.starts_with(SERIES_KEY_PREFIX))
        .and_then(|(_, v)| v.as_object())
        .ok_or(ParseError::MissingSeries)?;

    let columns: Vec<String> = block
        .values()
        .find_map(Value::as_object)
        .map(|row| row.keys().map(|k| clean_field_name(k).to_string()).collect())
        .unwrap_or_default();
    let (schema, slots) = column_layout(&columns);

    let mut rows = Vec::with_capacity(block.len());
    for (date_key, fields) in block {
        let date = NaiveDate::parse_from_str(date_key.get(..10).unwrap_or(date_key), "%Y-%m-%d")
            .map_err(|_| ParseError::InvalidDate(date_key.clone()))?;
        let fields = fields
            .as_object()
            .map(clean_keys)
            .unwrap_or_default();
        rows.push(decode_row(date, &fields, &columns, &slots, schema.extra.len())?);
    }

    Ok(SeriesPayload {
        metadata,
        series: TimeSeries::from_rows(schema, rows),
    })
}

fn decode_row(
    date: NaiveDate,
    fields: &Map<String, Value>,
    columns: &[String],
    slots: &[Slot],
    extra_width: usize,
) -> Result<SeriesRow, ParseError> {
    let mut prices = [None; 4];
    let mut row = SeriesRow::new(date, 0.0, 0.0, 0.0, 0.0).with_extra(vec![None; extra_width]);
    for (name, slot) in columns.iter().zip(slots) {
        let raw = fields.get(name);
        let value = raw.and_then(number);
        let required = match slot {
            Slot::Open => Some(0),
            Slot::High => Some(1),
            Slot::Low => Some(2),
            Slot::Close => Some(3),
            Slot::Volume => {
                row.volume = value.map(|v| v.max(0.0).round() as u64);
                None
            }
            Slot::Extra(i) => {
                row.extra[*i] = value;
                None
            }
        };
        if let Some(i) = required {
            match (raw, value) {
                (_, Some(v)) => prices[i] = Some(v),
                (Some(raw), None) => {
                    return Err(ParseError::InvalidNumber {
                        date,
                        column: name.clone(),
                        value: raw.to_string(),
                    });
                }
                (None, None) => {}
            }
        }
    }
    let names = ["open", "high", "low", "close"];
    let [open, high, low, close] = [0, 1, 2, 3].map(|i| {
        prices[i].ok_or(ParseError::MissingColumn {
            date,
            column: names[i],
        })
    });
    row.open = open?;
    row.high = high?;
    row.low = low?;
    row.close = close?;
    Ok(row)
}

/// One symbol search result with cleaned field names.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchMatch {
    fields: Map<String, Value>,
}

impl SearchMatch {
    /// Returns the matched symbol.
    #[must_use]
    pub fn symbol(&self) -> Option<&str> {
        self.fields.get("symbol").and_then(Value::as_str)
    }

    /// Returns the matched name.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.fields.get("name").and_then(Value::as_str)
    }

    /// Returns the provider's match score.
    #[must_use]
    pub fn score(&self) -> Option<f64> {
        self.fields.get("matchScore").and_then(number)
    }

    /// Returns all fields.
    #[must_use]
    pub const fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    /// Consumes the match and returns its fields.
    #[must_use]
    pub fn into_fields(self) -> Map<String, Value> {
        self.fields
    }
}

/// Decodes a symbol search payload.
///
/// # Errors
///
/// Returns [`ParseError::MissingMatches`] if there is no `bestMatches` list.
pub fn parse_search(body: &Value) -> Result<Vec<SearchMatch>, ParseError> {
    let matches = body
        .get("bestMatches")
        .and_then(Value::as_array)
        .ok_or(ParseError::MissingMatches)?;
    Ok(matches
        .iter()
        .filter_map(Value::as_object)
        .map(|m| SearchMatch {
            fields: clean_keys(m),
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_clean_field_name() {
        assert_eq!(clean_field_name("1. open"), "open");
        assert_eq!(clean_field_name("1a. open (CNY)"), "open (CNY)");
        assert_eq!(clean_field_name("9. matchScore"), "matchScore");
        assert_eq!(clean_field_name("Meta Data"), "Meta Data");
        assert_eq!(clean_field_name("open (U.S.)"), "open (U.S.)");
    }

    #[test]
    fn test_classify() {
        let hard = json!({"Error Message": "Invalid API call."});
        assert_eq!(classify(hard), ResponseKind::HardError("Invalid API call.".into()));

        let note = format!("{THROTTLE_NOTICE} Please visit our premium page.");
        assert_eq!(classify(json!({ "Note": note })), ResponseKind::Throttled);

        let other_note = json!({"Note": "scheduled maintenance"});
        assert!(matches!(classify(other_note), ResponseKind::Payload(_)));
    }

    #[test]
    fn test_parse_equity_adjusted() {
        let body = json!({
            "Meta Data": {"1. Information": "Daily Prices", "2. Symbol": "IBM"},
            "Time Series (Daily)": {
                "2024-01-03": {
                    "1. open": "160.0", "2. high": "162.5", "3. low": "159.1",
                    "4. close": "161.2", "5. adjusted close": "160.9",
                    "6. volume": "4120000", "7. dividend amount": "0.0000",
                    "8. split coefficient": "1.0"
                },
                "2024-01-02": {
                    "1. open": "158.0", "2. high": "160.1", "3. low": "157.5",
                    "4. close": "159.9", "5. adjusted close": "159.6",
                    "6. volume": "3950000", "7. dividend amount": "0.0000",
                    "8. split coefficient": "1.0"
                }
            }
        });
        let payload = parse_series(&body).unwrap();
        assert_eq!(payload.metadata.get("Symbol"), Some(&json!("IBM")));
        let series = payload.series;
        assert_eq!(series.len(), 2);
        assert!(series.schema().has_volume);
        assert_eq!(
            series.schema().extra,
            vec!["adjusted close", "dividend amount", "split coefficient"]
        );
        let first = &series.rows()[0];
        assert_eq!(first.date, NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());
        assert_eq!(first.volume, Some(3_950_000));
        assert_eq!(first.extra[0], Some(159.6));
    }

    #[test]
    fn test_parse_fx_has_no_volume() {
        let body = json!({
            "Time Series FX (Daily)": {
                "2024-01-02": {
                    "1. open": "1.10", "2. high": "1.11", "3. low": "1.09", "4. close": "1.105"
                }
            }
        });
        let series = parse_series(&body).unwrap().series;
        assert!(!series.schema().has_volume);
        assert_eq!(series.rows()[0].volume, None);
    }

    #[test]
    fn test_parse_digital_market_columns() {
        let body = json!({
            "Time Series (Digital Currency Daily)": {
                "2024-01-02": {
                    "1a. open (EUR)": "40000", "1b. open (USD)": "44000",
                    "2a. high (EUR)": "41000", "2b. high (USD)": "45000",
                    "3a. low (EUR)": "39000", "3b. low (USD)": "43000",
                    "4a. close (EUR)": "40500", "4b. close (USD)": "44500",
                    "5. volume": "1234.5", "6. market cap (USD)": "1234.5"
                }
            }
        });
        let series = parse_series(&body).unwrap().series;
        let row = &series.rows()[0];
        assert!((row.open - 40000.0).abs() < 1e-9);
        assert!((row.close - 40500.0).abs() < 1e-9);
        assert_eq!(row.volume, Some(1235));
        assert_eq!(series.schema().extra.len(), 5);
        assert_eq!(series.schema().extra[0], "open (USD)");
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(parse_series(&json!([])), Err(ParseError::NotAnObject));
        assert_eq!(
            parse_series(&json!({"Meta Data": {}})),
            Err(ParseError::MissingSeries)
        );
        let bad = json!({"Time Series (Daily)": {
            "2024-01-02": {"1. open": "x", "2. high": "1", "3. low": "1", "4. close": "1"}
        }});
        assert!(matches!(
            parse_series(&bad),
            Err(ParseError::InvalidNumber { .. })
        ));
    }

    #[test]
    fn test_parse_search() {
        let body = json!({"bestMatches": [
            {"1. symbol": "TSCO.LON", "2. name": "Tesco PLC", "9. matchScore": "0.7273"},
            {"1. symbol": "TSCDF", "2. name": "Tesco plc", "9. matchScore": "0.7143"}
        ]});
        let matches = parse_search(&body).unwrap();
        assert_eq!(matches.len(), 2);
        assert_eq!(matches[0].symbol(), Some("TSCO.LON"));
        assert_eq!(matches[1].name(), Some("Tesco plc"));
        assert_eq!(matches[0].score(), Some(0.7273));
        assert_eq!(parse_search(&json!({})), Err(ParseError::MissingMatches));
    }
}
