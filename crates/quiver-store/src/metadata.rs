//! Metadata sidecar records.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Reserved key holding the earliest known data date.
pub const FIRST_TIMESTAMP_KEY: &str = "FirstTimeStamp";

/// Format of the [`FIRST_TIMESTAMP_KEY`] value.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Search-only field that never reaches a sidecar.
const MATCH_SCORE_KEY: &str = "matchScore";

/// Provider-reported descriptive fields of one series.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MetadataRecord(Map<String, Value>);

impl MetadataRecord {
    /// Creates an empty record.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a record from provider fields, dropping the search score.
    #[must_use]
    pub fn from_fields(mut fields: Map<String, Value>) -> Self {
        fields.remove(MATCH_SCORE_KEY);
        Self(fields)
    }

    /// Returns a field.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Sets a field.
    pub fn insert(&mut self, key: impl Into<String>, value: Value) {
        self.0.insert(key.into(), value);
    }

    /// Returns the number of fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if the record has no fields.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the fields.
    #[must_use]
    pub const fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Returns the parsed first timestamp, if present and well formed.
    #[must_use]
    pub fn first_timestamp(&self) -> Option<NaiveDateTime> {
        self.0
            .get(FIRST_TIMESTAMP_KEY)
            .and_then(Value::as_str)
            .and_then(|s| NaiveDateTime::parse_from_str(s, TIMESTAMP_FORMAT).ok())
    }

    fn set_first_timestamp(&mut self, ts: NaiveDateTime) {
        self.0.insert(
            FIRST_TIMESTAMP_KEY.to_string(),
            Value::String(ts.format(TIMESTAMP_FORMAT).to_string()),
        );
    }

    /// Records `date` as first timestamp unless an earlier one is present.
    #[must_use]
    pub fn with_first_date(mut self, date: NaiveDate) -> Self {
        let candidate = date.and_time(chrono::NaiveTime::MIN);
        let earliest = self
            .first_timestamp()
            .map_or(candidate, |current| current.min(candidate));
        self.set_first_timestamp(earliest);
        self
    }

    /// Shallow-merges `self` over `old`.
    ///
    /// Fields of `self` win, except the first timestamp, which keeps the
    /// earlier of the two values.
    #[must_use]
    pub fn merge_over(self, old: &Self) -> Self {
        let fresh_first = self.first_timestamp();
        let mut merged = old.0.clone();
        merged.extend(self.0);
        let mut merged = Self(merged);
        match (fresh_first, old.first_timestamp()) {
            (Some(a), Some(b)) => merged.set_first_timestamp(a.min(b)),
            (None, Some(b)) => merged.set_first_timestamp(b),
            _ => {}
        }
        merged
    }
}

impl From<Map<String, Value>> for MetadataRecord {
    fn from(value: Map<String, Value>) -> Self {
        Self(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> MetadataRecord {
        match value {
            Value::Object(map) => MetadataRecord::from(map),
            _ => panic!("not an object"),
        }
    }

    #[test]
    fn test_from_fields_drops_match_score() {
        let fields = json!({"symbol": "IBM", "matchScore": "1.0000"});
        let Value::Object(map) = fields else { unreachable!() };
        let record = MetadataRecord::from_fields(map);
        assert_eq!(record.len(), 1);
        assert!(record.get("matchScore").is_none());
    }

    #[test]
    fn test_first_timestamp_only_decreases() {
        let d = |day| NaiveDate::from_ymd_opt(2020, 1, day).unwrap();
        let record = MetadataRecord::new().with_first_date(d(10));
        assert_eq!(
            record.get(FIRST_TIMESTAMP_KEY),
            Some(&json!("2020-01-10T00:00:00"))
        );
        let record = record.with_first_date(d(20));
        assert_eq!(record.first_timestamp().unwrap().date(), d(10));
        let record = record.with_first_date(d(5));
        assert_eq!(record.first_timestamp().unwrap().date(), d(5));
    }

    #[test]
    fn test_merge_over_fresh_wins_except_first_timestamp() {
        let old = record(json!({
            "Symbol": "IBM",
            "Last Refreshed": "2024-01-01",
            "Region": "United States",
            "FirstTimeStamp": "1999-11-01T00:00:00"
        }));
        let fresh = record(json!({
            "Last Refreshed": "2024-02-01",
            "FirstTimeStamp": "2023-09-01T00:00:00"
        }));
        let merged = fresh.merge_over(&old);
        assert_eq!(merged.get("Last Refreshed"), Some(&json!("2024-02-01")));
        assert_eq!(merged.get("Region"), Some(&json!("United States")));
        assert_eq!(
            merged.get(FIRST_TIMESTAMP_KEY),
            Some(&json!("1999-11-01T00:00:00"))
        );
    }
}
