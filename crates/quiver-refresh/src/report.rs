//! Refresh tasks, per-instrument outcomes and batch reports.

use chrono::{DateTime, NaiveDate, Utc};
use quiver_types::SeriesKey;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier of a refresh batch.
pub type BatchId = Uuid;

/// One series to keep up to date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshTask {
    /// Series to refresh.
    pub key: SeriesKey,
    /// Whole days a cached series may lag before it is fetched again.
    pub max_gap_days: u32,
}

impl RefreshTask {
    /// Creates a task.
    #[must_use]
    pub const fn new(key: SeriesKey, max_gap_days: u32) -> Self {
        Self { key, max_gap_days }
    }
}

/// What happened to one series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RefreshStatus {
    /// No cache existed; a new series was written.
    Created,
    /// The cached series was merged with fresh rows.
    Updated,
    /// The cached series was recent enough.
    UpToDate,
    /// The provider returned no rows.
    Empty,
    /// The provider kept throttling; try again next cycle.
    Throttled,
    /// The refresh failed; see the error text.
    Failed,
}

impl RefreshStatus {
    /// Returns the status as a string identifier.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Updated => "updated",
            Self::UpToDate => "up_to_date",
            Self::Empty => "empty",
            Self::Throttled => "throttled",
            Self::Failed => "failed",
        }
    }

    /// Returns true if the cache was written.
    #[must_use]
    pub const fn wrote(&self) -> bool {
        matches!(self, Self::Created | Self::Updated)
    }
}

impl std::fmt::Display for RefreshStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Result of refreshing one series.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshOutcome {
    /// The series.
    pub key: SeriesKey,
    /// What happened.
    pub status: RefreshStatus,
    /// Rows in the cached series afterwards.
    pub rows: usize,
    /// Latest cached date afterwards.
    pub last_date: Option<NaiveDate>,
    /// Error text for failed refreshes.
    pub error: Option<String>,
}

impl RefreshOutcome {
    pub(crate) const fn new(key: SeriesKey, status: RefreshStatus) -> Self {
        Self {
            key,
            status,
            rows: 0,
            last_date: None,
            error: None,
        }
    }

    pub(crate) fn failed(key: SeriesKey, error: impl ToString) -> Self {
        Self {
            error: Some(error.to_string()),
            ..Self::new(key, RefreshStatus::Failed)
        }
    }

    pub(crate) const fn with_rows(mut self, rows: usize, last_date: Option<NaiveDate>) -> Self {
        self.rows = rows;
        self.last_date = last_date;
        self
    }
}

/// Outcomes of one refresh batch, in task order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshReport {
    /// Batch identifier.
    pub id: BatchId,
    /// When the batch started.
    pub started_at: DateTime<Utc>,
    /// When the last task finished.
    pub finished_at: DateTime<Utc>,
    /// Per-series outcomes.
    pub outcomes: Vec<RefreshOutcome>,
}

impl RefreshReport {
    /// Creates a report for a batch that started now.
    #[must_use]
    pub fn start() -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            started_at: now,
            finished_at: now,
            outcomes: Vec::new(),
        }
    }

    /// Appends an outcome and moves the finish time forward.
    pub fn record(&mut self, outcome: RefreshOutcome) {
        self.outcomes.push(outcome);
        self.finished_at = Utc::now();
    }

    /// Returns how many outcomes have `status`.
    #[must_use]
    pub fn count(&self, status: RefreshStatus) -> usize {
        self.outcomes.iter().filter(|o| o.status == status).count()
    }

    /// Returns the failed outcomes.
    pub fn failures(&self) -> impl Iterator<Item = &RefreshOutcome> {
        self.outcomes
            .iter()
            .filter(|o| o.status == RefreshStatus::Failed)
    }

    /// Returns true if nothing failed.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failures().next().is_none()
    }

    /// Serializes the report as pretty JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiver_types::{Category, Instrument};

    fn key(symbol: &str) -> SeriesKey {
        SeriesKey::new(Instrument::equity(symbol), Category::Daily).unwrap()
    }

    #[test]
    fn test_report_counts_and_json() {
        let mut report = RefreshReport::start();
        report.record(RefreshOutcome::new(key("IBM"), RefreshStatus::Created).with_rows(10, None));
        report.record(RefreshOutcome::new(key("MSFT"), RefreshStatus::UpToDate));
        report.record(RefreshOutcome::failed(key("XYZ"), "boom"));

        assert_eq!(report.count(RefreshStatus::Created), 1);
        assert!(!report.is_clean());
        assert_eq!(report.failures().count(), 1);
        assert!(report.finished_at >= report.started_at);

        let json = report.to_json().unwrap();
        assert!(json.contains("\"up_to_date\""));
        let back: RefreshReport = serde_json::from_str(&json).unwrap();
        assert_eq!(back.outcomes, report.outcomes);
    }
}
