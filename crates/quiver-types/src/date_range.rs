//! Inclusive date windows for range queries.

use chrono::NaiveDate;

use crate::DateRangeError;

/// An inclusive date window; either bound may be open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateWindow {
    /// Start date (inclusive), or unbounded.
    pub start: Option<NaiveDate>,
    /// End date (inclusive), or unbounded.
    pub end: Option<NaiveDate>,
}

impl DateWindow {
    /// Creates a new window, validating that start <= end when both are set.
    ///
    /// # Errors
    ///
    /// Returns an error if start > end.
    pub fn new(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Result<Self, DateRangeError> {
        if let (Some(start), Some(end)) = (start, end)
            && start > end
        {
            return Err(DateRangeError::InvalidRange { start, end });
        }
        Ok(Self { start, end })
    }

    /// A window with no bounds.
    #[must_use]
    pub const fn unbounded() -> Self {
        Self {
            start: None,
            end: None,
        }
    }

    /// Returns true if the window contains the given date.
    #[must_use]
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start.is_none_or(|s| date >= s) && self.end.is_none_or(|e| date <= e)
    }
}

impl std::fmt::Display for DateWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (self.start, self.end) {
            (Some(s), Some(e)) => write!(f, "{s} to {e}"),
            (Some(s), None) => write!(f, "from {s}"),
            (None, Some(e)) => write!(f, "until {e}"),
            (None, None) => write!(f, "all dates"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_window_validation() {
        assert!(DateWindow::new(Some(d(2024, 1, 2)), Some(d(2024, 1, 1))).is_err());
        assert!(DateWindow::new(Some(d(2024, 1, 1)), Some(d(2024, 1, 1))).is_ok());
        assert!(DateWindow::new(None, Some(d(2024, 1, 1))).is_ok());
    }

    #[test]
    fn test_window_contains_is_inclusive() {
        let w = DateWindow::new(Some(d(2024, 1, 5)), Some(d(2024, 1, 10))).unwrap();
        assert!(w.contains(d(2024, 1, 5)));
        assert!(w.contains(d(2024, 1, 10)));
        assert!(!w.contains(d(2024, 1, 4)));
        assert!(!w.contains(d(2024, 1, 11)));

        let open = DateWindow::new(Some(d(2024, 1, 5)), None).unwrap();
        assert!(open.contains(d(2030, 1, 1)));
        assert!(DateWindow::unbounded().contains(d(1990, 1, 1)));
    }
}
