//! Time source used for backoff sleeps and staleness checks.

use async_trait::async_trait;
use chrono::NaiveDateTime;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

/// Source of the current time and of suspending sleeps.
///
/// The executor never calls `tokio::time::sleep` directly, so tests can
/// drive cooldowns without waiting on a real clock.
#[async_trait]
pub trait Clock: Send + Sync + std::fmt::Debug {
    /// Suspends the caller for `duration`.
    async fn sleep(&self, duration: Duration);

    /// Returns the current local date and time.
    fn now(&self) -> NaiveDateTime;
}

/// The wall clock, sleeping on the tokio timer.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

#[async_trait]
impl Clock for SystemClock {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }

    fn now(&self) -> NaiveDateTime {
        chrono::Local::now().naive_local()
    }
}

/// A clock that returns immediately from sleeps and records them.
///
/// Each sleep advances the reported time by the slept duration.
#[derive(Debug)]
pub struct RecordingClock {
    state: Mutex<RecordingState>,
}

#[derive(Debug)]
struct RecordingState {
    now: NaiveDateTime,
    sleeps: Vec<Duration>,
}

impl RecordingClock {
    /// Creates a clock fixed at `now`.
    #[must_use]
    pub const fn new(now: NaiveDateTime) -> Self {
        Self {
            state: Mutex::new(RecordingState {
                now,
                sleeps: Vec::new(),
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, RecordingState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Returns every sleep requested so far, in order.
    #[must_use]
    pub fn sleeps(&self) -> Vec<Duration> {
        self.lock().sleeps.clone()
    }

    /// Moves the reported time to `now`.
    pub fn set_now(&self, now: NaiveDateTime) {
        self.lock().now = now;
    }
}

#[async_trait]
impl Clock for RecordingClock {
    async fn sleep(&self, duration: Duration) {
        {
            let mut state = self.lock();
            state.sleeps.push(duration);
            if let Ok(delta) = chrono::TimeDelta::from_std(duration) {
                state.now += delta;
            }
        }
        tokio::task::yield_now().await;
    }

    fn now(&self) -> NaiveDateTime {
        self.lock().now
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[tokio::test]
    async fn test_recording_clock_advances() {
        let start = NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap();
        let clock = RecordingClock::new(start);
        clock.sleep(Duration::from_secs(60)).await;
        clock.sleep(Duration::from_secs(12)).await;

        assert_eq!(
            clock.sleeps(),
            vec![Duration::from_secs(60), Duration::from_secs(12)]
        );
        assert_eq!((clock.now() - start).num_seconds(), 72);
    }
}
