//! Retry state machine for throttled requests.

use std::time::Duration;

/// Attempt limit and cooldown applied to throttled responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    limit: u32,
    cooldown: Duration,
}

impl RetryPolicy {
    /// Creates a policy; a limit of zero is raised to one attempt.
    #[must_use]
    pub fn new(limit: u32, cooldown: Duration) -> Self {
        Self {
            limit: limit.max(1),
            cooldown,
        }
    }

    /// Maximum number of attempts.
    #[must_use]
    pub const fn limit(&self) -> u32 {
        self.limit
    }

    /// Wait between a throttled attempt and the next one.
    #[must_use]
    pub const fn cooldown(&self) -> Duration {
        self.cooldown
    }
}

/// Progress of one request through its attempts.
///
/// ```text
/// Attempting(n) --throttled, n < limit--> Cooldown(n) --slept--> Attempting(n + 1)
/// Attempting(n) --throttled, n = limit--> Exhausted(n)
/// Attempting(n) --accepted-------------> Succeeded(n)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryState {
    /// Attempt number `attempt` (1-based) is in flight.
    Attempting {
        /// Current attempt.
        attempt: u32,
    },
    /// Attempt `attempt` was throttled; waiting before the next one.
    Cooldown {
        /// Attempt that was throttled.
        attempt: u32,
    },
    /// A payload was accepted.
    Succeeded {
        /// Attempts used.
        attempts: u32,
    },
    /// Every attempt was throttled.
    Exhausted {
        /// Attempts used.
        attempts: u32,
    },
}

impl RetryState {
    /// The state before the first attempt.
    #[must_use]
    pub const fn start() -> Self {
        Self::Attempting { attempt: 1 }
    }

    /// Transition on a throttle notice.
    #[must_use]
    pub const fn on_throttled(self, policy: &RetryPolicy) -> Self {
        match self {
            Self::Attempting { attempt } if attempt >= policy.limit => {
                Self::Exhausted { attempts: attempt }
            }
            Self::Attempting { attempt } => Self::Cooldown { attempt },
            other => other,
        }
    }

    /// Transition on an accepted payload.
    #[must_use]
    pub const fn on_accepted(self) -> Self {
        match self {
            Self::Attempting { attempt } => Self::Succeeded { attempts: attempt },
            other => other,
        }
    }

    /// Transition once the cooldown has elapsed.
    #[must_use]
    pub const fn after_cooldown(self) -> Self {
        match self {
            Self::Cooldown { attempt } => Self::Attempting {
                attempt: attempt + 1,
            },
            other => other,
        }
    }

    /// Returns true once no further attempt will be made.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded { .. } | Self::Exhausted { .. })
    }

    /// Returns the number of attempts started so far.
    #[must_use]
    pub const fn attempts(&self) -> u32 {
        match *self {
            Self::Attempting { attempt } | Self::Cooldown { attempt } => attempt,
            Self::Succeeded { attempts } | Self::Exhausted { attempts } => attempts,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_throttled_twice_then_accepted() {
        let policy = RetryPolicy::new(5, Duration::from_secs(60));
        let mut state = RetryState::start();
        let mut cooldowns = 0;
        for throttled in [true, true, false] {
            state = if throttled {
                state.on_throttled(&policy)
            } else {
                state.on_accepted()
            };
            if let RetryState::Cooldown { .. } = state {
                cooldowns += 1;
                state = state.after_cooldown();
            }
        }
        assert_eq!(state, RetryState::Succeeded { attempts: 3 });
        assert_eq!(cooldowns, 2);
    }

    #[test]
    fn test_exhausted_at_limit_without_final_cooldown() {
        let policy = RetryPolicy::new(2, Duration::from_secs(1));
        let state = RetryState::start().on_throttled(&policy);
        assert_eq!(state, RetryState::Cooldown { attempt: 1 });
        let state = state.after_cooldown().on_throttled(&policy);
        assert_eq!(state, RetryState::Exhausted { attempts: 2 });
        assert!(state.is_terminal());
        assert_eq!(state.after_cooldown(), state);
    }

    #[test]
    fn test_zero_limit_still_attempts_once() {
        let policy = RetryPolicy::new(0, Duration::ZERO);
        assert_eq!(policy.limit(), 1);
        assert_eq!(
            RetryState::start().on_throttled(&policy),
            RetryState::Exhausted { attempts: 1 }
        );
    }
}
