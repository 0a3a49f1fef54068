//! Per-provider bound on in-flight requests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::{debug, warn};

use crate::FetchError;

/// Bounds the number of simultaneous requests per named provider.
///
/// Each provider gets a fixed number of tokens on first use. Callers
/// suspend in [`acquire`](Self::acquire) until a token is free. A token is
/// returned when its [`GatePermit`] is released or dropped, so a release
/// can never happen without a matching acquire.
#[derive(Debug)]
pub struct ConcurrencyGate {
    default_capacity: usize,
    capacities: HashMap<String, usize>,
    pools: Mutex<HashMap<String, Arc<Semaphore>>>,
}

impl ConcurrencyGate {
    /// Creates a gate giving every provider `default_capacity` tokens.
    ///
    /// A capacity of zero is raised to one.
    #[must_use]
    pub fn new(default_capacity: usize) -> Self {
        Self {
            default_capacity: default_capacity.max(1),
            capacities: HashMap::new(),
            pools: Mutex::new(HashMap::new()),
        }
    }

    /// Overrides the capacity of one provider.
    #[must_use]
    pub fn with_capacity(mut self, provider: impl Into<String>, capacity: usize) -> Self {
        self.capacities.insert(provider.into(), capacity.max(1));
        self
    }

    /// Returns the capacity of `provider`.
    #[must_use]
    pub fn capacity(&self, provider: &str) -> usize {
        self.capacities
            .get(provider)
            .copied()
            .unwrap_or(self.default_capacity)
    }

    fn lock_pools(&self) -> MutexGuard<'_, HashMap<String, Arc<Semaphore>>> {
        self.pools.lock().unwrap_or_else(|poisoned| {
            warn!("Concurrency gate mutex was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    fn pool(&self, provider: &str) -> Arc<Semaphore> {
        let mut pools = self.lock_pools();
        Arc::clone(
            pools
                .entry(provider.to_string())
                .or_insert_with(|| Arc::new(Semaphore::new(self.capacity(provider)))),
        )
    }

    /// Waits for a token of `provider`.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::GateClosed`] if the provider's pool was closed.
    pub async fn acquire(&self, provider: &str) -> Result<GatePermit, FetchError> {
        let pool = self.pool(provider);
        let permit = pool
            .acquire_owned()
            .await
            .map_err(|_| FetchError::GateClosed(provider.to_string()))?;
        debug!(provider, available = self.available(provider), "gate token acquired");
        Ok(GatePermit {
            provider: provider.to_string(),
            permit,
        })
    }

    /// Returns the number of free tokens of `provider`.
    #[must_use]
    pub fn available(&self, provider: &str) -> usize {
        self.pool(provider).available_permits()
    }

    /// Returns the number of tokens of `provider` currently held.
    #[must_use]
    pub fn outstanding(&self, provider: &str) -> usize {
        self.capacity(provider) - self.available(provider)
    }

    /// Closes the pool of `provider`; pending and later acquires fail.
    pub fn close(&self, provider: &str) {
        self.pool(provider).close();
    }
}

/// A held gate token. Dropping it returns the token.
#[derive(Debug)]
#[must_use = "dropping a permit releases the gate token immediately"]
pub struct GatePermit {
    provider: String,
    permit: OwnedSemaphorePermit,
}

impl GatePermit {
    /// Returns the provider the token belongs to.
    #[must_use]
    pub fn provider(&self) -> &str {
        &self.provider
    }

    /// Returns the token to the gate.
    pub fn release(self) {
        debug!(provider = %self.provider, "gate token released");
        drop(self.permit);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn test_gate_never_exceeds_capacity() {
        let gate = Arc::new(ConcurrencyGate::new(1).with_capacity("vantage", 3));
        let in_flight = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let tasks: Vec<_> = (0..20)
            .map(|_| {
                let gate = Arc::clone(&gate);
                let in_flight = Arc::clone(&in_flight);
                let peak = Arc::clone(&peak);
                tokio::spawn(async move {
                    let permit = gate.acquire("vantage").await.unwrap();
                    let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(2)).await;
                    in_flight.fetch_sub(1, Ordering::SeqCst);
                    permit.release();
                })
            })
            .collect();
        for task in tasks {
            task.await.unwrap();
        }

        assert!(peak.load(Ordering::SeqCst) <= 3);
        assert_eq!(gate.outstanding("vantage"), 0);
        assert_eq!(gate.available("vantage"), 3);
    }

    #[tokio::test]
    async fn test_providers_are_independent() {
        let gate = ConcurrencyGate::new(1);
        let a = gate.acquire("a").await.unwrap();
        let b = gate.acquire("b").await.unwrap();
        assert_eq!(gate.outstanding("a"), 1);
        assert_eq!(gate.outstanding("b"), 1);
        assert_eq!(a.provider(), "a");
        a.release();
        drop(b);
        assert_eq!(gate.outstanding("a"), 0);
        assert_eq!(gate.outstanding("b"), 0);
    }

    #[tokio::test]
    async fn test_zero_capacity_is_raised() {
        let gate = ConcurrencyGate::new(0);
        assert_eq!(gate.capacity("x"), 1);
        let _permit = gate.acquire("x").await.unwrap();
        assert_eq!(gate.available("x"), 0);
    }

    #[tokio::test]
    async fn test_closed_gate_fails() {
        let gate = ConcurrencyGate::new(1);
        gate.close("x");
        assert!(matches!(
            gate.acquire("x").await,
            Err(FetchError::GateClosed(_))
        ));
    }
}
