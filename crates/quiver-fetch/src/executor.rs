//! Gated, throttle-aware request execution.

use std::sync::Arc;

use quiver_currencies::CurrencyRegistry;
use quiver_types::{Category, Instrument};
use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::{
    Clock, ClientConfig, ConcurrencyGate, FetchError, HttpSource, OutputSize, ProviderRequest,
    QuoteSource, ResponseKind, RetryState, SearchMatch, SeriesPayload, SystemClock, classify,
    parse_search, parse_series,
};

/// What a fetch produced.
///
/// `Empty` and `Throttled` mean "skip this cycle" and are never fatal.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome<T = SeriesPayload> {
    /// The provider returned data.
    Ready(T),
    /// The provider accepted the request but returned no rows.
    Empty,
    /// The provider kept throttling until the attempt limit.
    Throttled {
        /// Attempts made.
        attempts: u32,
    },
}

impl<T> FetchOutcome<T> {
    /// Returns the data, if any.
    pub fn ready(self) -> Option<T> {
        match self {
            Self::Ready(value) => Some(value),
            Self::Empty | Self::Throttled { .. } => None,
        }
    }
}

enum Attempted {
    Accepted(Value),
    Exhausted(u32),
}

/// Builds, gates and retries provider requests.
#[derive(Debug, Clone)]
pub struct RequestExecutor {
    source: Arc<dyn QuoteSource>,
    clock: Arc<dyn Clock>,
    gate: Arc<ConcurrencyGate>,
    config: ClientConfig,
}

impl RequestExecutor {
    /// Creates an executor from its collaborators.
    #[must_use]
    pub fn new(
        source: Arc<dyn QuoteSource>,
        clock: Arc<dyn Clock>,
        gate: Arc<ConcurrencyGate>,
        config: ClientConfig,
    ) -> Self {
        Self {
            source,
            clock,
            gate,
            config,
        }
    }

    /// Creates an executor talking HTTP on the system clock.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn from_config(config: ClientConfig) -> Result<Self, reqwest::Error> {
        let source = HttpSource::new(&config)?;
        let gate = ConcurrencyGate::new(config.capacity);
        Ok(Self::new(
            Arc::new(source),
            Arc::new(SystemClock),
            Arc::new(gate),
            config,
        ))
    }

    /// Returns the configuration.
    #[must_use]
    pub const fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Returns the clock.
    #[must_use]
    pub fn clock(&self) -> Arc<dyn Clock> {
        Arc::clone(&self.clock)
    }

    /// Returns the concurrency gate.
    #[must_use]
    pub const fn gate(&self) -> &Arc<ConcurrencyGate> {
        &self.gate
    }

    /// Fetches one series from `provider`.
    ///
    /// The instrument is validated before a gate token is taken, so a bad
    /// instrument never costs a request or a gate hold.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Validation`] for an instrument that does not fit
    /// the category, [`FetchError::Provider`] for a hard provider error, and
    /// transport or decoding errors as they occur.
    pub async fn fetch_series(
        &self,
        instrument: &Instrument,
        category: Category,
        output_size: OutputSize,
        provider: &str,
    ) -> Result<FetchOutcome, FetchError> {
        let request = ProviderRequest::series(instrument, category, output_size)?;
        CurrencyRegistry::global().check(instrument)?;

        match self.run_gated(provider, &request).await? {
            Attempted::Accepted(body) => {
                let payload = parse_series(&body).map_err(|source| FetchError::Parse {
                    subject: request.subject().to_string(),
                    source,
                })?;
                if payload.series.is_empty() {
                    warn!(instrument = %instrument, %category, "provider returned no rows");
                    return Ok(FetchOutcome::Empty);
                }
                debug!(
                    instrument = %instrument,
                    %category,
                    rows = payload.series.len(),
                    "series fetched"
                );
                Ok(FetchOutcome::Ready(payload))
            }
            Attempted::Exhausted(attempts) => Ok(FetchOutcome::Throttled { attempts }),
        }
    }

    /// Searches the provider for symbols matching `keywords`.
    ///
    /// # Errors
    ///
    /// Same as [`fetch_series`](Self::fetch_series), minus validation.
    pub async fn search(
        &self,
        keywords: &str,
        provider: &str,
    ) -> Result<FetchOutcome<Vec<SearchMatch>>, FetchError> {
        let request = ProviderRequest::search(keywords);
        match self.run_gated(provider, &request).await? {
            Attempted::Accepted(body) => {
                let matches = parse_search(&body).map_err(|source| FetchError::Parse {
                    subject: keywords.to_string(),
                    source,
                })?;
                if matches.is_empty() {
                    Ok(FetchOutcome::Empty)
                } else {
                    Ok(FetchOutcome::Ready(matches))
                }
            }
            Attempted::Exhausted(attempts) => Ok(FetchOutcome::Throttled { attempts }),
        }
    }

    /// Holds a gate token for the whole attempt loop plus the minimum hold.
    async fn run_gated(
        &self,
        provider: &str,
        request: &ProviderRequest,
    ) -> Result<Attempted, FetchError> {
        let permit = self.gate.acquire(provider).await?;
        let result = self.attempt(request).await;
        self.clock.sleep(self.config.min_gate_hold).await;
        permit.release();
        result
    }

    async fn attempt(&self, request: &ProviderRequest) -> Result<Attempted, FetchError> {
        let policy = self.config.retry_policy();
        let mut state = RetryState::start();
        let mut accepted = None;
        loop {
            match state {
                RetryState::Attempting { attempt } => {
                    debug!(subject = request.subject(), attempt, "attempting request");
                    let body = self.source.get_json(request).await?;
                    match classify(body) {
                        ResponseKind::HardError(message) => {
                            error!(
                                subject = request.subject(),
                                %message,
                                "not possible to retrieve"
                            );
                            return Err(FetchError::Provider {
                                subject: request.subject().to_string(),
                                message,
                            });
                        }
                        ResponseKind::Throttled => {
                            info!(
                                subject = request.subject(),
                                attempt, "max frequency reached, waiting"
                            );
                            state = state.on_throttled(&policy);
                        }
                        ResponseKind::Payload(body) => {
                            accepted = Some(body);
                            state = state.on_accepted();
                        }
                    }
                }
                RetryState::Cooldown { .. } => {
                    self.clock.sleep(policy.cooldown()).await;
                    state = state.after_cooldown();
                }
                RetryState::Exhausted { attempts } => {
                    warn!(
                        subject = request.subject(),
                        attempts, "still throttled after retry limit, skipping"
                    );
                    return Ok(Attempted::Exhausted(attempts));
                }
                RetryState::Succeeded { attempts } => {
                    debug!(subject = request.subject(), attempts, "payload accepted");
                    return Ok(Attempted::Accepted(accepted.take().unwrap_or_default()));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{RecordingClock, ScriptedSource, THROTTLE_NOTICE};
    use chrono::NaiveDate;
    use serde_json::json;
    use std::time::Duration;

    fn throttle() -> Value {
        json!({ "Note": format!("{THROTTLE_NOTICE} Please consider premium.") })
    }

    fn fx_body() -> Value {
        json!({
            "Meta Data": {"1. Information": "Forex Daily Prices", "2. From Symbol": "EUR"},
            "Time Series FX (Daily)": {
                "2024-01-02": {
                    "1. open": "1.10", "2. high": "1.11", "3. low": "1.09", "4. close": "1.105"
                },
                "2024-01-03": {
                    "1. open": "1.105", "2. high": "1.12", "3. low": "1.10", "4. close": "1.115"
                }
            }
        })
    }

    fn executor(
        bodies: Vec<Value>,
        retry_limit: u32,
    ) -> (RequestExecutor, Arc<ScriptedSource>, Arc<RecordingClock>) {
        let source = Arc::new(ScriptedSource::new(bodies));
        let clock = Arc::new(RecordingClock::new(
            NaiveDate::from_ymd_opt(2024, 1, 10)
                .unwrap()
                .and_hms_opt(12, 0, 0)
                .unwrap(),
        ));
        let config = ClientConfig {
            retry_limit,
            ..ClientConfig::default()
        };
        let executor = RequestExecutor::new(
            source.clone(),
            clock.clone(),
            Arc::new(ConcurrencyGate::new(1)),
            config,
        );
        (executor, source, clock)
    }

    fn eurusd() -> Instrument {
        Instrument::currency("EUR", "USD")
    }

    #[tokio::test]
    async fn test_throttled_twice_then_payload() {
        let (executor, source, clock) = executor(vec![throttle(), throttle(), fx_body()], 5);
        let outcome = executor
            .fetch_series(&eurusd(), Category::FxDaily, OutputSize::Compact, "vantage")
            .await
            .unwrap();

        let payload = outcome.ready().unwrap();
        assert_eq!(payload.series.len(), 2);
        assert_eq!(source.calls(), 3);
        assert_eq!(
            clock.sleeps(),
            vec![
                Duration::from_secs(60),
                Duration::from_secs(60),
                Duration::from_secs(12)
            ]
        );
        assert_eq!(executor.gate().outstanding("vantage"), 0);
    }

    #[tokio::test]
    async fn test_exhausted_returns_throttled() {
        let (executor, source, clock) = executor(vec![throttle()], 3);
        let outcome = executor
            .fetch_series(&eurusd(), Category::FxDaily, OutputSize::Full, "vantage")
            .await
            .unwrap();

        assert_eq!(outcome, FetchOutcome::Throttled { attempts: 3 });
        assert_eq!(source.calls(), 3);
        assert_eq!(clock.sleeps().len(), 3);
        assert_eq!(executor.gate().outstanding("vantage"), 0);
    }

    #[tokio::test]
    async fn test_hard_error_aborts_without_retry() {
        let (executor, source, clock) =
            executor(vec![json!({"Error Message": "Invalid API call."})], 5);
        let err = executor
            .fetch_series(&eurusd(), Category::FxDaily, OutputSize::Full, "vantage")
            .await
            .unwrap_err();

        assert!(matches!(err, FetchError::Provider { .. }));
        assert_eq!(source.calls(), 1);
        assert_eq!(clock.sleeps(), vec![Duration::from_secs(12)]);
        assert_eq!(executor.gate().outstanding("vantage"), 0);
    }

    #[tokio::test]
    async fn test_validation_happens_before_any_request() {
        let (executor, source, clock) = executor(vec![fx_body()], 5);
        let err = executor
            .fetch_series(
                &Instrument::equity("IBM"),
                Category::FxDaily,
                OutputSize::Full,
                "vantage",
            )
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Validation(_)));

        let err = executor
            .fetch_series(
                &Instrument::digital("EUR", "USD"),
                Category::DigitalDaily,
                OutputSize::Full,
                "vantage",
            )
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Validation(_)));

        assert_eq!(source.calls(), 0);
        assert!(clock.sleeps().is_empty());
    }

    #[tokio::test]
    async fn test_empty_series_is_skip() {
        let (executor, _, _) = executor(vec![json!({"Time Series FX (Daily)": {}})], 5);
        let outcome = executor
            .fetch_series(&eurusd(), Category::FxDaily, OutputSize::Full, "vantage")
            .await
            .unwrap();
        assert_eq!(outcome, FetchOutcome::Empty);
    }

    #[tokio::test]
    async fn test_search_goes_through_gate() {
        let body = json!({"bestMatches": [{
            "1. symbol": "IBM",
            "2. name": "International Business Machines",
            "9. matchScore": "1.0000"
        }]});
        let (executor, source, clock) = executor(vec![throttle(), body], 5);
        let matches = executor.search("IBM", "vantage").await.unwrap().ready().unwrap();
        assert_eq!(matches[0].symbol(), Some("IBM"));
        assert_eq!(source.requests()[0].function(), "SYMBOL_SEARCH");
        assert_eq!(clock.sleeps().len(), 2);
    }
}
