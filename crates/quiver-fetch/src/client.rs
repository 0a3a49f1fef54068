//! Provider configuration and HTTP transport.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::debug;

use crate::{FetchError, OutputSize, ProviderRequest, RetryPolicy, query::BASE_URL};

/// Name under which the default provider is gated.
pub const DEFAULT_PROVIDER: &str = "vantage";

/// Configuration for the request executor and its HTTP source.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Provider endpoint.
    pub base_url: String,
    /// Provider API key.
    pub api_key: String,
    /// Gate name of the provider.
    pub provider: String,
    /// Request timeout.
    pub timeout: Duration,
    /// Maximum attempts while throttled.
    pub retry_limit: u32,
    /// Wait after a throttle notice.
    pub cooldown: Duration,
    /// Wait before a gate token is returned.
    pub min_gate_hold: Duration,
    /// Simultaneous requests allowed per provider.
    pub capacity: usize,
    /// Output size used for first fetches.
    pub output_size: OutputSize,
    /// User agent string.
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: BASE_URL.to_string(),
            api_key: "demo".to_string(),
            provider: DEFAULT_PROVIDER.to_string(),
            timeout: Duration::from_secs(30),
            retry_limit: 5,
            cooldown: Duration::from_secs(60),
            min_gate_hold: Duration::from_secs(12),
            capacity: 1,
            output_size: OutputSize::Full,
            user_agent: format!("quiver/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl ClientConfig {
    /// Returns the retry policy described by this configuration.
    #[must_use]
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.retry_limit, self.cooldown)
    }
}

/// Something that answers provider requests with JSON bodies.
#[async_trait]
pub trait QuoteSource: Send + Sync + std::fmt::Debug {
    /// Performs one attempt of `request` and returns the decoded body.
    async fn get_json(&self, request: &ProviderRequest) -> Result<Value, FetchError>;
}

/// [`QuoteSource`] backed by the provider's HTTP endpoint.
#[derive(Debug, Clone)]
pub struct HttpSource {
    client: Client,
    base_url: String,
    api_key: String,
}

impl HttpSource {
    /// Creates an HTTP source from the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(config: &ClientConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .pool_idle_timeout(Duration::from_secs(90))
            .tcp_nodelay(true)
            .timeout(config.timeout)
            .connect_timeout(Duration::from_secs(10))
            .user_agent(&config.user_agent)
            .gzip(true)
            .build()?;
        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            api_key: config.api_key.clone(),
        })
    }
}

#[async_trait]
impl QuoteSource for HttpSource {
    async fn get_json(&self, request: &ProviderRequest) -> Result<Value, FetchError> {
        let url = request.url(&self.base_url, &self.api_key)?;
        debug!(url = %request.redacted_url(&self.base_url), "provider request");

        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
            });
        }
        Ok(response.json::<Value>().await?)
    }
}

/// [`QuoteSource`] that replays canned bodies in order.
///
/// Once the script runs out, the last body is repeated. Used to drive the
/// executor offline.
#[derive(Debug, Default)]
pub struct ScriptedSource {
    state: Mutex<ScriptState>,
}

#[derive(Debug, Default)]
struct ScriptState {
    bodies: VecDeque<Value>,
    last: Option<Value>,
    requests: Vec<ProviderRequest>,
}

impl ScriptedSource {
    /// Creates a source answering with `bodies` in order.
    #[must_use]
    pub fn new(bodies: impl IntoIterator<Item = Value>) -> Self {
        Self {
            state: Mutex::new(ScriptState {
                bodies: bodies.into_iter().collect(),
                last: None,
                requests: Vec::new(),
            }),
        }
    }

    /// Returns the requests received so far.
    #[must_use]
    pub fn requests(&self) -> Vec<ProviderRequest> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .requests
            .clone()
    }

    /// Returns the number of requests received so far.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.requests().len()
    }
}

#[async_trait]
impl QuoteSource for ScriptedSource {
    async fn get_json(&self, request: &ProviderRequest) -> Result<Value, FetchError> {
        let mut state = self
            .state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        state.requests.push(request.clone());
        let body = match state.bodies.pop_front() {
            Some(body) => body,
            None => state.last.clone().unwrap_or(Value::Null),
        };
        state.last = Some(body.clone());
        Ok(body)
    }
}
