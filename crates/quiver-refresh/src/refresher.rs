//! The per-series refresh pipeline and batch orchestration.

use std::collections::BTreeSet;

use futures::stream::{self, Stream, StreamExt};
use quiver_fetch::{FetchOutcome, OutputSize, RequestExecutor};
use quiver_store::{CacheStore, MetadataRecord};
use quiver_types::{AssetClass, Instrument, QuiverError, SeriesKey};
use tracing::{debug, error, info, warn};

use crate::{RefreshOutcome, RefreshReport, RefreshStatus, RefreshTask, needs_refresh};

/// Default number of series refreshed concurrently in a batch.
///
/// The executor's gate still bounds in-flight requests per provider.
pub const DEFAULT_BATCH_CONCURRENCY: usize = 16;

/// Keeps cached series up to date.
#[derive(Debug, Clone)]
pub struct Refresher {
    executor: RequestExecutor,
    store: CacheStore,
    provider: String,
    concurrency: usize,
}

impl Refresher {
    /// Creates a refresher using the executor's configured provider.
    #[must_use]
    pub fn new(executor: RequestExecutor, store: CacheStore) -> Self {
        let provider = executor.config().provider.clone();
        Self {
            executor,
            store,
            provider,
            concurrency: DEFAULT_BATCH_CONCURRENCY,
        }
    }

    /// Sets how many series a batch works on at once.
    #[must_use]
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Returns the cache store.
    #[must_use]
    pub const fn store(&self) -> &CacheStore {
        &self.store
    }

    /// Returns the request executor.
    #[must_use]
    pub const fn executor(&self) -> &RequestExecutor {
        &self.executor
    }

    /// Refreshes one series if it is stale.
    ///
    /// A cached series is topped up with a compact fetch and merged; a
    /// missing or empty one is fetched at the configured output size. The series
    /// file is written before its sidecar.
    ///
    /// # Errors
    ///
    /// Returns the first failure of the pipeline. Nothing is written when
    /// the fetch or the merge fails.
    pub async fn refresh_one(&self, task: &RefreshTask) -> Result<RefreshOutcome, QuiverError> {
        let key = &task.key;
        // A header-only table has nothing to top up.
        let existing = self
            .store
            .read_series(key)
            .await?
            .filter(|series| !series.is_empty());
        let now = self.executor.clock().now();

        let output_size = match &existing {
            Some(series) => {
                if let Some(last) = series.last_date()
                    && !needs_refresh(last, task.max_gap_days, key.category, now)
                {
                    debug!(key = %key, %last, max_gap_days = task.max_gap_days, "up to date");
                    return Ok(RefreshOutcome::new(key.clone(), RefreshStatus::UpToDate)
                        .with_rows(series.len(), Some(last)));
                }
                OutputSize::Compact
            }
            None => self.executor.config().output_size,
        };

        info!(key = %key, %output_size, "refreshing");
        let payload = match self
            .executor
            .fetch_series(&key.instrument, key.category, output_size, &self.provider)
            .await?
        {
            FetchOutcome::Ready(payload) => payload,
            FetchOutcome::Empty => {
                warn!(key = %key, "no data received");
                return Ok(RefreshOutcome::new(key.clone(), RefreshStatus::Empty));
            }
            FetchOutcome::Throttled { attempts } => {
                warn!(key = %key, attempts, "skipped while throttled");
                return Ok(RefreshOutcome::new(key.clone(), RefreshStatus::Throttled));
            }
        };

        let merged = self
            .store
            .merge_and_persist(key, &payload.series, existing.as_ref())
            .await?;

        let mut record = MetadataRecord::from_fields(payload.metadata);
        if let Some(first) = merged.first_date() {
            record = record.with_first_date(first);
        }
        self.store.update_metadata(key, record, true).await?;

        let status = if existing.is_some() {
            RefreshStatus::Updated
        } else {
            RefreshStatus::Created
        };
        info!(key = %key, %status, rows = merged.len(), "saved");
        Ok(RefreshOutcome::new(key.clone(), status).with_rows(merged.len(), merged.last_date()))
    }

    /// Refreshes one series, folding any failure into the outcome.
    pub async fn refresh(&self, task: &RefreshTask) -> RefreshOutcome {
        match self.refresh_one(task).await {
            Ok(outcome) => outcome,
            Err(e) => {
                error!(key = %task.key, error = %e, "refresh failed");
                RefreshOutcome::failed(task.key.clone(), e)
            }
        }
    }

    /// Refreshes every task, yielding outcomes in task order.
    ///
    /// A failing series never stops the others.
    pub fn refresh_stream(
        &self,
        tasks: Vec<RefreshTask>,
    ) -> impl Stream<Item = RefreshOutcome> + '_ {
        stream::iter(tasks)
            .map(move |task| async move { self.refresh(&task).await })
            .buffered(self.concurrency)
    }

    /// Refreshes every task and collects a report.
    pub async fn refresh_all(&self, tasks: Vec<RefreshTask>) -> RefreshReport {
        let mut report = RefreshReport::start();
        let mut outcomes = std::pin::pin!(self.refresh_stream(tasks));
        while let Some(outcome) = outcomes.next().await {
            report.record(outcome);
        }
        report
    }

    /// Fills existing equity sidecars with symbol search results.
    ///
    /// With no `symbols`, every cached equity symbol is searched. Only a
    /// match whose symbol equals the cached folder name is used, and
    /// sidecars are never created. Returns the number of sidecars written.
    ///
    /// # Errors
    ///
    /// Returns an error if the cache cannot be listed. Per-symbol failures
    /// are logged and skipped.
    pub async fn enrich_metadata(&self, symbols: &[String]) -> Result<usize, QuiverError> {
        let cached: Vec<SeriesKey> = self
            .store
            .list_series()
            .await?
            .into_iter()
            .filter(|key| key.category.asset_class() == AssetClass::Equity)
            .collect();

        let wanted: BTreeSet<String> = if symbols.is_empty() {
            cached
                .iter()
                .filter_map(|key| match &key.instrument {
                    Instrument::Equity { symbol } => Some(symbol.clone()),
                    _ => None,
                })
                .collect()
        } else {
            symbols.iter().map(|s| s.trim().to_string()).collect()
        };

        let mut written = 0;
        for symbol in &wanted {
            match self.enrich_symbol(symbol, &cached).await {
                Ok(n) => written += n,
                Err(e) => warn!(instrument = %symbol, error = %e, "metadata enrichment failed"),
            }
        }
        Ok(written)
    }

    async fn enrich_symbol(
        &self,
        symbol: &str,
        cached: &[SeriesKey],
    ) -> Result<usize, QuiverError> {
        let matches = match self.executor.search(symbol, &self.provider).await? {
            FetchOutcome::Ready(matches) => matches,
            FetchOutcome::Empty => {
                debug!(instrument = %symbol, "no search matches");
                return Ok(0);
            }
            FetchOutcome::Throttled { attempts } => {
                return Err(QuiverError::ThrottleRetryExhausted {
                    instrument: symbol.to_string(),
                    attempts,
                });
            }
        };
        let Some(found) = matches.into_iter().find(|m| m.symbol() == Some(symbol)) else {
            debug!(instrument = %symbol, "no exact search match");
            return Ok(0);
        };
        let record = MetadataRecord::from_fields(found.into_fields());

        let mut written = 0;
        for key in cached {
            if !matches!(&key.instrument, Instrument::Equity { symbol: s } if s == symbol) {
                continue;
            }
            if self.store.update_metadata(key, record.clone(), false).await? {
                written += 1;
            }
        }
        debug!(instrument = %symbol, written, "metadata enriched");
        Ok(written)
    }
}
