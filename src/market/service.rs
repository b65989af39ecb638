//! Refresh service: concurrent fan-out to every funding source behind a TTL
//! cache.

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use futures_util::future::{join_all, try_join_all};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, instrument, warn};

use super::cache::{CacheLookup, RateCache, RateSnapshot};
use super::clock::{Clock, SystemClock};
use crate::config::Config;
use crate::exchange::{AdapterError, Exchange, FundingRateSource, RateMap};

/// Default per-adapter request timeout.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// What a refresh does when some exchanges fail.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Any failure fails the whole refresh.
    #[default]
    FailFast,
    /// Failed exchanges contribute an empty map; only a total failure fails.
    Degrade,
}

/// Owns the funding sources and the shared rate cache.
pub struct FundingService {
    sources: Vec<Arc<dyn FundingRateSource>>,
    cache: RwLock<RateCache>,
    refresh_lock: Mutex<()>,
    policy: FailurePolicy,
    request_timeout: Duration,
    clock: Arc<dyn Clock>,
}

impl FundingService {
    pub fn new(sources: Vec<Arc<dyn FundingRateSource>>) -> Self {
        Self {
            sources,
            cache: RwLock::new(RateCache::default()),
            refresh_lock: Mutex::new(()),
            policy: FailurePolicy::default(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            clock: Arc::new(SystemClock),
        }
    }

    /// Service with TTL, timeout and failure policy taken from `config`.
    pub fn from_config(config: &Config, sources: Vec<Arc<dyn FundingRateSource>>) -> Self {
        Self::new(sources)
            .with_ttl(Duration::from_secs(config.cache.ttl_secs))
            .with_request_timeout(Duration::from_secs(config.exchanges.request_timeout_secs))
            .with_policy(config.aggregation.failure_policy)
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        let millis = i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX);
        self.cache = RwLock::new(RateCache::new(chrono::Duration::milliseconds(millis)));
        self
    }

    pub fn with_policy(mut self, policy: FailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn policy(&self) -> FailurePolicy {
        self.policy
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// [`get_or_refresh`](Self::get_or_refresh) at the service clock's time.
    pub async fn get(&self) -> Result<CacheLookup> {
        self.get_or_refresh(self.clock.now()).await
    }

    /// Cached rates when still fresh at `now`, otherwise fetch every source.
    ///
    /// A failed fetch returns the previous snapshot as [`CacheLookup::Stale`]
    /// when one exists, and an error otherwise.
    #[instrument(skip(self))]
    pub async fn get_or_refresh(&self, now: DateTime<Utc>) -> Result<CacheLookup> {
        if let Some(snapshot) = self.cache.read().await.fresh(now) {
            debug!(fetched_at = %snapshot.fetched_at, "Serving cached funding rates");
            return Ok(CacheLookup::Fresh(snapshot.clone()));
        }

        let _guard = self.refresh_lock.lock().await;

        // Another caller may have refreshed while we waited
        if let Some(snapshot) = self.cache.read().await.fresh(now) {
            return Ok(CacheLookup::Fresh(snapshot.clone()));
        }

        match self.fetch_all(now).await {
            Ok(snapshot) => {
                info!(
                    symbols = snapshot.symbol_count(),
                    failed = snapshot.failed_exchanges.len(),
                    "Funding rates refreshed"
                );
                self.cache.write().await.store(snapshot.clone());
                Ok(CacheLookup::Fresh(snapshot))
            }
            Err(e) => {
                let mut cache = self.cache.write().await;
                cache.invalidate();
                match cache.snapshot() {
                    Some(previous) => {
                        warn!(error = %format!("{:#}", e), "Refresh failed, serving stale rates");
                        Ok(CacheLookup::Stale {
                            snapshot: previous.clone(),
                            reason: format!("{:#}", e),
                        })
                    }
                    None => Err(e),
                }
            }
        }
    }

    /// Copy of the last stored snapshot, fresh or not.
    pub async fn snapshot(&self) -> Option<RateSnapshot> {
        self.cache.read().await.snapshot().cloned()
    }

    /// Overwrite a single cached rate. Returns false when nothing is cached.
    pub async fn apply_rate_update(&self, exchange: Exchange, symbol: &str, rate: Decimal) -> bool {
        self.cache.write().await.update_rate(exchange, symbol, rate)
    }

    async fn fetch_all(&self, now: DateTime<Utc>) -> Result<RateSnapshot> {
        if self.sources.is_empty() {
            bail!("No funding sources configured");
        }

        let fetches = self.sources.iter().map(|s| self.fetch_one(s.as_ref()));

        match self.policy {
            FailurePolicy::FailFast => {
                let results = try_join_all(fetches)
                    .await
                    .context("Failed to refresh funding rates")?;
                Ok(RateSnapshot::new(results.into_iter().collect(), now))
            }
            FailurePolicy::Degrade => {
                let results = join_all(fetches).await;

                let mut rates = BTreeMap::new();
                let mut failed_exchanges = Vec::new();
                let mut errors = Vec::new();

                for (source, result) in self.sources.iter().zip(results) {
                    match result {
                        Ok((exchange, map)) => {
                            rates.insert(exchange, map);
                        }
                        Err(e) => {
                            let exchange = source.exchange();
                            warn!(%exchange, error = %format!("{:#}", e), "Exchange fetch failed, continuing without it");
                            rates.insert(exchange, RateMap::new());
                            failed_exchanges.push(exchange);
                            errors.push(format!("{:#}", e));
                        }
                    }
                }

                if failed_exchanges.len() == self.sources.len() {
                    bail!("Every exchange failed: {}", errors.join("; "));
                }

                Ok(RateSnapshot {
                    rates,
                    fetched_at: now,
                    failed_exchanges,
                })
            }
        }
    }

    async fn fetch_one(&self, source: &dyn FundingRateSource) -> Result<(Exchange, RateMap)> {
        let exchange = source.exchange();

        match tokio::time::timeout(self.request_timeout, source.fetch_funding_rates()).await {
            Ok(Ok(rates)) => {
                info!(%exchange, count = rates.len(), "Fetched funding rates");
                Ok((exchange, rates))
            }
            Ok(Err(e)) => Err(e),
            Err(_) => Err(AdapterError::Timeout {
                exchange,
                timeout: self.request_timeout,
            }
            .into()),
        }
    }
}
