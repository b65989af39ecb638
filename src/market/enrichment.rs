//! Background walk over Extended markets, refreshing one market's funding
//! rate per tick from its stats endpoint.

use anyhow::{Context, Result};
use async_trait::async_trait;
use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::service::FundingService;
use crate::exchange::symbol::base_of_pair;
use crate::exchange::Exchange;

/// Default delay between two per-market requests.
pub const DEFAULT_ENRICHMENT_INTERVAL: Duration = Duration::from_secs(1);

/// Per-market funding lookups.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MarketStatsSource: Send + Sync {
    /// Names of the markets to walk, e.g. `BTC-USD`.
    async fn list_markets(&self) -> Result<Vec<String>>;

    /// Current funding rate of one market.
    async fn market_funding_rate(&self, market: &str) -> Result<Decimal>;
}

/// Counters reported when the walk ends.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EnrichmentSummary {
    pub updated: usize,
    pub failed: usize,
    pub cancelled: bool,
}

pub struct ExtendedEnricher {
    source: Arc<dyn MarketStatsSource>,
    service: Arc<FundingService>,
    interval: Duration,
}

impl ExtendedEnricher {
    pub fn new(source: Arc<dyn MarketStatsSource>, service: Arc<FundingService>) -> Self {
        Self {
            source,
            service,
            interval: DEFAULT_ENRICHMENT_INTERVAL,
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Run the walk on the tokio runtime.
    pub fn spawn(self) -> EnrichmentHandle {
        let token = CancellationToken::new();
        let child = token.clone();
        let task = tokio::spawn(async move { self.run(child).await });
        EnrichmentHandle { token, task }
    }

    /// Walk every market once, stopping early if `token` is cancelled.
    pub async fn run(&self, token: CancellationToken) -> Result<EnrichmentSummary> {
        let mut summary = EnrichmentSummary::default();

        let markets = tokio::select! {
            biased;
            _ = token.cancelled() => {
                summary.cancelled = true;
                return Ok(summary);
            }
            markets = self.source.list_markets() => {
                markets.context("Failed to list Extended markets")?
            }
        };

        info!(markets = markets.len(), interval_ms = self.interval.as_millis() as u64, "Starting Extended enrichment");

        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        for market in &markets {
            tokio::select! {
                biased;
                _ = token.cancelled() => {
                    summary.cancelled = true;
                    break;
                }
                _ = ticker.tick() => {}
            }

            match self.source.market_funding_rate(market).await {
                Ok(rate) => {
                    let symbol = base_of_pair(market);
                    if self
                        .service
                        .apply_rate_update(Exchange::Extended, symbol, rate)
                        .await
                    {
                        debug!(market = %market, %rate, "Updated Extended funding rate");
                        summary.updated += 1;
                    } else {
                        warn!(market = %market, "No cached rates to update");
                        summary.failed += 1;
                    }
                }
                Err(e) => {
                    warn!(market = %market, error = %format!("{:#}", e), "Skipping market");
                    summary.failed += 1;
                }
            }
        }

        info!(
            updated = summary.updated,
            failed = summary.failed,
            cancelled = summary.cancelled,
            "Extended enrichment finished"
        );
        Ok(summary)
    }
}

/// Control over a spawned enrichment walk.
pub struct EnrichmentHandle {
    token: CancellationToken,
    task: JoinHandle<Result<EnrichmentSummary>>,
}

impl EnrichmentHandle {
    /// Stop at the next tick.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Wait for the walk to end.
    pub async fn join(self) -> Result<EnrichmentSummary> {
        self.task.await.context("Enrichment task panicked")?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exchange::{RateMap, StaticRateSource};
    use chrono::{TimeZone, Utc};
    use rust_decimal_macros::dec;

    async fn seeded_service() -> Arc<FundingService> {
        let source = Arc::new(StaticRateSource::new(
            Exchange::Extended,
            RateMap::from([("BTC".to_string(), dec!(0.0001))]),
        ));
        let service = Arc::new(FundingService::new(vec![source]));
        let t0 = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
        service.get_or_refresh(t0).await.unwrap();
        service
    }

    fn extended_rate(snapshot: &crate::market::RateSnapshot, symbol: &str) -> Option<Decimal> {
        snapshot.rates[&Exchange::Extended].get(symbol).copied()
    }

    #[tokio::test]
    async fn test_walk_updates_and_skips_failures() {
        let service = seeded_service().await;

        let mut source = MockMarketStatsSource::new();
        source.expect_list_markets().times(1).returning(|| {
            Ok(vec![
                "BTC-USD".to_string(),
                "BAD-USD".to_string(),
                "ETH-USD".to_string(),
            ])
        });
        source
            .expect_market_funding_rate()
            .times(3)
            .returning(|market| match market {
                "BTC-USD" => Ok(dec!(0.0004)),
                "ETH-USD" => Ok(dec!(-0.0001)),
                _ => Err(anyhow::anyhow!("Extended API error 404")),
            });

        let handle = ExtendedEnricher::new(Arc::new(source), service.clone())
            .with_interval(Duration::from_millis(1))
            .spawn();
        let summary = handle.join().await.unwrap();

        assert_eq!(
            summary,
            EnrichmentSummary {
                updated: 2,
                failed: 1,
                cancelled: false
            }
        );
        let snapshot = service.snapshot().await.unwrap();
        assert_eq!(extended_rate(&snapshot, "BTC"), Some(dec!(0.0004)));
        assert_eq!(extended_rate(&snapshot, "ETH"), Some(dec!(-0.0001)));
        assert_eq!(extended_rate(&snapshot, "BAD"), None);
    }

    #[tokio::test]
    async fn test_cancel_stops_walk() {
        let service = seeded_service().await;

        let mut source = MockMarketStatsSource::new();
        source
            .expect_list_markets()
            .times(1)
            .returning(|| Ok(vec!["BTC-USD".to_string(), "ETH-USD".to_string()]));
        source
            .expect_market_funding_rate()
            .times(1)
            .returning(|_| Ok(dec!(0.0007)));

        let handle = ExtendedEnricher::new(Arc::new(source), service.clone())
            .with_interval(Duration::from_secs(3600))
            .spawn();

        // First tick fires immediately; wait for it to land
        for _ in 0..200 {
            let snapshot = service.snapshot().await.unwrap();
            if extended_rate(&snapshot, "BTC") == Some(dec!(0.0007)) {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }

        handle.cancel();
        let summary = handle.join().await.unwrap();

        assert!(summary.cancelled);
        assert_eq!(summary.updated, 1);
        assert_eq!(summary.failed, 0);
    }

    #[tokio::test]
    async fn test_listing_failure_is_an_error() {
        let service = seeded_service().await;

        let mut source = MockMarketStatsSource::new();
        source
            .expect_list_markets()
            .returning(|| Err(anyhow::anyhow!("Extended API error 500")));

        let err = ExtendedEnricher::new(Arc::new(source), service)
            .spawn()
            .join()
            .await
            .unwrap_err();
        assert!(format!("{:#}", err).contains("Failed to list Extended markets"));
    }
}
