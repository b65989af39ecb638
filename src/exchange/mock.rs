//! In-memory funding source for tests and offline runs.

use anyhow::Result;
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use super::traits::{Exchange, FundingRateSource, RateMap};

/// Funding source that serves a fixed mapping, or a fixed error, and counts
/// how often it was asked.
#[derive(Debug)]
pub struct StaticRateSource {
    exchange: Exchange,
    response: Mutex<Result<RateMap, String>>,
    delay: Option<Duration>,
    calls: AtomicUsize,
}

impl StaticRateSource {
    /// Source answering with `rates`.
    pub fn new(exchange: Exchange, rates: RateMap) -> Self {
        Self {
            exchange,
            response: Mutex::new(Ok(rates)),
            delay: None,
            calls: AtomicUsize::new(0),
        }
    }

    /// Source failing with `message` on every call.
    pub fn failing(exchange: Exchange, message: &str) -> Self {
        Self {
            exchange,
            response: Mutex::new(Err(message.to_string())),
            delay: None,
            calls: AtomicUsize::new(0),
        }
    }

    /// Delay every response by `delay`.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Replace the response served by subsequent calls.
    pub fn set_response(&self, response: Result<RateMap, String>) {
        if let Ok(mut guard) = self.response.lock() {
            *guard = response;
        }
    }

    /// Number of fetches performed so far.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl FundingRateSource for StaticRateSource {
    fn exchange(&self) -> Exchange {
        self.exchange
    }

    async fn fetch_funding_rates(&self) -> Result<RateMap> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let response = self
            .response
            .lock()
            .map_err(|_| anyhow::anyhow!("{} mock state poisoned", self.exchange))?
            .clone();

        response.map_err(|message| anyhow::anyhow!("{} API error: {}", self.exchange, message))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn test_static_source_counts_calls() {
        let source = StaticRateSource::new(
            Exchange::Aster,
            RateMap::from([("BTC".to_string(), dec!(0.0001))]),
        );

        assert_eq!(source.call_count(), 0);
        let rates = source.fetch_funding_rates().await.unwrap();
        assert_eq!(rates["BTC"], dec!(0.0001));
        assert_eq!(source.call_count(), 1);

        source.set_response(Err("boom".to_string()));
        let err = source.fetch_funding_rates().await.unwrap_err();
        assert_eq!(err.to_string(), "Aster API error: boom");
        assert_eq!(source.call_count(), 2);
    }
}
