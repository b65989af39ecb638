//! Lighter REST API client.

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use tracing::{debug, info, instrument};

use super::types::*;
use crate::exchange::client::ApiClient;
use crate::exchange::symbol::{base_of_pair, has_non_latin_letters};
use crate::exchange::traits::{Exchange, FundingRateSource, RateMap};

/// Base URL for Lighter mainnet API.
pub const MAINNET_API_URL: &str = "https://mainnet.zklighter.elliot.ai";

/// Venue tag of Lighter's own rates in the funding-rates feed.
const LIGHTER_VENUE: &str = "lighter";

/// Marker identifying spot markets in the markets list.
const SPOT_QUOTE_MARKER: &str = "/USDC";

/// Lighter API client.
#[derive(Debug, Clone)]
pub struct LighterClient {
    api: ApiClient,
    base_url: String,
}

impl LighterClient {
    /// Create a new Lighter client for mainnet.
    pub fn new() -> Result<Self> {
        Self::with_base_url(MAINNET_API_URL)
    }

    /// Create a new Lighter client with a custom base URL.
    pub fn with_base_url(base_url: &str) -> Result<Self> {
        Ok(Self {
            api: ApiClient::new(Exchange::Lighter)?,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Get Lighter's hourly funding rates keyed by symbol.
    #[instrument(skip(self), name = "lighter_get_funding_rates")]
    pub async fn get_funding_rates(&self) -> Result<RateMap> {
        let url = format!("{}/api/v1/funding-rates", self.base_url);
        let response: FundingRatesResponse = self
            .api
            .get_json(&url)
            .await
            .context("Failed to fetch Lighter funding rates")?;

        debug!(
            code = response.code,
            entries = response.funding_rates.len(),
            "Lighter funding feed received"
        );

        let rates: RateMap = response
            .funding_rates
            .into_iter()
            .filter(|r| r.exchange == LIGHTER_VENUE)
            .filter(|r| !has_non_latin_letters(&r.symbol))
            .map(|r| (r.symbol, r.rate))
            .collect();

        info!("Lighter rates fetched: {}", rates.len());
        Ok(rates)
    }

    /// Get all markets listed on Lighter.
    #[instrument(skip(self), name = "lighter_get_markets")]
    pub async fn get_markets(&self) -> Result<Vec<LighterMarket>> {
        let url = format!("{}/api/v1/markets", self.base_url);
        self.api
            .get_json(&url)
            .await
            .context("Failed to fetch Lighter markets")
    }

    /// Get spot markets (symbols quoted in USDC), keyed by base asset.
    #[instrument(skip(self), name = "lighter_get_spot_markets")]
    pub async fn get_spot_markets(&self) -> Result<HashMap<String, LighterSpotMarket>> {
        let spot: HashMap<String, LighterSpotMarket> = self
            .get_markets()
            .await?
            .into_iter()
            .filter(|m| m.symbol.contains(SPOT_QUOTE_MARKER))
            .map(|m| {
                let base = base_of_pair(&m.symbol).to_string();
                (
                    base,
                    LighterSpotMarket {
                        symbol: m.symbol,
                        market_index: m.market_index,
                    },
                )
            })
            .collect();

        info!("Lighter spot markets fetched: {}", spot.len());
        Ok(spot)
    }
}

#[async_trait]
impl FundingRateSource for LighterClient {
    fn exchange(&self) -> Exchange {
        Exchange::Lighter
    }

    async fn fetch_funding_rates(&self) -> Result<RateMap> {
        self.get_funding_rates().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_only_lighter_venue_rates_are_kept() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/funding-rates"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "code": 200,
                "funding_rates": [
                    {"market_id": 0, "exchange": "lighter", "symbol": "ETH", "rate": 0.00001},
                    {"market_id": 1, "exchange": "lighter", "symbol": "BTC", "rate": -0.00003},
                    {"market_id": 1, "exchange": "hyperliquid", "symbol": "BTC", "rate": 0.0005},
                    {"market_id": 9, "exchange": "lighter", "symbol": "测试", "rate": 0.1}
                ]
            })))
            .mount(&server)
            .await;

        let client = LighterClient::with_base_url(&server.uri()).unwrap();
        let rates = client.fetch_funding_rates().await.unwrap();

        assert_eq!(rates.len(), 2);
        assert_eq!(rates["ETH"], dec!(0.00001));
        assert_eq!(rates["BTC"], dec!(-0.00003));
    }

    #[tokio::test]
    async fn test_missing_field_fails() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/funding-rates"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"code": 200})))
            .mount(&server)
            .await;

        let client = LighterClient::with_base_url(&server.uri()).unwrap();
        assert!(client.fetch_funding_rates().await.is_err());
    }

    #[tokio::test]
    async fn test_spot_markets() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/markets"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"symbol": "ETH", "market_index": 0},
                {"symbol": "ETH/USDC", "market_index": 2048},
                {"symbol": "LIT/USDC", "market_index": 2049}
            ])))
            .mount(&server)
            .await;

        let client = LighterClient::with_base_url(&server.uri()).unwrap();
        let spot = client.get_spot_markets().await.unwrap();

        assert_eq!(spot.len(), 2);
        assert_eq!(spot["ETH"].symbol, "ETH/USDC");
        assert_eq!(spot["LIT"].market_index, 2049);
    }
}
