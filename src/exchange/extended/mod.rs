//! Extended exchange integration.
//!
//! The markets listing carries a funding rate per market, but those values
//! lag the per-market stats endpoint. The stats endpoint is rate limited, so
//! fresher values are pulled one market at a time by
//! [`ExtendedEnricher`](crate::market::ExtendedEnricher).

use anyhow::{Context, Result};
use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::{debug, info, instrument};

use crate::exchange::client::ApiClient;
use crate::exchange::de::decimal_str;
use crate::exchange::symbol::{base_of_pair, has_non_latin_letters};
use crate::exchange::traits::{Exchange, FundingRateSource, RateMap};
use crate::market::MarketStatsSource;

/// Base URL for Extended (Starknet) API.
pub const MAINNET_API_URL: &str = "https://api.starknet.extended.exchange";

const ACTIVE_STATUS: &str = "ACTIVE";

/// Response envelope of the markets listing.
#[derive(Debug, Clone, Deserialize)]
pub struct MarketsResponse {
    pub status: String,
    pub data: Vec<ExtendedMarket>,
}

/// A market in the listing.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtendedMarket {
    /// Market name, e.g. "BTC-USD"
    pub name: String,
    #[serde(default)]
    pub ui_name: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub asset_name: String,
    pub active: bool,
    pub status: String,
    pub market_stats: MarketStats,
}

impl ExtendedMarket {
    /// Whether the market is open for trading.
    pub fn is_tradable(&self) -> bool {
        self.active && self.status == ACTIVE_STATUS
    }

    /// Canonical symbol (part of the name before `-`).
    pub fn symbol(&self) -> &str {
        base_of_pair(&self.name)
    }
}

/// Funding fields of the market stats object.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketStats {
    #[serde(deserialize_with = "decimal_str")]
    pub funding_rate: Decimal,
}

/// Response envelope of the per-market stats endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct MarketStatsResponse {
    pub status: String,
    pub data: MarketStats,
}

/// Extended API client.
#[derive(Debug, Clone)]
pub struct ExtendedClient {
    api: ApiClient,
    base_url: String,
}

impl ExtendedClient {
    /// Create a new Extended client for mainnet.
    pub fn new() -> Result<Self> {
        Self::with_base_url(MAINNET_API_URL)
    }

    /// Create a new Extended client with a custom base URL.
    pub fn with_base_url(base_url: &str) -> Result<Self> {
        Ok(Self {
            api: ApiClient::new(Exchange::Extended)?,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Get active markets.
    #[instrument(skip(self), name = "extended_get_markets")]
    pub async fn get_markets(&self) -> Result<Vec<ExtendedMarket>> {
        let url = format!("{}/api/v1/info/markets", self.base_url);
        let response: MarketsResponse = self
            .api
            .get_json(&url)
            .await
            .context("Failed to fetch Extended markets")?;

        let active: Vec<ExtendedMarket> = response
            .data
            .into_iter()
            .filter(ExtendedMarket::is_tradable)
            .collect();

        info!("Extended markets fetched: {}", active.len());
        Ok(active)
    }

    /// Get funding rates from the markets listing, keyed by canonical symbol.
    #[instrument(skip(self), name = "extended_get_funding_rates")]
    pub async fn get_funding_rates(&self) -> Result<RateMap> {
        let rates: RateMap = self
            .get_markets()
            .await?
            .iter()
            .filter(|m| !has_non_latin_letters(m.symbol()))
            .map(|m| (m.symbol().to_string(), m.market_stats.funding_rate))
            .collect();

        debug!("Extended initial rates loaded: {}", rates.len());
        Ok(rates)
    }

    /// Get the current funding rate of a single market.
    #[instrument(skip(self), name = "extended_get_market_stats")]
    pub async fn get_market_funding_rate(&self, market: &str) -> Result<Decimal> {
        let url = format!(
            "{}/api/v1/info/markets/{}/stats",
            self.base_url,
            urlencoding::encode(market)
        );
        let response: MarketStatsResponse = self
            .api
            .get_json(&url)
            .await
            .with_context(|| format!("Failed to fetch Extended stats for {}", market))?;

        Ok(response.data.funding_rate)
    }
}

#[async_trait]
impl FundingRateSource for ExtendedClient {
    fn exchange(&self) -> Exchange {
        Exchange::Extended
    }

    async fn fetch_funding_rates(&self) -> Result<RateMap> {
        self.get_funding_rates().await
    }
}

#[async_trait]
impl MarketStatsSource for ExtendedClient {
    async fn list_markets(&self) -> Result<Vec<String>> {
        Ok(self.get_markets().await?.into_iter().map(|m| m.name).collect())
    }

    async fn market_funding_rate(&self, market: &str) -> Result<Decimal> {
        self.get_market_funding_rate(market).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exchange::error::AdapterError;
    use rust_decimal_macros::dec;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn markets_body() -> serde_json::Value {
        json!({
            "status": "OK",
            "data": [
                {"name": "BTC-USD", "uiName": "Bitcoin", "category": "L1", "assetName": "BTC",
                 "active": true, "status": "ACTIVE", "marketStats": {"fundingRate": "0.000013"}},
                {"name": "ETH-USD", "uiName": "Ethereum", "category": "L1", "assetName": "ETH",
                 "active": true, "status": "ACTIVE", "marketStats": {"fundingRate": "-0.00002"}},
                {"name": "OLD-USD", "uiName": "Old", "category": "L1", "assetName": "OLD",
                 "active": false, "status": "DELISTED", "marketStats": {"fundingRate": "0.01"}},
                {"name": "RDO-USD", "uiName": "Reduce", "category": "L1", "assetName": "RDO",
                 "active": true, "status": "REDUCE_ONLY", "marketStats": {"fundingRate": "0.02"}}
            ]
        })
    }

    #[tokio::test]
    async fn test_funding_rates_from_active_markets() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/info/markets"))
            .respond_with(ResponseTemplate::new(200).set_body_json(markets_body()))
            .mount(&server)
            .await;

        let client = ExtendedClient::with_base_url(&server.uri()).unwrap();
        let rates = client.fetch_funding_rates().await.unwrap();

        assert_eq!(rates.len(), 2);
        assert_eq!(rates["BTC"], dec!(0.000013));
        assert_eq!(rates["ETH"], dec!(-0.00002));

        let names = client.list_markets().await.unwrap();
        assert_eq!(names, vec!["BTC-USD".to_string(), "ETH-USD".to_string()]);
    }

    #[tokio::test]
    async fn test_market_stats() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/info/markets/BTC-USD/stats"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": "OK",
                "data": {"fundingRate": "0.0000421", "markPrice": "97000"}
            })))
            .mount(&server)
            .await;

        let client = ExtendedClient::with_base_url(&server.uri()).unwrap();
        let rate = client.market_funding_rate("BTC-USD").await.unwrap();
        assert_eq!(rate, dec!(0.0000421));

        // Unknown market: mock server answers 404
        assert!(client.market_funding_rate("NOPE-USD").await.is_err());
    }

    #[tokio::test]
    async fn test_listing_http_error_fails() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/info/markets"))
            .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
            .mount(&server)
            .await;

        let client = ExtendedClient::with_base_url(&server.uri()).unwrap();
        let err = client.fetch_funding_rates().await.unwrap_err();
        let adapter = err.downcast_ref::<AdapterError>().unwrap();
        assert!(matches!(
            adapter,
            AdapterError::Status { exchange: Exchange::Extended, .. }
        ));
        assert!(format!("{:#}", err).contains("maintenance"));
    }

    #[tokio::test]
    async fn test_malformed_stats_body_fails() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/info/markets/BTC-USD/stats"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": "OK",
                "data": {"fundingRate": "not-a-number"}
            })))
            .mount(&server)
            .await;

        let client = ExtendedClient::with_base_url(&server.uri()).unwrap();
        let err = client.market_funding_rate("BTC-USD").await.unwrap_err();
        let adapter = err.downcast_ref::<AdapterError>().unwrap();
        assert!(matches!(adapter, AdapterError::Malformed { .. }));
        assert!(format!("{:#}", err).contains("BTC-USD"));
    }
}
