//! Hyperliquid REST API client.
//!
//! Provides read-only access to Hyperliquid market data:
//! - Perpetual funding rates (hourly) and mark prices
//! - Spot prices and volume for USDC pairs
//! - Predicted and historical funding

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use futures_util::future::join_all;
use rust_decimal::Decimal;
use std::collections::HashMap;
use tracing::{debug, info, instrument, warn};

use super::types::*;
use crate::arbitrage::SpotMarketData;
use crate::exchange::client::ApiClient;
use crate::exchange::error::AdapterError;
use crate::exchange::traits::{Exchange, FundingRateSource, RateMap};
use crate::utils::decimal::mean;

/// Base URL for Hyperliquid mainnet API.
pub const MAINNET_API_URL: &str = "https://api.hyperliquid.xyz";

/// Quote token for spot pairs considered for spot-perp hedging.
const SPOT_QUOTE_TOKEN: &str = "USDC";

/// Venue key for Hyperliquid's own perp in predictedFundings.
const HL_PERP_VENUE: &str = "HlPerp";

/// Hyperliquid API client for fetching market data.
#[derive(Debug, Clone)]
pub struct HyperliquidClient {
    api: ApiClient,
    base_url: String,
}

impl HyperliquidClient {
    /// Create a new Hyperliquid client for mainnet.
    pub fn new() -> Result<Self> {
        Self::with_base_url(MAINNET_API_URL)
    }

    /// Create a new Hyperliquid client with a custom base URL.
    pub fn with_base_url(base_url: &str) -> Result<Self> {
        Ok(Self {
            api: ApiClient::new(Exchange::Hyperliquid)?,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn info<T: serde::de::DeserializeOwned>(
        &self,
        request: &InfoRequest,
    ) -> Result<T, AdapterError> {
        let url = format!("{}/info", self.base_url);
        self.api.post_json(&url, request).await
    }

    /// Get metadata and asset contexts for all perpetuals.
    #[instrument(skip(self), name = "hl_meta_and_asset_ctxs")]
    pub async fn get_meta_and_asset_ctxs(&self) -> Result<(Meta, Vec<AssetCtx>)> {
        let data: MetaAndAssetCtxsResponse = self
            .info(&InfoRequest::MetaAndAssetCtxs)
            .await
            .context("Failed to fetch metaAndAssetCtxs")?;

        debug!("Fetched {} assets from Hyperliquid", data.0.universe.len());
        Ok(data)
    }

    /// Get funding rate and mark price for every perpetual, keyed by coin.
    #[instrument(skip(self), name = "hl_get_perp_markets")]
    pub async fn get_perp_markets(&self) -> Result<HashMap<String, PerpMarket>> {
        let (meta, ctxs) = self.get_meta_and_asset_ctxs().await?;

        if meta.universe.len() != ctxs.len() {
            return Err(AdapterError::malformed(
                Exchange::Hyperliquid,
                format!(
                    "mismatch between universe ({}) and contexts ({})",
                    meta.universe.len(),
                    ctxs.len()
                ),
            )
            .into());
        }

        let markets: HashMap<String, PerpMarket> = meta
            .universe
            .into_iter()
            .zip(ctxs)
            .map(|(m, c)| {
                (
                    m.name,
                    PerpMarket {
                        funding_rate: c.funding,
                        mark_price: c.mark_px,
                    },
                )
            })
            .collect();

        info!("Fetched {} Hyperliquid perpetual markets", markets.len());
        Ok(markets)
    }

    /// Get funding rates for all perpetuals.
    /// Returns a map of coin name -> hourly funding rate.
    #[instrument(skip(self), name = "hl_get_funding_rates")]
    pub async fn get_funding_rates(&self) -> Result<RateMap> {
        let rates: RateMap = self
            .get_perp_markets()
            .await?
            .into_iter()
            .map(|(coin, market)| (coin, market.funding_rate))
            .collect();

        debug!("Fetched {} funding rates from Hyperliquid", rates.len());
        Ok(rates)
    }

    /// Get spot market data for every `BASE/USDC` pair, keyed by base token.
    #[instrument(skip(self), name = "hl_get_spot_markets")]
    pub async fn get_spot_markets(&self) -> Result<HashMap<String, SpotMarketData>> {
        let (meta, ctxs): SpotMetaAndAssetCtxsResponse = self
            .info(&InfoRequest::SpotMetaAndAssetCtxs)
            .await
            .context("Failed to fetch spotMetaAndAssetCtxs")?;

        if meta.universe.len() != ctxs.len() {
            return Err(AdapterError::malformed(
                Exchange::Hyperliquid,
                format!(
                    "mismatch between spot universe ({}) and contexts ({})",
                    meta.universe.len(),
                    ctxs.len()
                ),
            )
            .into());
        }

        let tokens: HashMap<usize, &str> = meta
            .tokens
            .iter()
            .map(|t| (t.index, t.name.as_str()))
            .collect();

        let mut markets = HashMap::new();
        for (pair, ctx) in meta.universe.iter().zip(ctxs) {
            let [base_idx, quote_idx] = pair.tokens;
            let (Some(&base), Some(&quote)) = (tokens.get(&base_idx), tokens.get(&quote_idx)) else {
                debug!(pair = %pair.name, "Skipping spot pair with unknown token index");
                continue;
            };

            if quote != SPOT_QUOTE_TOKEN {
                continue;
            }

            markets.insert(
                base.to_string(),
                SpotMarketData {
                    symbol: base.to_string(),
                    price: ctx.mid_px.unwrap_or(ctx.mark_px),
                    volume_24h: ctx.day_ntl_vlm,
                },
            );
        }

        info!("Fetched {} Hyperliquid spot markets", markets.len());
        Ok(markets)
    }

    /// Get predicted next hourly funding on Hyperliquid, keyed by coin.
    #[instrument(skip(self), name = "hl_get_predicted_fundings")]
    pub async fn get_predicted_funding_rates(&self) -> Result<RateMap> {
        let data: PredictedFundingsResponse = self
            .info(&InfoRequest::PredictedFundings)
            .await
            .context("Failed to fetch predictedFundings")?;

        let rates: RateMap = data
            .into_iter()
            .filter_map(|(coin, venues)| {
                venues
                    .into_iter()
                    .find(|(venue, _)| venue == HL_PERP_VENUE)
                    .and_then(|(_, funding)| funding)
                    .map(|f| (coin, f.funding_rate))
            })
            .collect();

        debug!("Fetched {} predicted funding rates", rates.len());
        Ok(rates)
    }

    /// Get funding history for a specific coin.
    #[instrument(skip(self), name = "hl_get_funding_history")]
    pub async fn get_funding_history(
        &self,
        coin: &str,
        start_time: i64,
        end_time: Option<i64>,
    ) -> Result<Vec<FundingHistoryRecord>> {
        let request = InfoRequest::FundingHistory {
            coin: coin.to_string(),
            start_time,
            end_time,
        };

        let records: Vec<FundingHistoryRecord> = self
            .info(&request)
            .await
            .with_context(|| format!("Failed to fetch fundingHistory for {}", coin))?;

        debug!(
            "Fetched {} funding history records for {}",
            records.len(),
            coin
        );
        Ok(records)
    }

    /// Average hourly funding over the last `hours` for each coin.
    ///
    /// Requests run concurrently. Coins whose request fails or returns no
    /// records are logged and left out of the result. Fails only when the
    /// lookback window reaches outside the representable time range.
    #[instrument(skip(self, coins), fields(coins = coins.len()))]
    pub async fn historical_average_funding(
        &self,
        coins: &[String],
        hours: u32,
        now: DateTime<Utc>,
    ) -> Result<RateMap> {
        let end_time = now.timestamp_millis();
        let start_time = now
            .checked_sub_signed(ChronoDuration::hours(i64::from(hours)))
            .with_context(|| format!("Lookback of {} hours is out of range", hours))?
            .timestamp_millis();

        let results = join_all(coins.iter().map(|coin| async move {
            let history = self
                .get_funding_history(coin, start_time, Some(end_time))
                .await;
            (coin, history)
        }))
        .await;

        let mut averages = RateMap::new();
        for (coin, history) in results {
            match history {
                Ok(records) => {
                    let rates: Vec<Decimal> = records.iter().map(|r| r.funding_rate).collect();
                    if let Some(avg) = mean(&rates) {
                        averages.insert(coin.clone(), avg);
                    }
                }
                Err(e) => warn!("Error fetching funding history for {}: {:#}", coin, e),
            }
        }

        Ok(averages)
    }
}

#[async_trait]
impl FundingRateSource for HyperliquidClient {
    fn exchange(&self) -> Exchange {
        Exchange::Hyperliquid
    }

    async fn fetch_funding_rates(&self) -> Result<RateMap> {
        self.get_funding_rates().await
    }
}
