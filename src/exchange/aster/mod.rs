//! Aster exchange integration.
//!
//! Aster exposes a Binance-style `fapi/v1/fundingRate` endpoint listing recent
//! funding records for `XXXUSDT` perpetuals.

use anyhow::{Context, Result};
use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::HashMap;
use tracing::{info, instrument, trace};

use crate::exchange::client::ApiClient;
use crate::exchange::de::decimal_str;
use crate::exchange::symbol::{has_non_latin_letters, strip_quote_suffix};
use crate::exchange::traits::{Exchange, FundingRateSource, RateMap};

/// Base URL for Aster futures API.
pub const MAINNET_API_URL: &str = "https://fapi.asterdex.com";

const QUOTE_SUFFIX: &str = "USDT";

/// One funding record.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AsterFundingRate {
    pub symbol: String,
    pub funding_time: i64,
    #[serde(deserialize_with = "decimal_str")]
    pub funding_rate: Decimal,
}

/// Aster API client.
#[derive(Debug, Clone)]
pub struct AsterClient {
    api: ApiClient,
    base_url: String,
}

impl AsterClient {
    /// Create a new Aster client for mainnet.
    pub fn new() -> Result<Self> {
        Self::with_base_url(MAINNET_API_URL)
    }

    /// Create a new Aster client with a custom base URL.
    pub fn with_base_url(base_url: &str) -> Result<Self> {
        Ok(Self {
            api: ApiClient::new(Exchange::Aster)?,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Get raw funding records.
    #[instrument(skip(self), name = "aster_get_funding_records")]
    pub async fn get_funding_records(&self) -> Result<Vec<AsterFundingRate>> {
        let url = format!("{}/fapi/v1/fundingRate", self.base_url);
        self.api
            .get_json(&url)
            .await
            .context("Failed to fetch Aster funding rates")
    }

    /// Get funding rates keyed by canonical symbol.
    #[instrument(skip(self), name = "aster_get_funding_rates")]
    pub async fn get_funding_rates(&self) -> Result<RateMap> {
        let records = self.get_funding_records().await?;
        let rates = normalize_records(records);

        info!("Aster rates fetched: {}", rates.len());
        Ok(rates)
    }
}

/// Canonicalize symbols and keep the most recent record per symbol.
fn normalize_records(records: Vec<AsterFundingRate>) -> RateMap {
    let mut latest: HashMap<String, (i64, Decimal)> = HashMap::new();

    for record in records {
        let symbol = strip_quote_suffix(&record.symbol, QUOTE_SUFFIX);
        if has_non_latin_letters(symbol) {
            trace!(symbol = %record.symbol, "Skipping non-Latin symbol");
            continue;
        }

        let is_newer = latest
            .get(symbol)
            .map_or(true, |(time, _)| record.funding_time >= *time);
        if is_newer {
            latest.insert(symbol.to_string(), (record.funding_time, record.funding_rate));
        }
    }

    latest
        .into_iter()
        .map(|(symbol, (_, rate))| (symbol, rate))
        .collect()
}

#[async_trait]
impl FundingRateSource for AsterClient {
    fn exchange(&self) -> Exchange {
        Exchange::Aster
    }

    async fn fetch_funding_rates(&self) -> Result<RateMap> {
        self.get_funding_rates().await
    }
}
