//! Type definitions for Lighter API responses.

use rust_decimal::Decimal;
use serde::Deserialize;

/// Response from the funding-rates endpoint.
///
/// The endpoint reports rates for several venues; only entries whose
/// `exchange` is `"lighter"` belong to Lighter itself.
#[derive(Debug, Clone, Deserialize)]
pub struct FundingRatesResponse {
    pub code: i32,
    pub funding_rates: Vec<LighterFundingRate>,
}

/// One venue's funding rate for a market. `rate` is a JSON number.
#[derive(Debug, Clone, Deserialize)]
pub struct LighterFundingRate {
    pub market_id: u32,
    pub exchange: String,
    pub symbol: String,
    pub rate: Decimal,
}

/// Entry of the markets endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct LighterMarket {
    pub symbol: String,
    pub market_index: u32,
}

/// A Lighter spot market, keyed elsewhere by its base asset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LighterSpotMarket {
    /// Full market symbol (e.g. "ETH/USDC")
    pub symbol: String,
    pub market_index: u32,
}
