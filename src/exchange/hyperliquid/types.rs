//! Type definitions for Hyperliquid API responses.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::exchange::de::{decimal_str, decimal_str_option};

/// Request type for Hyperliquid info endpoint.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum InfoRequest {
    /// Get metadata and asset contexts (funding rates, prices, OI).
    #[serde(rename = "metaAndAssetCtxs")]
    MetaAndAssetCtxs,

    /// Get spot metadata and spot asset contexts.
    #[serde(rename = "spotMetaAndAssetCtxs")]
    SpotMetaAndAssetCtxs,

    /// Get predicted next funding per venue.
    #[serde(rename = "predictedFundings")]
    PredictedFundings,

    /// Get funding rate history.
    #[serde(rename = "fundingHistory")]
    FundingHistory {
        coin: String,
        #[serde(rename = "startTime")]
        start_time: i64,
        #[serde(rename = "endTime", skip_serializing_if = "Option::is_none")]
        end_time: Option<i64>,
    },
}

/// Response from metaAndAssetCtxs endpoint.
/// Returns a tuple of (Meta, Vec<AssetCtx>).
pub type MetaAndAssetCtxsResponse = (Meta, Vec<AssetCtx>);

/// Response from spotMetaAndAssetCtxs endpoint.
pub type SpotMetaAndAssetCtxsResponse = (SpotMeta, Vec<SpotAssetCtx>);

/// Response from predictedFundings endpoint:
/// `[[coin, [[venue, funding | null], ...]], ...]`.
pub type PredictedFundingsResponse = Vec<(String, Vec<(String, Option<PredictedVenueFunding>)>)>;

/// Universe metadata for perpetuals.
#[derive(Debug, Clone, Deserialize)]
pub struct Meta {
    pub universe: Vec<AssetMeta>,
}

/// One perpetual in the universe, e.g. `BTC`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetMeta {
    pub name: String,
    pub sz_decimals: u8,
}

/// Live state of a perpetual. Index-aligned with [`Meta::universe`].
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetCtx {
    /// Hourly funding rate
    #[serde(deserialize_with = "decimal_str")]
    pub funding: Decimal,
    #[serde(deserialize_with = "decimal_str")]
    pub mark_px: Decimal,
    #[serde(default, deserialize_with = "decimal_str_option")]
    pub open_interest: Option<Decimal>,
    #[serde(default, deserialize_with = "decimal_str_option")]
    pub prev_day_px: Option<Decimal>,
}

/// Spot universe and token list.
#[derive(Debug, Clone, Deserialize)]
pub struct SpotMeta {
    pub tokens: Vec<SpotToken>,
    pub universe: Vec<SpotPair>,
}

/// A spot token.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpotToken {
    pub name: String,
    pub index: usize,
    #[serde(default)]
    pub sz_decimals: u8,
}

/// A spot pair referencing two tokens by index (base, quote).
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpotPair {
    pub name: String,
    pub tokens: [usize; 2],
    pub index: usize,
}

/// Real-time context for a spot pair.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpotAssetCtx {
    #[serde(deserialize_with = "decimal_str")]
    pub day_ntl_vlm: Decimal,
    #[serde(deserialize_with = "decimal_str")]
    pub mark_px: Decimal,
    #[serde(default, deserialize_with = "decimal_str_option")]
    pub mid_px: Option<Decimal>,
}

/// Predicted funding for one coin on one venue.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictedVenueFunding {
    #[serde(deserialize_with = "decimal_str")]
    pub funding_rate: Decimal,
    pub next_funding_time: i64,
}

/// One settled funding payment from fundingHistory.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FundingHistoryRecord {
    pub coin: String,
    #[serde(deserialize_with = "decimal_str")]
    pub funding_rate: Decimal,
    #[serde(default, deserialize_with = "decimal_str_option")]
    pub premium: Option<Decimal>,
    /// Settlement time, unix ms
    pub time: i64,
}

/// Perpetual funding and mark price for one coin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PerpMarket {
    /// Current hourly funding rate
    pub funding_rate: Decimal,
    /// Mark price
    pub mark_price: Decimal,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_deserialize_asset_ctx() {
        let json = r#"{
            "funding": "0.00001234",
            "openInterest": "1234567.89",
            "prevDayPx": "50000.0",
            "dayNtlVlm": "999999999.0",
            "premium": null,
            "oraclePx": "50000.0",
            "markPx": "50005.0",
            "midPx": "50002.5",
            "impactPxs": null
        }"#;

        let ctx: AssetCtx = serde_json::from_str(json).unwrap();
        assert_eq!(ctx.funding, dec!(0.00001234));
        assert_eq!(ctx.mark_px, dec!(50005));
        assert_eq!(ctx.open_interest, Some(dec!(1234567.89)));
    }

    #[test]
    fn test_info_request_serialization() {
        let json = serde_json::to_string(&InfoRequest::MetaAndAssetCtxs).unwrap();
        assert_eq!(json, r#"{"type":"metaAndAssetCtxs"}"#);

        let json = serde_json::to_string(&InfoRequest::SpotMetaAndAssetCtxs).unwrap();
        assert_eq!(json, r#"{"type":"spotMetaAndAssetCtxs"}"#);

        let req = InfoRequest::FundingHistory {
            coin: "BTC".to_string(),
            start_time: 1234567890000,
            end_time: None,
        };
        let json = serde_json::to_string(&req).unwrap();
        assert!(json.contains(r#""type":"fundingHistory""#));
        assert!(json.contains(r#""coin":"BTC""#));
        assert!(!json.contains("endTime"));
    }

    #[test]
    fn test_deserialize_predicted_fundings() {
        let json = r#"[
            ["AVAX", [
                ["BinPerp", {"fundingRate": "0.0001", "nextFundingTime": 1733961600000}],
                ["HlPerp", {"fundingRate": "0.0000125", "nextFundingTime": 1733958000000}],
                ["BybitPerp", null]
            ]]
        ]"#;

        let parsed: PredictedFundingsResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.len(), 1);
        let (coin, venues) = &parsed[0];
        assert_eq!(coin, "AVAX");
        assert_eq!(venues.len(), 3);
        assert_eq!(
            venues[1].1.as_ref().map(|f| f.funding_rate),
            Some(dec!(0.0000125))
        );
        assert!(venues[2].1.is_none());
    }
}
