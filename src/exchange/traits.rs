//! Exchange-agnostic traits for funding data providers.
//!
//! Every supported perpetuals venue reports funding in its own shape. The
//! adapters reduce those shapes to a [`RateMap`] keyed by canonical symbol so
//! the aggregator and the arbitrage calculators never see venue details.

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Canonical symbol (e.g. "BTC") -> hourly funding rate as a fraction.
pub type RateMap = HashMap<String, Decimal>;

/// Exchange identifier.
///
/// Declaration order is the fixed priority used to break ties between
/// exchanges reporting identical rates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Exchange {
    Hyperliquid,
    Lighter,
    Aster,
    Extended,
}

impl Exchange {
    /// All exchanges in priority order.
    pub const ALL: [Exchange; 4] = [
        Exchange::Hyperliquid,
        Exchange::Lighter,
        Exchange::Aster,
        Exchange::Extended,
    ];

    /// Lowercase identifier used in configuration and serialized records.
    pub fn id(&self) -> &'static str {
        match self {
            Exchange::Hyperliquid => "hyperliquid",
            Exchange::Lighter => "lighter",
            Exchange::Aster => "aster",
            Exchange::Extended => "extended",
        }
    }

    /// Display name.
    pub fn name(&self) -> &'static str {
        match self {
            Exchange::Hyperliquid => "Hyperliquid",
            Exchange::Lighter => "Lighter",
            Exchange::Aster => "Aster",
            Exchange::Extended => "Extended",
        }
    }

    /// Short code for display (2 chars).
    pub fn short_code(&self) -> &'static str {
        match self {
            Exchange::Hyperliquid => "HL",
            Exchange::Lighter => "LT",
            Exchange::Aster => "AS",
            Exchange::Extended => "EX",
        }
    }

    /// Position in [`Exchange::ALL`]; lower wins ties.
    pub fn priority(&self) -> usize {
        *self as usize
    }
}

impl fmt::Display for Exchange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.name())
    }
}

/// Trait for venues that provide funding rate data.
///
/// Implementations perform one network round trip (or a fixed small number)
/// and either return the complete mapping or fail as a whole. Partial results
/// are never returned.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FundingRateSource: Send + Sync {
    /// Returns the exchange identifier.
    fn exchange(&self) -> Exchange;

    /// Fetch current hourly funding rates keyed by canonical symbol.
    async fn fetch_funding_rates(&self) -> anyhow::Result<RateMap>;
}
