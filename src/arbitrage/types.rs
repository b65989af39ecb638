//! Arbitrage record types.

use rust_decimal::Decimal;
use serde::Serialize;
use std::fmt;

use crate::exchange::Exchange;

/// Funding periods per day.
pub const HOURS_PER_DAY: u32 = 24;
/// Days in a projected month.
pub const DAYS_PER_MONTH: u32 = 30;
/// Days in a projected year.
pub const DAYS_PER_YEAR: u32 = 365;

/// Linear projection of an hourly return. No compounding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Projection {
    pub hourly: Decimal,
    pub daily: Decimal,
    pub monthly: Decimal,
    pub annual: Decimal,
}

impl Projection {
    pub fn from_hourly(hourly: Decimal) -> Self {
        let daily = hourly * Decimal::from(HOURS_PER_DAY);
        Self {
            hourly,
            daily,
            monthly: daily * Decimal::from(DAYS_PER_MONTH),
            annual: daily * Decimal::from(DAYS_PER_YEAR),
        }
    }
}

/// Hedge direction for a spot-perp position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ArbitrageAction {
    /// Negative funding: longs pay shorts, so hold spot and short the perp.
    BuySpotShortPerp,
    /// Zero or positive funding: sell spot and go long the perp.
    SellSpotLongPerp,
}

impl ArbitrageAction {
    /// Action earning `funding_rate`. Only strictly negative rates buy spot.
    pub fn for_funding_rate(funding_rate: Decimal) -> Self {
        if funding_rate < Decimal::ZERO {
            ArbitrageAction::BuySpotShortPerp
        } else {
            ArbitrageAction::SellSpotLongPerp
        }
    }

    /// Human readable strategy.
    pub fn description(&self) -> &'static str {
        match self {
            ArbitrageAction::BuySpotShortPerp => "Buy Spot + Short Perp",
            ArbitrageAction::SellSpotLongPerp => "Sell Spot + Long Perp",
        }
    }
}

impl fmt::Display for ArbitrageAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArbitrageAction::BuySpotShortPerp => write!(f, "buy_spot_short_perp"),
            ArbitrageAction::SellSpotLongPerp => write!(f, "sell_spot_long_perp"),
        }
    }
}

/// Current state of a spot pair on one exchange.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpotMarketData {
    pub symbol: String,
    pub price: Decimal,
    pub volume_24h: Decimal,
}

/// Spot-vs-perp funding opportunity within one exchange.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArbitrageOpportunity {
    pub symbol: String,
    pub spot_price: Decimal,
    pub perp_price: Decimal,
    pub funding_rate: Decimal,
    pub hourly_return: Decimal,
    pub daily_return: Decimal,
    pub monthly_return: Decimal,
    pub annual_return: Decimal,
    pub action: ArbitrageAction,
    pub spot_exchange: String,
    pub perp_exchange: String,
    /// Exchange both legs trade on
    #[serde(skip)]
    pub exchange: Exchange,
}

/// Perp-vs-perp funding spread between two exchanges.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CrossExchangePerpArbitrage {
    pub symbol: String,
    /// Exchange with the lowest rate
    pub long_exchange: Exchange,
    /// Exchange with the highest rate
    pub short_exchange: Exchange,
    pub long_funding_rate: Decimal,
    pub short_funding_rate: Decimal,
    /// short_funding_rate - long_funding_rate, never negative
    pub rate_difference: Decimal,
    pub hourly_profit: Decimal,
    pub daily_profit: Decimal,
    pub monthly_profit: Decimal,
    pub annual_profit: Decimal,
}
