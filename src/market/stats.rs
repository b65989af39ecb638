//! Summary statistics over the aggregated rate maps.

use rust_decimal::Decimal;
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::BTreeMap;

use crate::exchange::{Exchange, RateMap};
use crate::utils::decimal::mean;

/// A single exchange's rate for a symbol.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RateEntry {
    pub symbol: String,
    pub exchange: Exchange,
    pub rate: Decimal,
}

/// Highest and lowest individual rates.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FundingExtremes {
    /// Highest first
    pub highest: Vec<RateEntry>,
    /// Lowest first
    pub lowest: Vec<RateEntry>,
}

/// The `count` highest and `count` lowest rates across every exchange.
pub fn funding_extremes(rates: &BTreeMap<Exchange, RateMap>, count: usize) -> FundingExtremes {
    let mut entries: Vec<RateEntry> = rates
        .iter()
        .flat_map(|(exchange, map)| {
            map.iter().map(move |(symbol, rate)| RateEntry {
                symbol: symbol.clone(),
                exchange: *exchange,
                rate: *rate,
            })
        })
        .collect();

    entries.sort_by(|a, b| b.rate.cmp(&a.rate).then_with(|| tie_break(a, b)));
    let highest = entries.iter().take(count).cloned().collect();

    entries.sort_by(|a, b| a.rate.cmp(&b.rate).then_with(|| tie_break(a, b)));
    let lowest = entries.into_iter().take(count).collect();

    FundingExtremes { highest, lowest }
}

fn tie_break(a: &RateEntry, b: &RateEntry) -> Ordering {
    a.symbol
        .cmp(&b.symbol)
        .then(a.exchange.priority().cmp(&b.exchange.priority()))
}

/// Mean of every reported rate.
pub fn average_rate(rates: &BTreeMap<Exchange, RateMap>) -> Option<Decimal> {
    let all: Vec<Decimal> = rates.values().flat_map(|m| m.values().copied()).collect();
    mean(&all)
}
