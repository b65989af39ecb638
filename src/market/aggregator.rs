//! Merge per-exchange rate maps into one record per symbol.

use rust_decimal::Decimal;
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

use super::timeframe::{OneDayView, Timeframe};
use crate::exchange::{Exchange, RateMap};

/// Symbols listed ahead of everything else, in this order.
pub const PRIORITY_SYMBOLS: [&str; 6] = ["BTC", "ETH", "SOL", "XRP", "DOGE", "BNB"];

/// One symbol's rate on every exchange. `None` means the exchange does not
/// list the symbol.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FundingRate {
    pub symbol: String,
    pub exchanges: BTreeMap<Exchange, Option<Decimal>>,
}

impl FundingRate {
    pub fn rate(&self, exchange: Exchange) -> Option<Decimal> {
        self.exchanges.get(&exchange).copied().flatten()
    }
}

/// Build one [`FundingRate`] per symbol in the union of `rates`, scaled to
/// `timeframe`.
pub fn aggregate_funding_rates(
    rates: &BTreeMap<Exchange, RateMap>,
    timeframe: Timeframe,
    one_day: OneDayView,
) -> Vec<FundingRate> {
    let multiplier = timeframe.multiplier(one_day);

    let symbols: BTreeSet<&str> = rates
        .values()
        .flat_map(|m| m.keys().map(String::as_str))
        .collect();

    let mut out: Vec<FundingRate> = symbols
        .into_iter()
        .map(|symbol| {
            let exchanges = Exchange::ALL
                .iter()
                .map(|ex| {
                    let rate = rates
                        .get(ex)
                        .and_then(|m| m.get(symbol))
                        .map(|r| *r * multiplier);
                    (*ex, rate)
                })
                .collect();
            FundingRate {
                symbol: symbol.to_string(),
                exchanges,
            }
        })
        .collect();

    out.sort_by(|a, b| compare_symbols(&a.symbol, &b.symbol));
    out
}

/// Priority symbols first by rank, then the rest lexically.
pub fn compare_symbols(a: &str, b: &str) -> Ordering {
    let rank = |s: &str| PRIORITY_SYMBOLS.iter().position(|p| *p == s);
    match (rank(a), rank(b)) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.cmp(b),
    }
}

/// Case-insensitive substring match. An empty query matches everything.
pub fn matches_query(symbol: &str, query: &str) -> bool {
    let query = query.trim();
    query.is_empty() || symbol.to_lowercase().contains(&query.to_lowercase())
}
