//! Cross-exchange perp-vs-perp funding arbitrage.
//!
//! For each symbol listed on two or more exchanges: go long where funding is
//! lowest and short where it is highest, collecting the difference every hour.

use rust_decimal::Decimal;
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

use super::types::{CrossExchangePerpArbitrage, Projection};
use crate::exchange::{Exchange, RateMap};

/// Rate differences at or below this are not reported (0.0001%).
pub const MIN_RATE_DIFFERENCE: Decimal = Decimal::from_parts(1, 0, 0, false, 6);

/// Find the best long/short exchange pair for every symbol.
///
/// Ties on rate resolve to the exchange earliest in [`Exchange::ALL`], for the
/// long side and the short side alike. Sorted by hourly profit, largest first.
pub fn calculate_cross_exchange_arbitrage(
    rates: &BTreeMap<Exchange, RateMap>,
) -> Vec<CrossExchangePerpArbitrage> {
    let symbols: BTreeSet<&str> = rates
        .values()
        .flat_map(|m| m.keys().map(String::as_str))
        .collect();

    let mut opportunities: Vec<CrossExchangePerpArbitrage> = symbols
        .into_iter()
        .filter_map(|symbol| best_pair(symbol, rates))
        .collect();

    opportunities.sort_by(|a, b| {
        b.hourly_profit
            .cmp(&a.hourly_profit)
            .then_with(|| a.symbol.cmp(&b.symbol))
    });

    debug!(count = opportunities.len(), "Cross-exchange opportunities");
    opportunities
}

fn best_pair(
    symbol: &str,
    rates: &BTreeMap<Exchange, RateMap>,
) -> Option<CrossExchangePerpArbitrage> {
    let quotes: Vec<(Exchange, Decimal)> = Exchange::ALL
        .iter()
        .filter_map(|ex| {
            let rate = rates.get(ex)?.get(symbol)?;
            Some((*ex, *rate))
        })
        .collect();

    if quotes.len() < 2 {
        return None;
    }

    let (long_exchange, long_rate) = *quotes
        .iter()
        .min_by(|a, b| a.1.cmp(&b.1).then(a.0.priority().cmp(&b.0.priority())))?;
    let (short_exchange, short_rate) = *quotes
        .iter()
        .max_by(|a, b| a.1.cmp(&b.1).then(b.0.priority().cmp(&a.0.priority())))?;

    let rate_difference = short_rate - long_rate;
    if rate_difference.abs() <= MIN_RATE_DIFFERENCE {
        return None;
    }

    let profit = Projection::from_hourly(rate_difference.abs());

    Some(CrossExchangePerpArbitrage {
        symbol: symbol.to_string(),
        long_exchange,
        short_exchange,
        long_funding_rate: long_rate,
        short_funding_rate: short_rate,
        rate_difference,
        hourly_profit: profit.hourly,
        daily_profit: profit.daily,
        monthly_profit: profit.monthly,
        annual_profit: profit.annual,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn rates(entries: &[(Exchange, &[(&str, Decimal)])]) -> BTreeMap<Exchange, RateMap> {
        let mut all: BTreeMap<Exchange, RateMap> =
            Exchange::ALL.iter().map(|e| (*e, RateMap::new())).collect();
        for (exchange, symbols) in entries {
            let map = all.entry(*exchange).or_default();
            for (symbol, rate) in symbols.iter() {
                map.insert(symbol.to_string(), *rate);
            }
        }
        all
    }

    #[test]
    fn test_two_exchanges_min_is_long() {
        let input = rates(&[
            (Exchange::Hyperliquid, &[("Y", dec!(0.0003))]),
            (Exchange::Lighter, &[("Y", dec!(-0.0001))]),
        ]);

        let opps = calculate_cross_exchange_arbitrage(&input);

        assert_eq!(opps.len(), 1);
        let opp = &opps[0];
        assert_eq!(opp.long_exchange, Exchange::Lighter);
        assert_eq!(opp.short_exchange, Exchange::Hyperliquid);
        assert_eq!(opp.rate_difference, dec!(0.0004));
        assert_eq!(opp.hourly_profit, dec!(0.0004));
        assert_eq!(opp.daily_profit, opp.hourly_profit * dec!(24));
        assert_eq!(opp.monthly_profit, opp.daily_profit * dec!(30));
        assert_eq!(opp.annual_profit, opp.daily_profit * dec!(365));
    }

    #[test]
    fn test_single_exchange_symbol_is_skipped() {
        let input = rates(&[
            (Exchange::Aster, &[("SOLO", dec!(0.001))]),
            (Exchange::Extended, &[("BTC", dec!(0.0001))]),
        ]);

        assert!(calculate_cross_exchange_arbitrage(&input).is_empty());
    }

    #[test]
    fn test_equal_rates_are_dropped() {
        let input = rates(&[
            (Exchange::Aster, &[("BTC", dec!(0.0001))]),
            (Exchange::Extended, &[("BTC", dec!(0.0001))]),
        ]);

        assert!(calculate_cross_exchange_arbitrage(&input).is_empty());
    }

    #[test]
    fn test_threshold_is_exclusive() {
        let input = rates(&[
            (Exchange::Hyperliquid, &[("A", dec!(0.000001)), ("B", dec!(0.0000011))]),
            (Exchange::Lighter, &[("A", Decimal::ZERO), ("B", Decimal::ZERO)]),
        ]);

        let opps = calculate_cross_exchange_arbitrage(&input);
        assert_eq!(opps.len(), 1);
        assert_eq!(opps[0].symbol, "B");
    }

    #[test]
    fn test_picks_extremes_among_four() {
        let input = rates(&[
            (Exchange::Hyperliquid, &[("ETH", dec!(0.00001))]),
            (Exchange::Lighter, &[("ETH", dec!(0.0002))]),
            (Exchange::Aster, &[("ETH", dec!(-0.0001))]),
            (Exchange::Extended, &[("ETH", dec!(0.00005))]),
        ]);

        let opps = calculate_cross_exchange_arbitrage(&input);
        assert_eq!(opps[0].long_exchange, Exchange::Aster);
        assert_eq!(opps[0].short_exchange, Exchange::Lighter);
        assert_eq!(opps[0].rate_difference, dec!(0.0003));
    }

    #[test]
    fn test_ties_resolve_by_exchange_priority() {
        let input = rates(&[
            (Exchange::Hyperliquid, &[("X", dec!(0.0002))]),
            (Exchange::Lighter, &[("X", dec!(-0.0001))]),
            (Exchange::Aster, &[("X", dec!(0.0002))]),
            (Exchange::Extended, &[("X", dec!(-0.0001))]),
        ]);

        let opps = calculate_cross_exchange_arbitrage(&input);
        assert_eq!(opps[0].long_exchange, Exchange::Lighter);
        assert_eq!(opps[0].short_exchange, Exchange::Hyperliquid);
    }

    #[test]
    fn test_sorted_by_profit() {
        let input = rates(&[
            (Exchange::Hyperliquid, &[("A", dec!(0.0001)), ("B", dec!(0.001))]),
            (Exchange::Aster, &[("A", dec!(0.0)), ("B", dec!(0.0))]),
        ]);

        let opps = calculate_cross_exchange_arbitrage(&input);
        let symbols: Vec<&str> = opps.iter().map(|o| o.symbol.as_str()).collect();
        assert_eq!(symbols, vec!["B", "A"]);
    }
}
