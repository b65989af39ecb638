//! Spot-vs-perp funding arbitrage within a single exchange.
//!
//! Holding the spot asset against an opposite perp position is price neutral;
//! the perp leg is chosen on the side that receives funding.

use rust_decimal::Decimal;
use std::cmp::Ordering;
use std::collections::HashMap;
use tracing::debug;

use super::types::{ArbitrageAction, ArbitrageOpportunity, Projection, SpotMarketData};
use crate::exchange::hyperliquid::PerpMarket;
use crate::exchange::{Exchange, RateMap};

/// Opportunities for every symbol with both spot data and a perp market.
///
/// Sorted by absolute hourly return, largest first.
pub fn calculate_spot_perp_opportunities(
    exchange: Exchange,
    spot_markets: &HashMap<String, SpotMarketData>,
    perp_markets: &HashMap<String, PerpMarket>,
) -> Vec<ArbitrageOpportunity> {
    let mut opportunities: Vec<ArbitrageOpportunity> = spot_markets
        .iter()
        .filter_map(|(symbol, spot)| {
            let perp = perp_markets.get(symbol)?;
            Some(build_opportunity(
                exchange,
                symbol,
                spot.price,
                perp.mark_price,
                perp.funding_rate,
            ))
        })
        .collect();

    sort_by_return(&mut opportunities);
    debug!(%exchange, count = opportunities.len(), "Spot-perp opportunities");
    opportunities
}

/// Opportunities for an exchange that lists spot markets but exposes no
/// separate spot/perp prices. Prices are reported as zero.
pub fn calculate_rate_only_opportunities<I, S>(
    exchange: Exchange,
    spot_symbols: I,
    funding_rates: &RateMap,
) -> Vec<ArbitrageOpportunity>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut opportunities: Vec<ArbitrageOpportunity> = spot_symbols
        .into_iter()
        .filter_map(|symbol| {
            let symbol = symbol.as_ref();
            let rate = *funding_rates.get(symbol)?;
            Some(build_opportunity(
                exchange,
                symbol,
                Decimal::ZERO,
                Decimal::ZERO,
                rate,
            ))
        })
        .collect();

    sort_by_return(&mut opportunities);
    debug!(%exchange, count = opportunities.len(), "Rate-only spot-perp opportunities");
    opportunities
}

/// Merge opportunity lists from several exchanges into one ranking.
pub fn rank_opportunities(
    lists: impl IntoIterator<Item = Vec<ArbitrageOpportunity>>,
) -> Vec<ArbitrageOpportunity> {
    let mut all: Vec<ArbitrageOpportunity> = lists.into_iter().flatten().collect();
    sort_by_return(&mut all);
    all
}

fn build_opportunity(
    exchange: Exchange,
    symbol: &str,
    spot_price: Decimal,
    perp_price: Decimal,
    funding_rate: Decimal,
) -> ArbitrageOpportunity {
    let returns = Projection::from_hourly(funding_rate.abs());

    ArbitrageOpportunity {
        symbol: symbol.to_string(),
        spot_price,
        perp_price,
        funding_rate,
        hourly_return: returns.hourly,
        daily_return: returns.daily,
        monthly_return: returns.monthly,
        annual_return: returns.annual,
        action: ArbitrageAction::for_funding_rate(funding_rate),
        spot_exchange: format!("{} Spot", exchange),
        perp_exchange: format!("{} Perps", exchange),
        exchange,
    }
}

fn sort_by_return(opportunities: &mut [ArbitrageOpportunity]) {
    opportunities.sort_by(|a, b| {
        b.hourly_return
            .abs()
            .cmp(&a.hourly_return.abs())
            .then_with(|| a.symbol.cmp(&b.symbol))
            .then_with(|| compare_exchange(a, b))
    });
}

fn compare_exchange(a: &ArbitrageOpportunity, b: &ArbitrageOpportunity) -> Ordering {
    a.exchange.priority().cmp(&b.exchange.priority())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn spot(symbol: &str, price: Decimal) -> (String, SpotMarketData) {
        (
            symbol.to_string(),
            SpotMarketData {
                symbol: symbol.to_string(),
                price,
                volume_24h: dec!(1000),
            },
        )
    }

    fn perp(symbol: &str, funding_rate: Decimal, mark_price: Decimal) -> (String, PerpMarket) {
        (
            symbol.to_string(),
            PerpMarket {
                funding_rate,
                mark_price,
            },
        )
    }

    #[test]
    fn test_negative_funding_buys_spot() {
        let spot_markets = HashMap::from([spot("X", dec!(10))]);
        let perps = HashMap::from([perp("X", dec!(-0.0002), dec!(10.1))]);

        let opps = calculate_spot_perp_opportunities(Exchange::Hyperliquid, &spot_markets, &perps);

        assert_eq!(opps.len(), 1);
        let opp = &opps[0];
        assert_eq!(opp.action, ArbitrageAction::BuySpotShortPerp);
        assert_eq!(opp.hourly_return, dec!(0.0002));
        assert_eq!(opp.daily_return, opp.hourly_return * dec!(24));
        assert_eq!(opp.monthly_return, opp.daily_return * dec!(30));
        assert_eq!(opp.annual_return, opp.daily_return * dec!(365));
        assert_eq!(opp.spot_price, dec!(10));
        assert_eq!(opp.perp_price, dec!(10.1));
        assert_eq!(opp.spot_exchange, "Hyperliquid Spot");
        assert_eq!(opp.perp_exchange, "Hyperliquid Perps");
    }

    #[test]
    fn test_positive_funding_sells_spot() {
        let spot_markets = HashMap::from([spot("X", dec!(10))]);
        let perps = HashMap::from([perp("X", dec!(0.0001), dec!(10))]);

        let opps = calculate_spot_perp_opportunities(Exchange::Hyperliquid, &spot_markets, &perps);
        assert_eq!(opps[0].action, ArbitrageAction::SellSpotLongPerp);
        assert_eq!(opps[0].hourly_return, dec!(0.0001));
    }

    #[test]
    fn test_only_symbols_in_both_feeds() {
        let spot_markets = HashMap::from([spot("A", dec!(1)), spot("B", dec!(2))]);
        let perps = HashMap::from([
            perp("B", dec!(0.0001), dec!(2)),
            perp("C", dec!(0.0009), dec!(3)),
        ]);

        let opps = calculate_spot_perp_opportunities(Exchange::Hyperliquid, &spot_markets, &perps);
        assert_eq!(opps.len(), 1);
        assert_eq!(opps[0].symbol, "B");
    }

    #[test]
    fn test_sorted_by_absolute_return() {
        let spot_markets = HashMap::from([
            spot("A", dec!(1)),
            spot("B", dec!(1)),
            spot("C", dec!(1)),
        ]);
        let perps = HashMap::from([
            perp("A", dec!(0.0001), dec!(1)),
            perp("B", dec!(-0.0005), dec!(1)),
            perp("C", dec!(0.0003), dec!(1)),
        ]);

        let opps = calculate_spot_perp_opportunities(Exchange::Hyperliquid, &spot_markets, &perps);
        let symbols: Vec<&str> = opps.iter().map(|o| o.symbol.as_str()).collect();
        assert_eq!(symbols, vec!["B", "C", "A"]);
    }

    #[test]
    fn test_rate_only_reports_zero_prices() {
        let rates = RateMap::from([
            ("ETH".to_string(), dec!(-0.00004)),
            ("BTC".to_string(), dec!(0.00001)),
        ]);

        let opps = calculate_rate_only_opportunities(Exchange::Lighter, ["ETH", "LIT"], &rates);

        assert_eq!(opps.len(), 1);
        assert_eq!(opps[0].symbol, "ETH");
        assert_eq!(opps[0].spot_price, Decimal::ZERO);
        assert_eq!(opps[0].perp_price, Decimal::ZERO);
        assert_eq!(opps[0].action, ArbitrageAction::BuySpotShortPerp);
        assert_eq!(opps[0].spot_exchange, "Lighter Spot");
    }

    #[test]
    fn test_rank_merges_exchanges() {
        let hl = calculate_spot_perp_opportunities(
            Exchange::Hyperliquid,
            &HashMap::from([spot("ETH", dec!(3000))]),
            &HashMap::from([perp("ETH", dec!(0.0001), dec!(3001))]),
        );
        let lt = calculate_rate_only_opportunities(
            Exchange::Lighter,
            ["ETH"],
            &RateMap::from([("ETH".to_string(), dec!(-0.0003))]),
        );

        let ranked = rank_opportunities([hl, lt]);
        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].exchange, Exchange::Lighter);
        assert_eq!(ranked[1].exchange, Exchange::Hyperliquid);
    }
}
