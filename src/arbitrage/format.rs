//! Display helpers for rates and strategies.

use rust_decimal::Decimal;

use super::types::CrossExchangePerpArbitrage;
use crate::utils::decimal::to_percentage;

/// Fractional rate as a percentage string with four decimals
/// (`0.0001` -> `"0.0100%"`).
pub fn format_percentage(rate: Decimal) -> String {
    format!("{:.4}%", to_percentage(rate))
}

/// Short strategy label such as `"Long HL + Short LT"`.
pub fn strategy_description(arb: &CrossExchangePerpArbitrage) -> String {
    format!(
        "Long {} + Short {}",
        arb.long_exchange.short_code(),
        arb.short_exchange.short_code()
    )
}
