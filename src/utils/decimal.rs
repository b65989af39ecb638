//! Decimal arithmetic utilities for rate calculations.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Convert a fractional rate to percent (0.0001 -> 0.01).
pub fn to_percentage(rate: Decimal) -> Decimal {
    rate * dec!(100)
}

/// Safe division that returns zero if divisor is zero.
pub fn safe_div(numerator: Decimal, denominator: Decimal) -> Decimal {
    if denominator == Decimal::ZERO {
        Decimal::ZERO
    } else {
        numerator / denominator
    }
}

/// Arithmetic mean, `None` for an empty slice.
pub fn mean(values: &[Decimal]) -> Option<Decimal> {
    if values.is_empty() {
        return None;
    }
    let sum: Decimal = values.iter().sum();
    Some(safe_div(sum, Decimal::from(values.len())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percentage() {
        assert_eq!(to_percentage(dec!(0.0001)), dec!(0.01));
        assert_eq!(to_percentage(dec!(-0.0025)), dec!(-0.25));
    }

    #[test]
    fn test_safe_div() {
        assert_eq!(safe_div(dec!(1), Decimal::ZERO), Decimal::ZERO);
        assert_eq!(safe_div(dec!(1), dec!(4)), dec!(0.25));
    }

    #[test]
    fn test_mean() {
        assert_eq!(mean(&[]), None);
        assert_eq!(mean(&[dec!(0.0001), dec!(-0.0003)]), Some(dec!(-0.0001)));
    }
}
