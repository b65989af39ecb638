//! Funding arbitrage calculators.
//!
//! - `spot_perp`: hedge spot against a perp on the same exchange
//! - `cross_exchange`: long the cheapest perp, short the most expensive

mod cross_exchange;
mod format;
mod spot_perp;
mod types;

pub use cross_exchange::{calculate_cross_exchange_arbitrage, MIN_RATE_DIFFERENCE};
pub use format::{format_percentage, strategy_description};
pub use spot_perp::{
    calculate_rate_only_opportunities, calculate_spot_perp_opportunities, rank_opportunities,
};
pub use types::*;
