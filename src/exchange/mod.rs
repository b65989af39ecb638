//! Exchange integrations for funding rate aggregation.
//!
//! Four perpetuals venues are supported, each behind its own adapter:
//! - Hyperliquid: perp funding and mark prices, spot prices, predicted and
//!   historical funding
//! - Lighter: funding feed and spot market listing
//! - Aster: Binance-style funding records
//! - Extended: market listing and per-market stats
//!
//! Every adapter implements [`FundingRateSource`], returning hourly rates keyed
//! by canonical base-asset symbol.

mod client;
mod de;
mod error;
pub mod aster;
pub mod extended;
pub mod hyperliquid;
pub mod lighter;
pub mod mock;
pub mod symbol;
mod traits;

pub use aster::AsterClient;
pub use client::ApiClient;
pub use error::AdapterError;
pub use extended::ExtendedClient;
pub use hyperliquid::HyperliquidClient;
pub use lighter::LighterClient;
pub use mock::StaticRateSource;
pub use traits::*;
