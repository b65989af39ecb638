//! Hyperliquid exchange integration.
//!
//! Read-only access to Hyperliquid perpetuals and spot market data.
//!
//! # Funding Rate Notes
//!
//! Hyperliquid funding is paid **hourly**; the `funding` field of each asset
//! context is already the hourly rate and is used without conversion.
//! Asset contexts carry no coin name: they line up by index with the
//! `universe` array of the accompanying metadata.

mod client;
mod types;

pub use client::{HyperliquidClient, MAINNET_API_URL};
pub use types::*;
