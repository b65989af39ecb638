//! Lighter exchange integration.
//!
//! Lighter publishes a combined funding feed covering several venues; the
//! client keeps Lighter's own hourly rates. Spot markets come from a separate
//! markets listing and carry no prices.

mod client;
mod types;

pub use client::{LighterClient, MAINNET_API_URL};
pub use types::*;
