//! # Funding Rate Monitor
//!
//! Aggregates perpetual funding rates from Hyperliquid, Lighter, Aster and
//! Extended, and derives spot-perp and cross-exchange funding arbitrage.
//!
//! ## Architecture
//!
//! - `config`: Configuration management and validation
//! - `exchange`: One REST adapter per exchange behind a common trait
//! - `market`: Refresh service, TTL cache, aggregation and statistics
//! - `arbitrage`: Spot-perp and cross-exchange opportunity calculators
//! - `utils`: Shared decimal arithmetic

pub mod arbitrage;
pub mod config;
pub mod exchange;
pub mod market;
pub mod utils;

pub use config::Config;
