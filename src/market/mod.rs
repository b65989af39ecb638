//! Cross-exchange funding rate view.
//!
//! - `service`: fetches every exchange concurrently behind a TTL cache
//! - `aggregator`: merges the per-exchange maps into per-symbol records
//! - `enrichment`: background refresh of Extended per-market rates

mod aggregator;
mod cache;
mod clock;
mod enrichment;
mod service;
mod stats;
mod timeframe;

pub use aggregator::{
    aggregate_funding_rates, compare_symbols, matches_query, FundingRate, PRIORITY_SYMBOLS,
};
pub use cache::{CacheLookup, RateCache, RateSnapshot, DEFAULT_TTL_SECS};
pub use clock::{Clock, ManualClock, SystemClock};
pub use enrichment::{
    EnrichmentHandle, EnrichmentSummary, ExtendedEnricher, MarketStatsSource,
    DEFAULT_ENRICHMENT_INTERVAL,
};
pub use service::{FailurePolicy, FundingService, DEFAULT_REQUEST_TIMEOUT};
pub use stats::{average_rate, funding_extremes, FundingExtremes, RateEntry};
pub use timeframe::{OneDayView, Timeframe};
