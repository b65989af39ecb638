//! Time-to-live cache for the last aggregated fetch.

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;

use crate::exchange::{Exchange, RateMap};

/// Default time-to-live for a successful fetch.
pub const DEFAULT_TTL_SECS: u64 = 300;

/// Rate maps from one refresh cycle.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RateSnapshot {
    pub rates: BTreeMap<Exchange, RateMap>,
    pub fetched_at: DateTime<Utc>,
    /// Exchanges that contributed an empty map because their fetch failed
    pub failed_exchanges: Vec<Exchange>,
}

impl RateSnapshot {
    pub fn new(rates: BTreeMap<Exchange, RateMap>, fetched_at: DateTime<Utc>) -> Self {
        Self {
            rates,
            fetched_at,
            failed_exchanges: Vec::new(),
        }
    }

    pub fn rates_for(&self, exchange: Exchange) -> Option<&RateMap> {
        self.rates.get(&exchange)
    }

    pub fn symbol_count(&self) -> usize {
        self.rates.values().map(|m| m.len()).sum()
    }
}

/// Outcome of a cache lookup.
#[derive(Debug, Clone, PartialEq)]
pub enum CacheLookup {
    /// Within TTL, or freshly fetched.
    Fresh(RateSnapshot),
    /// The refresh failed; the last good data is returned with the failure.
    Stale { snapshot: RateSnapshot, reason: String },
}

impl CacheLookup {
    pub fn snapshot(&self) -> &RateSnapshot {
        match self {
            CacheLookup::Fresh(snapshot) => snapshot,
            CacheLookup::Stale { snapshot, .. } => snapshot,
        }
    }

    pub fn is_fresh(&self) -> bool {
        matches!(self, CacheLookup::Fresh(_))
    }

    pub fn stale_reason(&self) -> Option<&str> {
        match self {
            CacheLookup::Fresh(_) => None,
            CacheLookup::Stale { reason, .. } => Some(reason),
        }
    }
}

/// Last snapshot plus a validity flag. A failed refresh clears the flag but
/// keeps the data.
#[derive(Debug, Clone)]
pub struct RateCache {
    ttl: Duration,
    snapshot: Option<RateSnapshot>,
    valid: bool,
}

impl RateCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            snapshot: None,
            valid: false,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Snapshot usable without a fetch at `now`.
    pub fn fresh(&self, now: DateTime<Utc>) -> Option<&RateSnapshot> {
        if !self.valid {
            return None;
        }
        self.snapshot
            .as_ref()
            .filter(|s| now.signed_duration_since(s.fetched_at) < self.ttl)
    }

    /// Last stored snapshot regardless of age or validity.
    pub fn snapshot(&self) -> Option<&RateSnapshot> {
        self.snapshot.as_ref()
    }

    pub fn store(&mut self, snapshot: RateSnapshot) {
        self.snapshot = Some(snapshot);
        self.valid = true;
    }

    pub fn invalidate(&mut self) {
        self.valid = false;
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// Overwrite one rate in the stored snapshot. Returns false when nothing
    /// is cached yet.
    pub fn update_rate(&mut self, exchange: Exchange, symbol: &str, rate: Decimal) -> bool {
        match self.snapshot.as_mut() {
            Some(snapshot) => {
                snapshot
                    .rates
                    .entry(exchange)
                    .or_default()
                    .insert(symbol.to_string(), rate);
                true
            }
            None => false,
        }
    }
}

impl Default for RateCache {
    fn default() -> Self {
        Self::new(Duration::seconds(DEFAULT_TTL_SECS as i64))
    }
}
