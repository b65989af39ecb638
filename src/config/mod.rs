//! Configuration management for the funding rate monitor.
//!
//! Loads settings from an optional `config` file and `FRM__`-prefixed
//! environment variables (e.g. `FRM__CACHE__TTL_SECS=60`).

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::exchange::{aster, extended, hyperliquid, lighter};
use crate::market::{FailurePolicy, OneDayView};

/// Main application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Upstream endpoints
    #[serde(default)]
    pub exchanges: ExchangesConfig,
    /// Rate cache settings
    #[serde(default)]
    pub cache: CacheConfig,
    /// Refresh and display policies
    #[serde(default)]
    pub aggregation: AggregationConfig,
    /// Extended per-market refresh
    #[serde(default)]
    pub enrichment: EnrichmentConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExchangesConfig {
    #[serde(default = "default_hyperliquid_url")]
    pub hyperliquid_url: String,
    #[serde(default = "default_lighter_url")]
    pub lighter_url: String,
    #[serde(default = "default_aster_url")]
    pub aster_url: String,
    #[serde(default = "default_extended_url")]
    pub extended_url: String,
    /// Per-adapter call timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Seconds a successful fetch is served without refetching
    #[serde(default = "default_ttl")]
    pub ttl_secs: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AggregationConfig {
    /// `fail_fast` or `degrade`
    #[serde(default)]
    pub failure_policy: FailurePolicy,
    /// `hourly_rate` or `daily_projection`
    #[serde(default)]
    pub one_day_view: OneDayView,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrichmentConfig {
    #[serde(default = "default_enrichment_enabled")]
    pub enabled: bool,
    /// Delay between per-market requests in milliseconds
    #[serde(default = "default_enrichment_interval")]
    pub interval_ms: u64,
}

// Default value functions
fn default_hyperliquid_url() -> String {
    hyperliquid::MAINNET_API_URL.to_string()
}

fn default_lighter_url() -> String {
    lighter::MAINNET_API_URL.to_string()
}

fn default_aster_url() -> String {
    aster::MAINNET_API_URL.to_string()
}

fn default_extended_url() -> String {
    extended::MAINNET_API_URL.to_string()
}

fn default_request_timeout() -> u64 {
    10
}

fn default_ttl() -> u64 {
    300 // 5 minutes
}

fn default_enrichment_enabled() -> bool {
    true
}

fn default_enrichment_interval() -> u64 {
    1000 // one market per second
}

impl Config {
    /// Load configuration from environment variables and config files.
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(config::File::with_name("config").required(false))
            .add_source(config::Environment::default().separator("__").prefix("FRM"))
            .build()
            .context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<()> {
        anyhow::ensure!(self.cache.ttl_secs > 0, "cache.ttl_secs must be positive");

        anyhow::ensure!(
            self.exchanges.request_timeout_secs > 0,
            "exchanges.request_timeout_secs must be positive"
        );

        anyhow::ensure!(
            self.enrichment.interval_ms > 0,
            "enrichment.interval_ms must be positive"
        );

        for (name, url) in [
            ("hyperliquid_url", &self.exchanges.hyperliquid_url),
            ("lighter_url", &self.exchanges.lighter_url),
            ("aster_url", &self.exchanges.aster_url),
            ("extended_url", &self.exchanges.extended_url),
        ] {
            anyhow::ensure!(
                url.starts_with("http://") || url.starts_with("https://"),
                "exchanges.{} must be an http(s) URL, got '{}'",
                name,
                url
            );
        }

        Ok(())
    }
}

impl Default for ExchangesConfig {
    fn default() -> Self {
        Self {
            hyperliquid_url: default_hyperliquid_url(),
            lighter_url: default_lighter_url(),
            aster_url: default_aster_url(),
            extended_url: default_extended_url(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: default_ttl(),
        }
    }
}

impl Default for EnrichmentConfig {
    fn default() -> Self {
        Self {
            enabled: default_enrichment_enabled(),
            interval_ms: default_enrichment_interval(),
        }
    }
}
