//! Funding Rate Monitor - Main Entry Point
//!
//! Terminal views over the aggregated funding rates and arbitrage calculators.

use anyhow::Result;
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use funding_rate_monitor::arbitrage::{
    calculate_cross_exchange_arbitrage, calculate_rate_only_opportunities,
    calculate_spot_perp_opportunities, format_percentage, rank_opportunities,
    strategy_description,
};
use funding_rate_monitor::config::Config;
use funding_rate_monitor::exchange::{
    AsterClient, Exchange, ExtendedClient, FundingRateSource, HyperliquidClient, LighterClient,
    RateMap,
};
use funding_rate_monitor::market::{
    aggregate_funding_rates, average_rate, funding_extremes, matches_query, CacheLookup,
    EnrichmentHandle, ExtendedEnricher, FundingRate, FundingService, RateEntry, Timeframe,
};
use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn, Level};
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::EnvFilter;

/// Funding Rate Monitor CLI
#[derive(Parser)]
#[command(name = "funding-rate-monitor")]
#[command(version, about = "Perpetual funding rates across Hyperliquid, Lighter, Aster and Extended")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Aggregated funding rates, one column per exchange
    Rates {
        /// current, 1day, 7day, 30day or 1year
        #[arg(short, long, default_value = "current")]
        timeframe: Timeframe,

        /// Case-insensitive symbol filter
        #[arg(short, long)]
        search: Option<String>,

        /// Maximum rows to print
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Spot-perp opportunities on Hyperliquid and Lighter
    SpotArb {
        #[arg(short, long)]
        search: Option<String>,

        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Cross-exchange perp-vs-perp opportunities
    PerpArb {
        #[arg(short, long)]
        search: Option<String>,

        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Highest and lowest funding rates plus the overall average
    Extremes {
        #[arg(short, long, default_value = "5")]
        count: usize,
    },

    /// Hyperliquid predicted funding rates
    Predicted {
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Average historical Hyperliquid funding per coin
    History {
        /// Coins to query, e.g. --coin BTC --coin ETH
        #[arg(short, long = "coin", required = true)]
        coins: Vec<String>,

        /// Lookback window in hours
        #[arg(long, default_value = "24")]
        hours: u32,
    },

    /// Refresh and print the rate table periodically until Ctrl-C
    Watch {
        #[arg(short, long, default_value = "current")]
        timeframe: Timeframe,

        /// Seconds between refreshes
        #[arg(short, long, default_value = "60")]
        refresh_secs: u64,
    },
}

/// One client per exchange, shared between the refresh service and the
/// exchange-specific views.
struct Clients {
    hyperliquid: Arc<HyperliquidClient>,
    lighter: Arc<LighterClient>,
    aster: Arc<AsterClient>,
    extended: Arc<ExtendedClient>,
}

impl Clients {
    fn from_config(config: &Config) -> Result<Self> {
        Ok(Self {
            hyperliquid: Arc::new(HyperliquidClient::with_base_url(
                &config.exchanges.hyperliquid_url,
            )?),
            lighter: Arc::new(LighterClient::with_base_url(&config.exchanges.lighter_url)?),
            aster: Arc::new(AsterClient::with_base_url(&config.exchanges.aster_url)?),
            extended: Arc::new(ExtendedClient::with_base_url(
                &config.exchanges.extended_url,
            )?),
        })
    }

    fn sources(&self) -> Vec<Arc<dyn FundingRateSource>> {
        vec![
            self.hyperliquid.clone(),
            self.lighter.clone(),
            self.aster.clone(),
            self.extended.clone(),
        ]
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        error!("{:#}", e);
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    init_logging()?;

    let config = Config::load()?;
    config.validate()?;
    log_config(&config);

    let clients = Clients::from_config(&config)?;
    let service = Arc::new(FundingService::from_config(&config, clients.sources()));

    match cli.command {
        Commands::Rates {
            timeframe,
            search,
            limit,
        } => {
            let lookup = load_rates(&service).await?;
            let records =
                aggregate_funding_rates(&lookup.snapshot().rates, timeframe, config.aggregation.one_day_view);
            print_rates(&records, timeframe, search.as_deref(), limit);
        }
        Commands::SpotArb { search, limit } => {
            show_spot_arbitrage(&service, &clients, search.as_deref(), limit).await?;
        }
        Commands::PerpArb { search, limit } => {
            let lookup = load_rates(&service).await?;
            show_perp_arbitrage(&lookup, search.as_deref(), limit);
        }
        Commands::Extremes { count } => {
            let lookup = load_rates(&service).await?;
            show_extremes(&lookup, count);
        }
        Commands::Predicted { limit } => {
            show_predicted(&clients, limit).await?;
        }
        Commands::History { coins, hours } => {
            show_history(&clients, &coins, hours).await?;
        }
        Commands::Watch {
            timeframe,
            refresh_secs,
        } => {
            anyhow::ensure!(refresh_secs > 0, "--refresh-secs must be positive");
            watch(&config, &service, &clients, timeframe, refresh_secs).await;
        }
    }

    Ok(())
}

/// Initialize logging: stderr plus an hourly rolling file under `logs/`.
fn init_logging() -> Result<()> {
    use tracing_subscriber::fmt::writer::MakeWriterExt;

    std::fs::create_dir_all("logs")?;

    let file_appender = tracing_appender::rolling::hourly("logs", "funding-monitor.log");
    let (file_writer, _guard) = tracing_appender::non_blocking(file_appender);

    // Leak the guard to keep it alive for the program duration
    Box::leak(Box::new(_guard));

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("funding_rate_monitor=debug".parse()?)
                .add_directive(Level::INFO.into()),
        )
        .with_writer(std::io::stderr.and(file_writer))
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(false)
        .init();

    Ok(())
}

/// Log configuration on startup.
fn log_config(config: &Config) {
    info!("📋 Configuration:");
    info!("   Hyperliquid: {}", config.exchanges.hyperliquid_url);
    info!("   Lighter:     {}", config.exchanges.lighter_url);
    info!("   Aster:       {}", config.exchanges.aster_url);
    info!("   Extended:    {}", config.exchanges.extended_url);
    info!("   Request Timeout: {}s", config.exchanges.request_timeout_secs);
    info!("   Cache TTL: {}s", config.cache.ttl_secs);
    info!("   Failure Policy: {:?}", config.aggregation.failure_policy);
    info!("   1day View: {:?}", config.aggregation.one_day_view);
    info!(
        "   Enrichment: {} ({}ms interval)",
        if config.enrichment.enabled { "on" } else { "off" },
        config.enrichment.interval_ms
    );
}

/// Cached or freshly fetched rates, warning when the data is stale.
async fn load_rates(service: &FundingService) -> Result<CacheLookup> {
    let lookup = service.get().await?;

    if let Some(reason) = lookup.stale_reason() {
        warn!("⚠️  Refresh failed, showing data from {}: {}", lookup.snapshot().fetched_at, reason);
    }
    for exchange in &lookup.snapshot().failed_exchanges {
        warn!("⚠️  {} unavailable, its column is empty", exchange);
    }

    Ok(lookup)
}

fn rate_cell(rate: Option<Decimal>) -> String {
    rate.map(format_percentage).unwrap_or_else(|| "-".to_string())
}

fn row_limit(limit: Option<usize>) -> usize {
    limit.unwrap_or(usize::MAX)
}

fn print_rates(records: &[FundingRate], timeframe: Timeframe, search: Option<&str>, limit: Option<usize>) {
    println!("\n📊 Funding Rates ({})", timeframe);
    println!(
        "{:<12} {:>12} {:>12} {:>12} {:>12}",
        "Symbol",
        Exchange::Hyperliquid,
        Exchange::Lighter,
        Exchange::Aster,
        Exchange::Extended
    );

    let rows = records
        .iter()
        .filter(|r| matches_query(&r.symbol, search.unwrap_or("")))
        .take(row_limit(limit));

    let mut shown = 0usize;
    for record in rows {
        println!(
            "{:<12} {:>12} {:>12} {:>12} {:>12}",
            record.symbol,
            rate_cell(record.rate(Exchange::Hyperliquid)),
            rate_cell(record.rate(Exchange::Lighter)),
            rate_cell(record.rate(Exchange::Aster)),
            rate_cell(record.rate(Exchange::Extended)),
        );
        shown += 1;
    }

    println!("   └─ {} of {} symbols", shown, records.len());
}

async fn show_spot_arbitrage(
    service: &FundingService,
    clients: &Clients,
    search: Option<&str>,
    limit: Option<usize>,
) -> Result<()> {
    let lookup = load_rates(service).await?;

    let (hl_spot, hl_perps, lighter_spot) = tokio::try_join!(
        clients.hyperliquid.get_spot_markets(),
        clients.hyperliquid.get_perp_markets(),
        clients.lighter.get_spot_markets(),
    )?;

    let empty = RateMap::new();
    let lighter_rates = lookup
        .snapshot()
        .rates_for(Exchange::Lighter)
        .unwrap_or(&empty);

    let opportunities = rank_opportunities([
        calculate_spot_perp_opportunities(Exchange::Hyperliquid, &hl_spot, &hl_perps),
        calculate_rate_only_opportunities(Exchange::Lighter, lighter_spot.keys(), lighter_rates),
    ]);

    println!("\n💰 Spot-Perp Opportunities");
    println!(
        "{:<10} {:<12} {:<22} {:>10} {:>10} {:>10} {:>12} {:>12} {:>12}",
        "Symbol", "Exchange", "Strategy", "Funding", "Hourly", "Daily", "Annual", "Spot", "Perp"
    );

    for opp in opportunities
        .iter()
        .filter(|o| matches_query(&o.symbol, search.unwrap_or("")))
        .take(row_limit(limit))
    {
        println!(
            "{:<10} {:<12} {:<22} {:>10} {:>10} {:>10} {:>12} {:>12.4} {:>12.4}",
            opp.symbol,
            opp.exchange,
            opp.action.description(),
            format_percentage(opp.funding_rate),
            format_percentage(opp.hourly_return),
            format_percentage(opp.daily_return),
            format_percentage(opp.annual_return),
            opp.spot_price,
            opp.perp_price,
        );
    }

    println!("   └─ {} opportunities", opportunities.len());
    Ok(())
}

fn show_perp_arbitrage(lookup: &CacheLookup, search: Option<&str>, limit: Option<usize>) {
    let opportunities = calculate_cross_exchange_arbitrage(&lookup.snapshot().rates);

    println!("\n🔀 Cross-Exchange Perp Opportunities");
    println!(
        "{:<10} {:<20} {:>10} {:>10} {:>10} {:>10} {:>12}",
        "Symbol", "Strategy", "Long", "Short", "Spread", "Daily", "Annual"
    );

    for arb in opportunities
        .iter()
        .filter(|a| matches_query(&a.symbol, search.unwrap_or("")))
        .take(row_limit(limit))
    {
        println!(
            "{:<10} {:<20} {:>10} {:>10} {:>10} {:>10} {:>12}",
            arb.symbol,
            strategy_description(arb),
            format_percentage(arb.long_funding_rate),
            format_percentage(arb.short_funding_rate),
            format_percentage(arb.rate_difference),
            format_percentage(arb.daily_profit),
            format_percentage(arb.annual_profit),
        );
    }

    println!("   └─ {} opportunities", opportunities.len());
}

fn show_extremes(lookup: &CacheLookup, count: usize) {
    let rates = &lookup.snapshot().rates;
    let extremes = funding_extremes(rates, count);

    let print_entries = |title: &str, entries: &[RateEntry]| {
        println!("\n{}", title);
        for entry in entries {
            println!(
                "   ├─ {:<10} {:<12} {:>10}",
                entry.symbol,
                entry.exchange,
                format_percentage(entry.rate)
            );
        }
    };

    print_entries("📈 Highest Funding", &extremes.highest);
    print_entries("📉 Lowest Funding", &extremes.lowest);

    println!("\n📊 Average Funding: {}", rate_cell(average_rate(rates)));
}

async fn show_predicted(clients: &Clients, limit: Option<usize>) -> Result<()> {
    let predicted = clients.hyperliquid.get_predicted_funding_rates().await?;

    let mut rows: Vec<(&String, &Decimal)> = predicted.iter().collect();
    rows.sort_by(|a, b| b.1.abs().cmp(&a.1.abs()).then_with(|| a.0.cmp(b.0)));

    println!("\n🔮 Hyperliquid Predicted Funding");
    for (coin, rate) in rows.into_iter().take(row_limit(limit)) {
        println!("   ├─ {:<10} {:>10}", coin, format_percentage(*rate));
    }
    println!("   └─ {} coins", predicted.len());

    Ok(())
}

async fn show_history(clients: &Clients, coins: &[String], hours: u32) -> Result<()> {
    let coins: Vec<String> = coins.iter().map(|c| c.to_uppercase()).collect();
    let averages = clients
        .hyperliquid
        .historical_average_funding(&coins, hours, Utc::now())
        .await?;

    println!("\n📜 Hyperliquid Average Funding (last {}h)", hours);
    for coin in &coins {
        println!("   ├─ {:<10} {:>10}", coin, rate_cell(averages.get(coin).copied()));
    }
    println!();

    Ok(())
}

async fn watch(
    config: &Config,
    service: &Arc<FundingService>,
    clients: &Clients,
    timeframe: Timeframe,
    refresh_secs: u64,
) {
    info!("👀 Watching funding rates every {}s (Ctrl-C to stop)", refresh_secs);

    let mut ticker = tokio::time::interval(Duration::from_secs(refresh_secs));
    let mut last_fetch: Option<DateTime<Utc>> = None;
    let mut enrichment: Option<EnrichmentHandle> = None;

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            _ = &mut ctrl_c => {
                info!("🛑 Shutdown signal received");
                break;
            }
            _ = ticker.tick() => {}
        }

        let lookup = match load_rates(service).await {
            Ok(lookup) => lookup,
            Err(e) => {
                error!("Refresh failed: {:#}", e);
                continue;
            }
        };

        let snapshot = lookup.snapshot();
        let records =
            aggregate_funding_rates(&snapshot.rates, timeframe, config.aggregation.one_day_view);
        print_rates(&records, timeframe, None, None);

        let refreshed = lookup.is_fresh() && last_fetch != Some(snapshot.fetched_at);
        last_fetch = Some(snapshot.fetched_at);

        if refreshed && config.enrichment.enabled {
            stop_enrichment(enrichment.take()).await;
            enrichment = Some(
                ExtendedEnricher::new(clients.extended.clone(), service.clone())
                    .with_interval(Duration::from_millis(config.enrichment.interval_ms))
                    .spawn(),
            );
        }
    }

    stop_enrichment(enrichment).await;
    info!("👋 Funding Rate Monitor shutdown complete");
}

async fn stop_enrichment(handle: Option<EnrichmentHandle>) {
    let Some(handle) = handle else {
        return;
    };

    handle.cancel();
    match handle.join().await {
        Ok(summary) => info!(
            updated = summary.updated,
            failed = summary.failed,
            cancelled = summary.cancelled,
            "Enrichment stopped"
        ),
        Err(e) => warn!("Enrichment ended with error: {:#}", e),
    }
}
