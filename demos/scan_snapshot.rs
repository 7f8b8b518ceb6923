//! One scan pass over the exchanges in a config file.
//!
//! ```text
//! cargo run --example scan_snapshot -- config/scanner.toml
//! ```

use cycle_arb::ScannerConfigRoot;
use eyre::Result;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    let config_file = std::env::args().nth(1).unwrap_or_else(|| "config/scanner.toml".to_string());
    info!("Loading {}", config_file);
    let root = ScannerConfigRoot::load(config_file).await?;
    let mut scanner = root.into_builder()?.build()?;

    let report = scanner.scan().await?;

    info!(
        cycles = report.cycles_found,
        valued = report.cycles_valued,
        skipped = report.skipped,
        truncated = report.truncated,
        "Scan finished in {:?}",
        report.timings.total()
    );
    for (exchange, error) in &report.degraded {
        info!("Excluded {}: {}", exchange, error);
    }
    for result in &report.results {
        info!("{:>8.4}%  {}", result.profit_percent, result.route());
        for leg in &result.legs {
            info!("          {} at {} : {} -> {}", leg.vertex, leg.price, leg.amount_in, leg.amount_out);
        }
    }
    for spread in &report.spreads {
        info!(
            "{:>8.4}%  {} buy on {} at {}, sell on {} at {}",
            spread.profit_percent, spread.pair, spread.buy_exchange, spread.buy_price, spread.sell_exchange, spread.sell_price
        );
    }
    if report.results.is_empty() && report.spreads.is_empty() {
        info!("No opportunity above {}%", scanner.config().min_profit_percent);
    }
    Ok(())
}
