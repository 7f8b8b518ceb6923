//! Polls the configured exchanges and prints the best cycle of every pass.
//!
//! Stops after `SCAN_PASSES` passes (default 5).

use cycle_arb::{CancelToken, ScanReport, ScannerConfigRoot};
use eyre::Result;
use tokio::sync::mpsc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .with_line_number(true)
        .init();

    let config_file = std::env::args().nth(1).unwrap_or_else(|| "config/scanner.toml".to_string());
    let passes: u64 = match std::env::var("SCAN_PASSES") {
        Ok(value) => value.parse()?,
        Err(_) => 5,
    };

    let root = ScannerConfigRoot::load(config_file).await?;
    let mut scanner = root.into_builder()?.build()?;

    let (sender, mut receiver) = mpsc::channel::<ScanReport>(4);
    let cancel = CancelToken::new();

    let consumer = {
        let cancel = cancel.clone();
        async move {
            let mut seen = 0;
            while let Some(report) = receiver.recv().await {
                seen += 1;
                if report.is_degraded() {
                    warn!(pass = seen, degraded = report.degraded.len(), "Degraded pass");
                }
                match report.best() {
                    Some(best) => info!(pass = seen, "Best {:.4}% {}", best.profit_percent, best.route()),
                    None => info!(pass = seen, cycles = report.cycles_found, "Nothing profitable"),
                }
                if seen >= passes {
                    cancel.cancel();
                    break;
                }
            }
        }
    };

    let (scan_result, _) = tokio::join!(scanner.run(sender, cancel.clone()), consumer);
    scan_result?;

    let stats = scanner.stats();
    info!(passes = stats.passes, last_best = ?stats.last_best_profit_percent, "Done");
    Ok(())
}
