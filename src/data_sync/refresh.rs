use crate::data_sync::exchanges::{ExchangeError, ExchangeWrapper};
use crate::data_sync::rates::RateSnapshot;
use futures::stream::{self, StreamExt};
use std::time::Duration;
use tracing::{debug, warn};

/// Result of one refresh fan-out. Both lists are sorted by exchange name.
#[derive(Debug, Default)]
pub struct RefreshOutcome {
    pub healthy: Vec<String>,
    pub failed: Vec<(String, ExchangeError)>,
}

impl RefreshOutcome {
    pub fn is_degraded(&self) -> bool {
        !self.failed.is_empty()
    }

    pub fn is_healthy(&self, exchange: &str) -> bool {
        self.healthy.iter().any(|name| name == exchange)
    }
}

/// Refresh every exchange with at most `max_concurrent` refreshes in flight.
///
/// Each refresh future borrows its own exchange mutably, so no two futures touch the same
/// price book. Collecting the stream is the join barrier. A refresh that errors or outlives
/// `timeout` marks its exchange as failed for this pass.
pub async fn refresh_all(
    exchanges: &mut [ExchangeWrapper],
    rates: &RateSnapshot,
    timeout: Duration,
    max_concurrent: usize,
) -> RefreshOutcome {
    let after_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);

    let tasks: Vec<_> = exchanges.iter_mut().map(|exchange| refresh_one(exchange, rates, timeout, after_ms)).collect();
    let results: Vec<(String, Result<(), ExchangeError>)> =
        stream::iter(tasks).buffer_unordered(max_concurrent.max(1)).collect().await;

    let mut outcome = RefreshOutcome::default();
    for (name, result) in results {
        match result {
            Ok(()) => outcome.healthy.push(name),
            Err(e) => {
                warn!(exchange = %name, "Price book refresh failed, exchange excluded from this pass: {}", e);
                outcome.failed.push((name, e));
            }
        }
    }
    outcome.healthy.sort();
    outcome.failed.sort_by(|a, b| a.0.cmp(&b.0));

    debug!(healthy = outcome.healthy.len(), failed = outcome.failed.len(), "Refresh join complete");
    outcome
}

async fn refresh_one(
    exchange: &mut ExchangeWrapper,
    rates: &RateSnapshot,
    timeout: Duration,
    after_ms: u64,
) -> (String, Result<(), ExchangeError>) {
    let name = exchange.name().to_string();
    let result = match tokio::time::timeout(timeout, exchange.refresh_price_book(rates)).await {
        Ok(result) => result,
        Err(_) => Err(ExchangeError::Timeout { exchange: name.clone(), after_ms }),
    };
    (name, result)
}
