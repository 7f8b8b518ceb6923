use super::cycle_finder::CycleFinder;
use super::graph::{GraphBuilder, MarketView};
use super::path_valuator::PathValuator;
use super::spread::{PairSpread, find_pair_spreads};
use super::types::{ArbitrageResult, PhaseTimings, ScanError, ScanPhase, ScannerConfig, cmp_by_keys};
use crate::data_sync::{Exchange, ExchangeWrapper, RateConverter, RateSnapshot, refresh_all};
use crate::utils::CancelToken;
use serde::Serialize;
use std::collections::HashSet;
use std::time::Instant;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Everything one pass produced.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ScanReport {
    /// Cycles above the profit threshold, best first.
    pub results: Vec<ArbitrageResult>,
    /// Two leg spreads above the profit threshold, best first.
    pub spreads: Vec<PairSpread>,
    pub cycles_found: usize,
    pub cycles_valued: usize,
    pub skipped: usize,
    /// Enumeration hit `max_cycles`.
    pub truncated: bool,
    /// Exchanges left out of this pass and why.
    pub degraded: Vec<(String, String)>,
    pub timings: PhaseTimings,
}

impl ScanReport {
    pub fn best(&self) -> Option<&ArbitrageResult> {
        self.results.first()
    }

    pub fn is_degraded(&self) -> bool {
        !self.degraded.is_empty()
    }
}

#[derive(Debug, Clone, Default)]
pub struct ScannerStats {
    pub passes: u64,
    pub last_cycles_found: usize,
    pub last_opportunities: usize,
    pub last_best_profit_percent: Option<f64>,
    pub last_degraded: usize,
}

/// Refresh, build, enumerate, value and report, once per `scan` call.
///
/// Nothing but the last rate snapshot survives between passes: the graph, the cycles and the
/// results are rebuilt every time.
pub struct Scanner {
    exchanges: Vec<ExchangeWrapper>,
    rate_converter: Option<Box<dyn RateConverter>>,
    rates: RateSnapshot,
    config: ScannerConfig,
    phase: ScanPhase,
    stats: ScannerStats,
}

impl Scanner {
    pub fn config(&self) -> &ScannerConfig {
        &self.config
    }

    pub fn stats(&self) -> &ScannerStats {
        &self.stats
    }

    pub fn phase(&self) -> ScanPhase {
        self.phase
    }

    pub fn rates(&self) -> &RateSnapshot {
        &self.rates
    }

    pub fn exchanges(&self) -> &[ExchangeWrapper] {
        &self.exchanges
    }

    pub fn exchanges_mut(&mut self) -> &mut [ExchangeWrapper] {
        &mut self.exchanges
    }

    pub async fn scan(&mut self) -> Result<ScanReport, ScanError> {
        self.scan_inner(None).await
    }

    /// Like `scan`, but gives up with `ScanError::Cancelled` at the next phase boundary once
    /// `cancel` fires.
    pub async fn scan_with_cancel(&mut self, cancel: &CancelToken) -> Result<ScanReport, ScanError> {
        self.scan_inner(Some(cancel)).await
    }

    async fn scan_inner(&mut self, cancel: Option<&CancelToken>) -> Result<ScanReport, ScanError> {
        if self.exchanges.is_empty() {
            return Err(ScanError::NoExchanges);
        }
        let result = self.run_phases(cancel).await;
        self.phase = ScanPhase::Idle;
        result
    }

    async fn run_phases(&mut self, cancel: Option<&CancelToken>) -> Result<ScanReport, ScanError> {
        let mut report = ScanReport::default();

        self.phase = ScanPhase::Refreshing;
        debug!(phase = %self.phase, "Scan phase");
        let started = Instant::now();
        self.update_rates().await;
        let outcome = refresh_all(&mut self.exchanges, &self.rates, self.config.refresh_timeout(), self.config.max_concurrent_refreshes).await;
        report.degraded = outcome.failed.iter().map(|(name, e)| (name.clone(), e.to_string())).collect();
        report.timings.refresh = started.elapsed();
        check_cancelled(cancel)?;

        self.phase = ScanPhase::Building;
        debug!(phase = %self.phase, "Scan phase");
        let started = Instant::now();
        let healthy: HashSet<&str> = outcome.healthy.iter().map(String::as_str).collect();
        let view = MarketView::new(self.exchanges.iter().map(|e| &**e).filter(|e| healthy.contains(e.name())))?;
        let graph = GraphBuilder::build(&view);
        report.timings.build = started.elapsed();

        self.phase = ScanPhase::Enumerating;
        debug!(phase = %self.phase, vertices = graph.vertex_count(), edges = graph.edge_count(), "Scan phase");
        let started = Instant::now();
        let search = CycleFinder::new(self.config.max_cycle_length, self.config.max_cycles).find_cycles(&graph, cancel)?;
        report.cycles_found = search.cycles.len();
        report.truncated = search.truncated;
        report.timings.enumerate = started.elapsed();
        check_cancelled(cancel)?;

        self.phase = ScanPhase::Valuating;
        debug!(phase = %self.phase, cycles = report.cycles_found, "Scan phase");
        let started = Instant::now();
        let batch = PathValuator::new(&view).value_all(&search.cycles);
        report.cycles_valued = batch.results.len();
        report.skipped = batch.skipped;
        report.timings.valuate = started.elapsed();

        self.phase = ScanPhase::Reporting;
        debug!(phase = %self.phase, "Scan phase");
        let threshold = self.config.min_profit_percent;
        let mut results: Vec<ArbitrageResult> = batch.results.into_iter().filter(|r| r.is_profitable(threshold)).collect();
        results.sort_by(|a, b| b.profit_percent.total_cmp(&a.profit_percent).then_with(|| cmp_by_keys(&a.cycle, &b.cycle)));
        report.results = results;
        report.spreads = find_pair_spreads(&view).into_iter().filter(|s| s.profit_percent > threshold).collect();

        self.stats.passes += 1;
        self.stats.last_cycles_found = report.cycles_found;
        self.stats.last_opportunities = report.results.len();
        self.stats.last_best_profit_percent = report.best().map(|r| r.profit_percent);
        self.stats.last_degraded = report.degraded.len();

        match report.best() {
            Some(best) => info!(
                cycles = report.cycles_found,
                valued = report.cycles_valued,
                opportunities = report.results.len(),
                degraded = report.degraded.len(),
                "Best cycle {} at {:.4}%",
                best.route(),
                best.profit_percent
            ),
            None => info!(
                cycles = report.cycles_found,
                valued = report.cycles_valued,
                degraded = report.degraded.len(),
                "No cycle above {}%",
                threshold
            ),
        }
        Ok(report)
    }

    /// A failed conversion keeps the previous snapshot.
    async fn update_rates(&mut self) {
        let Some(converter) = &self.rate_converter else {
            return;
        };
        match converter.convert().await {
            Ok(rates) => self.rates = rates,
            Err(e) => warn!("Rate conversion failed, reusing previous rates: {}", e),
        }
    }

    /// Scans until `cancel` fires or the receiver goes away, sending every report.
    ///
    /// Structural errors end the loop. Everything else is absorbed inside a pass.
    pub async fn run(&mut self, sender: mpsc::Sender<ScanReport>, cancel: CancelToken) -> Result<(), ScanError> {
        info!(exchanges = self.exchanges.len(), interval_ms = self.config.poll_interval_ms, "Starting scanner loop");
        loop {
            if cancel.is_cancelled() {
                break;
            }
            match self.scan_with_cancel(&cancel).await {
                Ok(report) => {
                    if sender.send(report).await.is_err() {
                        info!("Report receiver closed, stopping scanner loop");
                        break;
                    }
                }
                Err(ScanError::Cancelled) => break,
                Err(e) => return Err(e),
            }
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(self.config.poll_interval()) => {}
            }
        }
        info!(passes = self.stats.passes, "Scanner loop stopped");
        Ok(())
    }
}

fn check_cancelled(cancel: Option<&CancelToken>) -> Result<(), ScanError> {
    if cancel.is_some_and(CancelToken::is_cancelled) {
        return Err(ScanError::Cancelled);
    }
    Ok(())
}

pub struct ScannerBuilder {
    exchanges: Vec<ExchangeWrapper>,
    rate_converter: Option<Box<dyn RateConverter>>,
    rates: RateSnapshot,
    config: ScannerConfig,
}

impl ScannerBuilder {
    pub fn new() -> Self {
        Self { exchanges: Vec::new(), rate_converter: None, rates: RateSnapshot::new(), config: ScannerConfig::default() }
    }

    pub fn with_exchange<E: Exchange + 'static>(mut self, exchange: E) -> Self {
        self.exchanges.push(Box::new(exchange));
        self
    }

    pub fn with_boxed_exchange(mut self, exchange: ExchangeWrapper) -> Self {
        self.exchanges.push(exchange);
        self
    }

    pub fn with_rate_converter<R: RateConverter + 'static>(mut self, converter: R) -> Self {
        self.rate_converter = Some(Box::new(converter));
        self
    }

    /// Rates used until the converter produces its first snapshot.
    pub fn with_initial_rates(mut self, rates: RateSnapshot) -> Self {
        self.rates = rates;
        self
    }

    pub fn with_config(mut self, config: ScannerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_max_cycle_length(mut self, max_cycle_length: usize) -> Self {
        self.config.max_cycle_length = max_cycle_length;
        self
    }

    pub fn with_min_profit_percent(mut self, min_profit_percent: f64) -> Self {
        self.config.min_profit_percent = min_profit_percent;
        self
    }

    pub fn build(self) -> Result<Scanner, ScanError> {
        self.config.validate()?;
        if self.exchanges.is_empty() {
            return Err(ScanError::NoExchanges);
        }
        let mut names = HashSet::new();
        for exchange in &self.exchanges {
            if !names.insert(exchange.name()) {
                return Err(ScanError::DuplicateExchange(exchange.name().to_string()));
            }
        }
        Ok(Scanner {
            exchanges: self.exchanges,
            rate_converter: self.rate_converter,
            rates: self.rates,
            config: self.config,
            phase: ScanPhase::Idle,
            stats: ScannerStats::default(),
        })
    }
}

impl Default for ScannerBuilder {
    fn default() -> Self {
        Self::new()
    }
}
