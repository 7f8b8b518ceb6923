use crate::data_sync::Quote;
use crate::utils::{AssetWrapper, Pair, VERTEX_DELIMITER, VertexParseError, split_pair_name};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt::Display;
use std::str::FromStr;
use std::time::Duration;
use strum_macros::{Display as StrumDisplay, EnumString};
use thiserror::Error;

/// Errors that make a whole scan impossible. Everything per exchange or per cycle is contained.
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("no exchanges configured")]
    NoExchanges,
    #[error("duplicate exchange name {0}")]
    DuplicateExchange(String),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("scan cancelled")]
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, StrumDisplay, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Buy,
    Sell,
}

impl Action {
    /// Asset spent by this action: buying spends the quote asset, selling spends the base asset.
    pub fn input_asset<'a>(&self, pair: &'a Pair) -> &'a AssetWrapper {
        match self {
            Action::Buy => &pair.quote,
            Action::Sell => &pair.base,
        }
    }

    /// Asset held after this action.
    pub fn output_asset<'a>(&self, pair: &'a Pair) -> &'a AssetWrapper {
        match self {
            Action::Buy => &pair.base,
            Action::Sell => &pair.quote,
        }
    }

    pub fn price(&self, quote: &Quote) -> f64 {
        match self {
            Action::Buy => quote.buy_price,
            Action::Sell => quote.sell_price,
        }
    }

    /// This side of `quote` has a usable price and depth.
    pub fn is_available(&self, quote: &Quote) -> bool {
        match self {
            Action::Buy => quote.can_buy(),
            Action::Sell => quote.can_sell(),
        }
    }

    pub fn depth(&self, quote: &Quote) -> f64 {
        match self {
            Action::Buy => quote.buy_amount,
            Action::Sell => quote.sell_amount,
        }
    }
}

/// "Holding the asset produced by `action` on `pair` at `exchange`".
///
/// The key `{exchange}_{pair}_{action}` is built once on construction and is the vertex identity
/// used for ordering.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VertexState {
    exchange: String,
    pair: String,
    action: Action,
    key: String,
}

impl VertexState {
    pub fn new(exchange: &str, pair: &str, action: Action) -> Result<Self, VertexParseError> {
        if exchange.is_empty() {
            return Err(VertexParseError::MalformedVertex(format!("{exchange}{VERTEX_DELIMITER}{pair}{VERTEX_DELIMITER}{action}")));
        }
        split_pair_name(pair)?;
        Ok(Self {
            exchange: exchange.to_string(),
            pair: pair.to_string(),
            action,
            key: format!("{exchange}{VERTEX_DELIMITER}{pair}{VERTEX_DELIMITER}{action}"),
        })
    }

    pub fn exchange(&self) -> &str {
        &self.exchange
    }

    pub fn pair(&self) -> &str {
        &self.pair
    }

    pub fn action(&self) -> Action {
        self.action
    }

    pub fn key(&self) -> &str {
        &self.key
    }
}

impl Display for VertexState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.key)
    }
}

impl FromStr for VertexState {
    type Err = VertexParseError;

    // Pair names never contain the delimiter, so action and pair are split off the right and
    // whatever remains is the exchange name.
    fn from_str(key: &str) -> Result<Self, Self::Err> {
        let mut parts = key.rsplitn(3, VERTEX_DELIMITER);
        let (Some(action), Some(pair), Some(exchange)) = (parts.next(), parts.next(), parts.next()) else {
            return Err(VertexParseError::MalformedVertex(key.to_string()));
        };
        let action = Action::from_str(action).map_err(|_: strum::ParseError| VertexParseError::UnknownAction(action.to_string()))?;
        VertexState::new(exchange, pair, action)
    }
}

impl Serialize for VertexState {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.key)
    }
}

/// Orders two vertex sequences by their keys, element by element.
pub fn cmp_by_keys(a: &[VertexState], b: &[VertexState]) -> Ordering {
    a.iter().map(VertexState::key).cmp(b.iter().map(VertexState::key))
}

pub fn route_to_string(route: &[VertexState]) -> String {
    route.iter().map(VertexState::key).collect::<Vec<_>>().join(" -> ")
}

/// A closed walk of distinct vertex states, rotated to start at its smallest key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Cycle {
    vertices: Vec<VertexState>,
}

impl Cycle {
    pub fn new(mut vertices: Vec<VertexState>) -> Self {
        if let Some(start) = vertices.iter().enumerate().min_by(|(_, a), (_, b)| a.key().cmp(b.key())).map(|(i, _)| i) {
            vertices.rotate_left(start);
        }
        Self { vertices }
    }

    pub fn vertices(&self) -> &[VertexState] {
        &self.vertices
    }

    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    pub fn into_vertices(self) -> Vec<VertexState> {
        self.vertices
    }
}

impl PartialOrd for Cycle {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Cycle {
    fn cmp(&self, other: &Self) -> Ordering {
        cmp_by_keys(&self.vertices, &other.vertices)
    }
}

impl Display for Cycle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", route_to_string(&self.vertices))
    }
}

/// One executed step of a valued route.
#[derive(Debug, Clone, Serialize)]
pub struct LegFill {
    pub vertex: VertexState,
    pub price: f64,
    pub amount_in: f64,
    pub amount_out: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ArbitrageResult {
    pub cycle: Vec<VertexState>,
    pub initial_amount: f64,
    pub final_amount: f64,
    pub profit_percent: f64,
    pub legs: Vec<LegFill>,
}

impl ArbitrageResult {
    pub fn is_profitable(&self, min_profit_percent: f64) -> bool {
        self.profit_percent > min_profit_percent
    }

    pub fn route(&self) -> String {
        route_to_string(&self.cycle)
    }
}

/// Scanner settings, the `[scanner]` config section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScannerConfig {
    /// Longest cycle to enumerate, inclusive. At least 3.
    pub max_cycle_length: usize,
    /// Results must be strictly above this percentage.
    pub min_profit_percent: f64,
    pub poll_interval_ms: u64,
    pub refresh_timeout_ms: u64,
    pub max_concurrent_refreshes: usize,
    /// Enumeration stops after this many cycles.
    pub max_cycles: usize,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            max_cycle_length: 4,
            min_profit_percent: 0.0,
            poll_interval_ms: 3_000,
            refresh_timeout_ms: 10_000,
            max_concurrent_refreshes: 8,
            max_cycles: 50_000,
        }
    }
}

impl ScannerConfig {
    /// Defaults overridden by `SCANNER_*` environment variables.
    pub fn from_env() -> eyre::Result<Self> {
        Self::default().with_env_overrides()
    }

    pub fn with_env_overrides(self) -> eyre::Result<Self> {
        self.with_overrides(|name| std::env::var(name).ok())
    }

    /// Applies `SCANNER_*` values returned by `lookup`, then validates.
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> eyre::Result<Self> {
        if let Some(value) = lookup("SCANNER_MAX_CYCLE_LENGTH") {
            self.max_cycle_length = value.parse().map_err(|e| eyre::eyre!("Invalid SCANNER_MAX_CYCLE_LENGTH: {}", e))?;
        }
        if let Some(value) = lookup("SCANNER_MIN_PROFIT_PERCENT") {
            self.min_profit_percent = value.parse().map_err(|e| eyre::eyre!("Invalid SCANNER_MIN_PROFIT_PERCENT: {}", e))?;
        }
        if let Some(value) = lookup("SCANNER_POLL_INTERVAL_MS") {
            self.poll_interval_ms = value.parse().map_err(|e| eyre::eyre!("Invalid SCANNER_POLL_INTERVAL_MS: {}", e))?;
        }
        if let Some(value) = lookup("SCANNER_REFRESH_TIMEOUT_MS") {
            self.refresh_timeout_ms = value.parse().map_err(|e| eyre::eyre!("Invalid SCANNER_REFRESH_TIMEOUT_MS: {}", e))?;
        }
        if let Some(value) = lookup("SCANNER_MAX_CONCURRENT_REFRESHES") {
            self.max_concurrent_refreshes =
                value.parse().map_err(|e| eyre::eyre!("Invalid SCANNER_MAX_CONCURRENT_REFRESHES: {}", e))?;
        }
        if let Some(value) = lookup("SCANNER_MAX_CYCLES") {
            self.max_cycles = value.parse().map_err(|e| eyre::eyre!("Invalid SCANNER_MAX_CYCLES: {}", e))?;
        }
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<(), ScanError> {
        if self.max_cycle_length < 3 {
            return Err(ScanError::InvalidConfig(format!("max_cycle_length must be at least 3, got {}", self.max_cycle_length)));
        }
        if !self.min_profit_percent.is_finite() {
            return Err(ScanError::InvalidConfig("min_profit_percent must be finite".to_string()));
        }
        if self.max_concurrent_refreshes == 0 {
            return Err(ScanError::InvalidConfig("max_concurrent_refreshes must be at least 1".to_string()));
        }
        if self.max_cycles == 0 {
            return Err(ScanError::InvalidConfig("max_cycles must be at least 1".to_string()));
        }
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn refresh_timeout(&self) -> Duration {
        Duration::from_millis(self.refresh_timeout_ms)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, StrumDisplay)]
pub enum ScanPhase {
    Idle,
    Refreshing,
    Building,
    Enumerating,
    Valuating,
    Reporting,
}

/// Wall time spent per phase of one scan.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct PhaseTimings {
    pub refresh: Duration,
    pub build: Duration,
    pub enumerate: Duration,
    pub valuate: Duration,
}

impl PhaseTimings {
    pub fn total(&self) -> Duration {
        self.refresh + self.build + self.enumerate + self.valuate
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_vertex_key_round_trip() -> eyre::Result<()> {
        let vertex = VertexState::new("Uniswap_V2", "WETH-USDC", Action::Buy)?;
        assert_eq!(vertex.to_string(), "Uniswap_V2_WETH-USDC_buy");

        let parsed: VertexState = "Uniswap_V2_WETH-USDC_buy".parse()?;
        assert_eq!(parsed.exchange(), "Uniswap_V2");
        assert_eq!(parsed.pair(), "WETH-USDC");
        assert_eq!(parsed.action(), Action::Buy);
        assert_eq!(parsed, vertex);
        Ok(())
    }

    #[test]
    fn test_vertex_parse_errors() {
        assert_eq!("A_WETH-USDC_hold".parse::<VertexState>().unwrap_err(), VertexParseError::UnknownAction("hold".to_string()));
        assert_eq!("WETH-USDC_buy".parse::<VertexState>().unwrap_err(), VertexParseError::MalformedVertex("WETH-USDC_buy".to_string()));
        assert_eq!("A_WETHUSDC_sell".parse::<VertexState>().unwrap_err(), VertexParseError::MalformedPair("WETHUSDC".to_string()));
        assert!("_WETH-USDC_sell".parse::<VertexState>().is_err());
    }

    #[test]
    fn test_action_assets() -> eyre::Result<()> {
        let pair = Pair::parse("WETH-USDC")?;
        assert_eq!(Action::Buy.output_asset(&pair).get_symbol(), "WETH");
        assert_eq!(Action::Buy.input_asset(&pair).get_symbol(), "USDC");
        assert_eq!(Action::Sell.output_asset(&pair).get_symbol(), "USDC");
        assert_eq!(Action::Sell.input_asset(&pair).get_symbol(), "WETH");
        Ok(())
    }

    #[test]
    fn test_cycle_is_rotated_to_smallest_key() -> eyre::Result<()> {
        let c = VertexState::new("C", "WETH-USDC", Action::Sell)?;
        let a = VertexState::new("A", "X-USDC", Action::Buy)?;
        let b = VertexState::new("B", "X-WETH", Action::Sell)?;

        let cycle = Cycle::new(vec![b.clone(), c.clone(), a.clone()]);

        assert_eq!(cycle.vertices(), &[a, b, c]);
        assert_eq!(cycle.to_string(), "A_X-USDC_buy -> B_X-WETH_sell -> C_WETH-USDC_sell");
        Ok(())
    }

    #[test]
    fn test_config_validation() {
        assert!(ScannerConfig::default().validate().is_ok());
        let short = ScannerConfig { max_cycle_length: 2, ..ScannerConfig::default() };
        assert!(matches!(short.validate(), Err(ScanError::InvalidConfig(_))));
        let nan = ScannerConfig { min_profit_percent: f64::NAN, ..ScannerConfig::default() };
        assert!(nan.validate().is_err());
    }

    #[test]
    fn test_action_names() {
        assert_eq!(Action::Buy.to_string(), "buy");
        assert_eq!("sell".parse::<Action>(), Ok(Action::Sell));
        assert_eq!("hold".parse::<Action>(), Err(strum::ParseError::VariantNotFound));
    }

    #[test]
    fn test_config_overrides() -> eyre::Result<()> {
        let values = HashMap::from([("SCANNER_MAX_CYCLE_LENGTH", "6"), ("SCANNER_MIN_PROFIT_PERCENT", "-0.2")]);
        let lookup = |name: &str| values.get(name).map(|v| v.to_string());

        let config = ScannerConfig::default().with_overrides(lookup)?;

        assert_eq!(config.max_cycle_length, 6);
        assert_eq!(config.min_profit_percent, -0.2);
        assert_eq!(config.poll_interval_ms, 3_000);
        Ok(())
    }

    #[test]
    fn test_invalid_overrides_are_rejected() {
        let unparsable = ScannerConfig::default().with_overrides(|name| (name == "SCANNER_MAX_CYCLES").then(|| "many".to_string()));
        assert!(unparsable.is_err());
        let too_short = ScannerConfig::default().with_overrides(|name| (name == "SCANNER_MAX_CYCLE_LENGTH").then(|| "2".to_string()));
        assert!(too_short.is_err());
    }
}
