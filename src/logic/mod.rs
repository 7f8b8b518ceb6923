/// Logic layer
///
/// Turns refreshed price books into ranked arbitrage cycles:
///
/// - Vertex graph of cross exchange transitions
/// - Bounded length cycle enumeration
/// - Path valuation and direct pair spreads
/// - Scanner orchestration and the polling loop
pub mod cycle_finder;
pub mod graph;
pub mod path_valuator;
pub mod scanner;
pub mod spread;
pub mod types;

#[cfg(test)]
mod tests;

pub use cycle_finder::{CycleFinder, CycleSearch, MIN_CYCLE_LENGTH, find_cycles};
pub use graph::{ArbitrageGraph, GraphBuilder, MarketView};
pub use path_valuator::{PathValuator, ValuationBatch, ValuationError};
pub use scanner::{ScanReport, Scanner, ScannerBuilder, ScannerStats};
pub use spread::{PairSpread, find_pair_spreads};
pub use types::{
    Action, ArbitrageResult, Cycle, LegFill, PhaseTimings, ScanError, ScanPhase, ScannerConfig, VertexState,
};
