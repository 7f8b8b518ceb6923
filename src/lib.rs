// Layered architecture
pub mod data_sync; // Data layer: exchanges, price books, rates, refresh fan-out
pub mod logic; // Logic layer: vertex graph, cycle enumeration, valuation, scanning

// Configuration and common utilities
pub mod config;
pub mod utils;

pub use config::ScannerConfigRoot;
pub use data_sync::{
    Exchange, ExchangeConfig, ExchangeError, ExchangeWrapper, PriceBook, PriceTableConverter, Quote, RateConverter,
    RateError, RateSnapshot, RatesConfig, ReservePool, ReservePoolExchange, SnapshotExchange, StaticExchange,
    StaticRateConverter,
};
pub use logic::{
    Action, ArbitrageGraph, ArbitrageResult, Cycle, CycleFinder, GraphBuilder, LegFill, MarketView, PairSpread,
    PathValuator, ScanError, ScanPhase, ScanReport, Scanner, ScannerBuilder, ScannerConfig, ScannerStats,
    ValuationError, VertexState, find_cycles, find_pair_spreads,
};
pub use utils::{Asset, AssetWrapper, CancelToken, Pair, VertexParseError};
