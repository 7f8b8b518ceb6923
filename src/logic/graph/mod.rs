pub mod arbitrage_graph;
pub mod graph_builder;
pub mod market_view;

pub use arbitrage_graph::{ArbitrageGraph, FastHashMap, FastHasher};
pub use graph_builder::GraphBuilder;
pub use market_view::MarketView;
