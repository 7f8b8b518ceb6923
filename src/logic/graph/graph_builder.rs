use super::arbitrage_graph::ArbitrageGraph;
use super::market_view::MarketView;
use crate::data_sync::{Exchange, Quote};
use crate::logic::types::{Action, VertexState};
use crate::utils::Pair;
use tracing::debug;

/// Builds the cross exchange transition graph for one scan pass.
pub struct GraphBuilder;

impl GraphBuilder {
    /// For every ordered pair of distinct exchanges, connects each vertex of the first exchange to
    /// every pair of the second exchange that trades the asset the vertex holds.
    ///
    /// Holding the base of the target pair leads to a sell, holding its quote leads to a buy.
    /// The base side is checked first, so a pair matching on both sides becomes a sell. Each side
    /// of a quote stands alone: an unusable buy side drops only the buy vertex of that pair.
    pub fn build(view: &MarketView<'_>) -> ArbitrageGraph {
        let markets: Vec<(&str, Vec<(Pair, Quote)>)> = view.iter().map(|(name, exchange)| (name, quoted_pairs(exchange))).collect();

        let mut graph = ArbitrageGraph::new();
        for (from_name, from_pairs) in &markets {
            for (to_name, to_pairs) in &markets {
                if from_name == to_name {
                    continue;
                }
                for (from_pair, from_quote) in from_pairs {
                    for action in [Action::Buy, Action::Sell] {
                        if !action.is_available(from_quote) {
                            continue;
                        }
                        let held = action.output_asset(from_pair);
                        let Ok(from_vertex) = VertexState::new(from_name, &from_pair.name, action) else {
                            continue;
                        };
                        for (to_pair, to_quote) in to_pairs {
                            let to_action = if held.same_asset(&to_pair.base) {
                                Action::Sell
                            } else if held.same_asset(&to_pair.quote) {
                                Action::Buy
                            } else {
                                continue;
                            };
                            if !to_action.is_available(to_quote) {
                                continue;
                            }
                            let Ok(to_vertex) = VertexState::new(to_name, &to_pair.name, to_action) else {
                                continue;
                            };
                            graph.add_edge(from_vertex.clone(), to_vertex);
                        }
                    }
                }
            }
        }

        debug!(exchanges = view.len(), vertices = graph.vertex_count(), edges = graph.edge_count(), "Built arbitrage graph");
        graph
    }
}

/// Pairs with at least one usable side in the exchange's current book, in name order.
fn quoted_pairs(exchange: &dyn Exchange) -> Vec<(Pair, Quote)> {
    exchange
        .price_book()
        .iter()
        .filter(|(_, quote)| quote.can_buy() || quote.can_sell())
        .filter_map(|(name, quote)| match exchange.pair(name) {
            Some(pair) => Some((pair.clone(), *quote)),
            None => match Pair::parse(name) {
                Ok(pair) => Some((pair, *quote)),
                Err(e) => {
                    debug!(exchange = exchange.name(), "Skipping pair without metadata: {}", e);
                    None
                }
            },
        })
        .collect()
}
