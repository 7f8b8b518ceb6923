use super::graph::MarketView;
use crate::data_sync::Exchange;
use serde::Serialize;
use tracing::debug;

/// Buying a pair on one exchange and selling it straight back on another.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PairSpread {
    pub pair: String,
    pub buy_exchange: String,
    pub sell_exchange: String,
    pub buy_price: f64,
    pub sell_price: f64,
    pub profit_percent: f64,
}

/// Two leg opportunities the cycle finder leaves out, for every pair quoted on two exchanges.
///
/// Both directions are reported, `(sell_price - buy_price) / buy_price * 100`, sorted by profit
/// descending. A direction needs a usable buy side on one exchange and a usable sell side on the
/// other. Pairs whose assets resolve to different addresses are not compared. When either exchange
/// has no metadata for the pair, the pair name alone decides.
pub fn find_pair_spreads(view: &MarketView<'_>) -> Vec<PairSpread> {
    let exchanges: Vec<(&str, &dyn Exchange)> = view.iter().collect();
    let mut spreads = Vec::new();

    for (i, (name1, exchange1)) in exchanges.iter().enumerate() {
        for (name2, exchange2) in exchanges.iter().skip(i + 1) {
            for (pair, quote1) in exchange1.price_book().iter() {
                let Some(quote2) = exchange2.price_book().get(pair) else {
                    continue;
                };
                if !same_market(*exchange1, *exchange2, pair) {
                    continue;
                }
                if quote1.can_buy() && quote2.can_sell() {
                    spreads.push(spread(pair, name1, quote1.buy_price, name2, quote2.sell_price));
                }
                if quote2.can_buy() && quote1.can_sell() {
                    spreads.push(spread(pair, name2, quote2.buy_price, name1, quote1.sell_price));
                }
            }
        }
    }

    spreads.sort_by(|a, b| {
        b.profit_percent
            .total_cmp(&a.profit_percent)
            .then_with(|| a.pair.cmp(&b.pair))
            .then_with(|| a.buy_exchange.cmp(&b.buy_exchange))
    });
    debug!(spreads = spreads.len(), "Computed direct pair spreads");
    spreads
}

fn spread(pair: &str, buy_exchange: &str, buy_price: f64, sell_exchange: &str, sell_price: f64) -> PairSpread {
    PairSpread {
        pair: pair.to_string(),
        buy_exchange: buy_exchange.to_string(),
        sell_exchange: sell_exchange.to_string(),
        buy_price,
        sell_price,
        profit_percent: (sell_price - buy_price) / buy_price * 100.0,
    }
}

// Without metadata on one side the matching pair name is all there is to compare.
fn same_market(exchange1: &dyn Exchange, exchange2: &dyn Exchange, pair: &str) -> bool {
    match (exchange1.pair(pair), exchange2.pair(pair)) {
        (Some(p1), Some(p2)) => p1.base.same_asset(&p2.base) && p1.quote.same_asset(&p2.quote),
        _ => true,
    }
}
