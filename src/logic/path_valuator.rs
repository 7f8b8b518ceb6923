use super::graph::MarketView;
use super::types::{Action, ArbitrageResult, Cycle, LegFill, VertexState, route_to_string};
use thiserror::Error;
use tracing::debug;

/// Reasons a single route cannot be valued. None of them abort a scan.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValuationError {
    #[error("route is empty")]
    EmptyCycle,
    #[error("unknown exchange {0}")]
    UnknownExchange(String),
    #[error("no quote for {0}")]
    MissingQuote(String),
    #[error("invalid price {price} at {vertex}")]
    InvalidPrice { vertex: String, price: f64 },
    #[error("initial amount at {vertex} is {amount}, must be positive")]
    ZeroInitialAmount { vertex: String, amount: f64 },
    #[error("non-finite amount after {0}")]
    NonFinite(String),
}

#[derive(Debug, Default)]
pub struct ValuationBatch {
    pub results: Vec<ArbitrageResult>,
    pub skipped: usize,
}

/// Replays a route of quotes against the current price books.
///
/// The first leg fixes the capital: a leading buy spends `buy_amount * buy_price` of the quote
/// asset, a leading sell spends `sell_amount` of the base asset. Each buy then divides the carried
/// amount by its price and each sell multiplies by it. No rounding happens along the way.
pub struct PathValuator<'a> {
    view: &'a MarketView<'a>,
}

impl<'a> PathValuator<'a> {
    pub fn new(view: &'a MarketView<'a>) -> Self {
        Self { view }
    }

    pub fn value(&self, route: &[VertexState]) -> Result<ArbitrageResult, ValuationError> {
        let mut initial_amount = None;
        let mut amount_in = 0.0;
        let mut legs = Vec::with_capacity(route.len());

        for vertex in route {
            let exchange = self.view.get(vertex.exchange()).ok_or_else(|| ValuationError::UnknownExchange(vertex.exchange().to_string()))?;
            let quote = exchange.price_book().get(vertex.pair()).ok_or_else(|| ValuationError::MissingQuote(vertex.key().to_string()))?;
            let price = vertex.action().price(quote);
            if !price.is_finite() || price <= 0.0 {
                return Err(ValuationError::InvalidPrice { vertex: vertex.key().to_string(), price });
            }

            if initial_amount.is_none() {
                let initial = match vertex.action() {
                    Action::Buy => quote.buy_amount * price,
                    Action::Sell => quote.sell_amount,
                };
                if !initial.is_finite() || initial <= 0.0 {
                    return Err(ValuationError::ZeroInitialAmount { vertex: vertex.key().to_string(), amount: initial });
                }
                initial_amount = Some(initial);
                amount_in = initial;
            }

            let amount_out = match vertex.action() {
                Action::Buy => amount_in / price,
                Action::Sell => amount_in * price,
            };
            if !amount_out.is_finite() {
                return Err(ValuationError::NonFinite(vertex.key().to_string()));
            }
            legs.push(LegFill { vertex: vertex.clone(), price, amount_in, amount_out });
            amount_in = amount_out;
        }

        let initial_amount = initial_amount.ok_or(ValuationError::EmptyCycle)?;
        let final_amount = amount_in;
        let profit_percent = (final_amount - initial_amount) / initial_amount * 100.0;
        if !profit_percent.is_finite() {
            return Err(ValuationError::NonFinite(route_to_string(route)));
        }

        Ok(ArbitrageResult { cycle: route.to_vec(), initial_amount, final_amount, profit_percent, legs })
    }

    /// Values every cycle, skipping the ones that cannot be valued.
    pub fn value_all(&self, cycles: &[Cycle]) -> ValuationBatch {
        let mut batch = ValuationBatch { results: Vec::with_capacity(cycles.len()), skipped: 0 };
        for cycle in cycles {
            match self.value(cycle.vertices()) {
                Ok(result) => batch.results.push(result),
                Err(e) => {
                    debug!(cycle = %cycle, "Skipping cycle: {}", e);
                    batch.skipped += 1;
                }
            }
        }
        batch
    }
}
