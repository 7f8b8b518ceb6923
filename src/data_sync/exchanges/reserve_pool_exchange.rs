use super::exchange::{Exchange, ExchangeError};
use crate::data_sync::price_book::{PriceBook, Quote};
use crate::data_sync::rates::RateSnapshot;
use crate::utils::Pair;
use async_trait::async_trait;
use std::collections::BTreeMap;
use tracing::debug;

const FEE_DENOMINATOR: f64 = 10_000.0;

/// Constant product pool with reserves in decimal adjusted units.
#[derive(Debug, Clone)]
pub struct ReservePool {
    pub pair: Pair,
    pub base_reserve: f64,
    pub quote_reserve: f64,
}

/// Exchange of constant product pools sharing one fee tier.
///
/// Every pair is quoted at the depth the rate snapshot assigns to its quote asset:
/// buying spends exactly that much quote asset, selling receives exactly that much.
#[derive(Debug, Clone)]
pub struct ReservePoolExchange {
    name: String,
    fee_bps: u32,
    pools: BTreeMap<String, ReservePool>,
    pairs: BTreeMap<String, Pair>,
    price_book: PriceBook,
}

impl ReservePoolExchange {
    pub fn new(name: &str, fee_bps: u32) -> Result<Self, ExchangeError> {
        if f64::from(fee_bps) >= FEE_DENOMINATOR {
            return Err(ExchangeError::InvalidFee(fee_bps));
        }
        Ok(Self { name: name.to_string(), fee_bps, pools: BTreeMap::new(), pairs: BTreeMap::new(), price_book: PriceBook::new() })
    }

    pub fn with_pool(mut self, pool: ReservePool) -> Self {
        self.add_pool(pool);
        self
    }

    pub fn add_pool(&mut self, pool: ReservePool) {
        self.pairs.insert(pool.pair.name.clone(), pool.pair.clone());
        self.pools.insert(pool.pair.name.clone(), pool);
    }

    pub fn set_reserves(&mut self, pair: &str, base_reserve: f64, quote_reserve: f64) -> Result<(), ExchangeError> {
        let pool = self.pools.get_mut(pair).ok_or_else(|| ExchangeError::UnknownPair(pair.to_string()))?;
        pool.base_reserve = base_reserve;
        pool.quote_reserve = quote_reserve;
        Ok(())
    }

    fn fee_multiplier(&self) -> f64 {
        (FEE_DENOMINATOR - f64::from(self.fee_bps)) / FEE_DENOMINATOR
    }

    /// Output received for exactly `amount_in`.
    fn amount_out(&self, amount_in: f64, reserve_in: f64, reserve_out: f64) -> f64 {
        let amount_in_with_fee = amount_in * self.fee_multiplier();
        amount_in_with_fee * reserve_out / (reserve_in + amount_in_with_fee)
    }

    /// Input needed to receive exactly `amount_out`. None when the pool cannot pay it out.
    fn amount_in(&self, amount_out: f64, reserve_in: f64, reserve_out: f64) -> Option<f64> {
        if amount_out >= reserve_out {
            return None;
        }
        Some(reserve_in * amount_out / ((reserve_out - amount_out) * self.fee_multiplier()))
    }

    fn quote_pool(&self, pool: &ReservePool, quote_amount: f64) -> Result<Option<Quote>, ExchangeError> {
        if !(pool.base_reserve > 0.0 && pool.quote_reserve > 0.0) {
            return Err(ExchangeError::InvalidReserves {
                pair: pool.pair.name.clone(),
                base_reserve: pool.base_reserve,
                quote_reserve: pool.quote_reserve,
            });
        }

        let buy_amount = self.amount_out(quote_amount, pool.quote_reserve, pool.base_reserve);
        let Some(sell_amount) = self.amount_in(quote_amount, pool.base_reserve, pool.quote_reserve) else {
            debug!(exchange = %self.name, pair = %pool.pair, quote_amount, "Quote depth exceeds pool reserves");
            return Ok(None);
        };
        if buy_amount <= 0.0 || sell_amount <= 0.0 {
            return Ok(None);
        }

        Ok(Some(Quote::new(quote_amount / buy_amount, buy_amount, quote_amount / sell_amount, sell_amount)))
    }
}

#[async_trait]
impl Exchange for ReservePoolExchange {
    fn name(&self) -> &str {
        &self.name
    }

    fn pairs(&self) -> &BTreeMap<String, Pair> {
        &self.pairs
    }

    fn price_book(&self) -> &PriceBook {
        &self.price_book
    }

    async fn refresh_price_book(&mut self, rates: &RateSnapshot) -> Result<(), ExchangeError> {
        let mut book = PriceBook::new();
        for (name, pool) in &self.pools {
            let Some(quote_amount) = rates.amount_for(pool.pair.quote.get_symbol()) else {
                debug!(exchange = %self.name, pair = %name, "No rate for quote asset, pair skipped");
                continue;
            };
            if let Some(quote) = self.quote_pool(pool, quote_amount)? {
                book.insert(name.clone(), quote);
            }
        }
        self.price_book = book;
        Ok(())
    }
}
