use crate::data_sync::price_book::PriceBook;
use crate::data_sync::rates::RateSnapshot;
use crate::utils::{Pair, VertexParseError};
use async_trait::async_trait;
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExchangeError {
    #[error("refresh failed: {0}")]
    Refresh(String),
    #[error("refresh of {exchange} timed out after {after_ms}ms")]
    Timeout { exchange: String, after_ms: u64 },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid pair: {0}")]
    InvalidPair(#[from] VertexParseError),
    #[error("unknown pair {0}")]
    UnknownPair(String),
    #[error("invalid reserves for {pair}: base={base_reserve}, quote={quote_reserve}")]
    InvalidReserves { pair: String, base_reserve: f64, quote_reserve: f64 },
    #[error("invalid fee {0}bps, must be below 10000")]
    InvalidFee(u32),
}

/// A venue quoting a configured set of pairs.
///
/// `refresh_price_book` overwrites the book in place. The rate snapshot tells the exchange how
/// much of each quote asset to quote so that depths are comparable across pairs.
#[async_trait]
pub trait Exchange: Send + Sync {
    fn name(&self) -> &str;

    /// Pair name -> base/quote assets.
    fn pairs(&self) -> &BTreeMap<String, Pair>;

    fn price_book(&self) -> &PriceBook;

    async fn refresh_price_book(&mut self, rates: &RateSnapshot) -> Result<(), ExchangeError>;

    fn pair(&self, name: &str) -> Option<&Pair> {
        self.pairs().get(name)
    }
}

pub type ExchangeWrapper = Box<dyn Exchange>;
