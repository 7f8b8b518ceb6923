use super::exchange::{Exchange, ExchangeError};
use crate::data_sync::price_book::{PriceBook, Quote};
use crate::data_sync::rates::RateSnapshot;
use crate::utils::Pair;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::time::Duration;

/// In memory exchange. Quotes are staged and published to the price book on refresh.
#[derive(Debug, Clone, Default)]
pub struct StaticExchange {
    name: String,
    pairs: BTreeMap<String, Pair>,
    staged: PriceBook,
    price_book: PriceBook,
    failure: Option<String>,
    delay: Option<Duration>,
    refresh_count: usize,
}

impl StaticExchange {
    pub fn new(name: &str) -> Self {
        Self { name: name.to_string(), ..Self::default() }
    }

    pub fn with_quote(mut self, pair: Pair, quote: Quote) -> Self {
        self.set_quote(pair, quote);
        self
    }

    /// Every refresh fails with the given message.
    pub fn with_failure(mut self, message: &str) -> Self {
        self.failure = Some(message.to_string());
        self
    }

    /// Every refresh sleeps before publishing.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn set_quote(&mut self, pair: Pair, quote: Quote) {
        self.staged.insert(pair.name.clone(), quote);
        self.pairs.insert(pair.name.clone(), pair);
    }

    pub fn remove_quote(&mut self, pair: &str) {
        self.staged.remove(pair);
    }

    pub fn set_failure(&mut self, failure: Option<String>) {
        self.failure = failure;
    }

    pub fn refresh_count(&self) -> usize {
        self.refresh_count
    }
}

#[async_trait]
impl Exchange for StaticExchange {
    fn name(&self) -> &str {
        &self.name
    }

    fn pairs(&self) -> &BTreeMap<String, Pair> {
        &self.pairs
    }

    fn price_book(&self) -> &PriceBook {
        &self.price_book
    }

    async fn refresh_price_book(&mut self, _rates: &RateSnapshot) -> Result<(), ExchangeError> {
        self.refresh_count += 1;
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(message) = &self.failure {
            return Err(ExchangeError::Refresh(message.clone()));
        }
        self.price_book.replace(self.staged.clone());
        Ok(())
    }
}
