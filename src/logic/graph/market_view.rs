use crate::data_sync::{Exchange, Quote};
use crate::logic::types::{ScanError, VertexState};
use std::collections::BTreeMap;

/// Borrowed, name indexed view over the exchanges taking part in one scan pass.
pub struct MarketView<'a> {
    exchanges: BTreeMap<&'a str, &'a dyn Exchange>,
}

impl<'a> MarketView<'a> {
    pub fn new<I>(exchanges: I) -> Result<Self, ScanError>
    where
        I: IntoIterator<Item = &'a dyn Exchange>,
    {
        let mut by_name = BTreeMap::new();
        for exchange in exchanges {
            if by_name.insert(exchange.name(), exchange).is_some() {
                return Err(ScanError::DuplicateExchange(exchange.name().to_string()));
            }
        }
        Ok(Self { exchanges: by_name })
    }

    pub fn get(&self, name: &str) -> Option<&'a dyn Exchange> {
        self.exchanges.get(name).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'a str, &'a dyn Exchange)> + '_ {
        self.exchanges.iter().map(|(name, exchange)| (*name, *exchange))
    }

    pub fn names(&self) -> impl Iterator<Item = &'a str> + '_ {
        self.exchanges.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.exchanges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.exchanges.is_empty()
    }

    pub fn quote(&self, vertex: &VertexState) -> Option<&'a Quote> {
        self.get(vertex.exchange())?.price_book().get(vertex.pair())
    }
}
