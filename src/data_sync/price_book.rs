use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Quoted prices for one pair in decimal adjusted units.
///
/// `buy_*` describes acquiring the base asset with the quote asset, `sell_*` describes
/// disposing of the base asset for the quote asset. Prices are quote units per base unit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub buy_price: f64,
    pub buy_amount: f64,
    pub sell_price: f64,
    pub sell_amount: f64,
}

impl Quote {
    pub fn new(buy_price: f64, buy_amount: f64, sell_price: f64, sell_amount: f64) -> Self {
        Self { buy_price, buy_amount, sell_price, sell_amount }
    }

    /// The buy side has a finite positive price and a finite non-negative amount.
    pub fn can_buy(&self) -> bool {
        side_is_valid(self.buy_price, self.buy_amount)
    }

    pub fn can_sell(&self) -> bool {
        side_is_valid(self.sell_price, self.sell_amount)
    }

    /// Both sides can be traded.
    pub fn is_tradeable(&self) -> bool {
        self.can_buy() && self.can_sell()
    }
}

fn side_is_valid(price: f64, amount: f64) -> bool {
    price.is_finite() && amount.is_finite() && price > 0.0 && amount >= 0.0
}

/// Pair name -> quote. A pair missing from the book is currently unavailable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PriceBook {
    quotes: BTreeMap<String, Quote>,
}

impl PriceBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, pair: &str) -> Option<&Quote> {
        self.quotes.get(pair)
    }

    pub fn insert(&mut self, pair: impl Into<String>, quote: Quote) {
        self.quotes.insert(pair.into(), quote);
    }

    pub fn remove(&mut self, pair: &str) -> Option<Quote> {
        self.quotes.remove(pair)
    }

    /// Overwrite the whole book with fresh contents.
    pub fn replace(&mut self, other: PriceBook) {
        self.quotes = other.quotes;
    }

    pub fn clear(&mut self) {
        self.quotes.clear();
    }

    pub fn len(&self) -> usize {
        self.quotes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.quotes.is_empty()
    }

    pub fn contains(&self, pair: &str) -> bool {
        self.quotes.contains_key(pair)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Quote)> {
        self.quotes.iter()
    }

    pub fn pair_names(&self) -> impl Iterator<Item = &String> {
        self.quotes.keys()
    }
}

impl FromIterator<(String, Quote)> for PriceBook {
    fn from_iter<T: IntoIterator<Item = (String, Quote)>>(iter: T) -> Self {
        Self { quotes: iter.into_iter().collect() }
    }
}
