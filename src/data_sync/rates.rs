use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum RateError {
    #[error("no reference price for {0}")]
    MissingPrice(String),
    #[error("quote amount must be positive and finite, got {0}")]
    InvalidQuoteAmount(f64),
    #[error("price key `{0}` must be BASE-QUOTE")]
    MalformedPriceKey(String),
    #[error("price for `{0}` must be positive and finite")]
    InvalidPrice(String),
}

/// How much of each asset an exchange should quote so that quotes across assets are
/// comparably deep. Keys are upper case symbols.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RateSnapshot {
    amounts: HashMap<String, f64>,
}

impl RateSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_amount(mut self, symbol: &str, amount: f64) -> Self {
        self.set_amount(symbol, amount);
        self
    }

    pub fn set_amount(&mut self, symbol: &str, amount: f64) {
        self.amounts.insert(symbol.to_ascii_uppercase(), amount);
    }

    pub fn amount_for(&self, symbol: &str) -> Option<f64> {
        self.amounts.get(&symbol.to_ascii_uppercase()).copied()
    }

    pub fn len(&self) -> usize {
        self.amounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.amounts.is_empty()
    }
}

/// Converts one reference asset quantity into equivalent quantities of a basket of assets.
#[async_trait]
pub trait RateConverter: Send + Sync {
    async fn convert(&self) -> Result<RateSnapshot, RateError>;
}

/// Always hands out the same snapshot.
#[derive(Debug, Clone, Default)]
pub struct StaticRateConverter {
    snapshot: RateSnapshot,
}

impl StaticRateConverter {
    pub fn new(snapshot: RateSnapshot) -> Self {
        Self { snapshot }
    }
}

#[async_trait]
impl RateConverter for StaticRateConverter {
    async fn convert(&self) -> Result<RateSnapshot, RateError> {
        Ok(self.snapshot.clone())
    }
}

/// Converts a reference amount through a table of `BASE-QUOTE` prices.
///
/// Reverse pairs are derived as `1 / price`. For every coin in the basket the depth is
/// `price[reference-coin] * quote_amount`; the reference asset itself maps to `quote_amount`.
/// Aliases rename coins in the output, e.g. `ETH` to the wrapped `WETH`.
#[derive(Debug, Clone)]
pub struct PriceTableConverter {
    quote_asset: String,
    quote_amount: f64,
    coins: Vec<String>,
    aliases: BTreeMap<String, String>,
    prices: HashMap<String, f64>,
}

impl PriceTableConverter {
    pub fn new(quote_asset: &str, quote_amount: f64, prices: BTreeMap<String, f64>) -> Result<Self, RateError> {
        if !quote_amount.is_finite() || quote_amount <= 0.0 {
            return Err(RateError::InvalidQuoteAmount(quote_amount));
        }
        let quote_asset = quote_asset.to_ascii_uppercase();
        let prices = with_reverse_prices(prices)?;

        // Every coin reachable from the reference asset in one hop belongs to the basket.
        let mut coins: Vec<String> = prices
            .keys()
            .filter_map(|key| key.split_once('-'))
            .filter(|(base, _)| *base == quote_asset)
            .map(|(_, quote)| quote.to_string())
            .collect();
        coins.push(quote_asset.clone());
        coins.sort();
        coins.dedup();

        Ok(Self { quote_asset, quote_amount, coins, aliases: BTreeMap::new(), prices })
    }

    pub fn with_coins(mut self, coins: &[&str]) -> Self {
        self.coins = coins.iter().map(|c| c.to_ascii_uppercase()).collect();
        self
    }

    pub fn with_alias(mut self, coin: &str, alias: &str) -> Self {
        self.aliases.insert(coin.to_ascii_uppercase(), alias.to_ascii_uppercase());
        self
    }

    pub fn quote_asset(&self) -> &str {
        &self.quote_asset
    }

    pub fn quote_amount(&self) -> f64 {
        self.quote_amount
    }

    pub fn snapshot(&self) -> Result<RateSnapshot, RateError> {
        let mut snapshot = RateSnapshot::new();
        for coin in &self.coins {
            let amount = if *coin == self.quote_asset {
                self.quote_amount
            } else {
                let key = format!("{}-{}", self.quote_asset, coin);
                let price = self.prices.get(&key).ok_or(RateError::MissingPrice(key))?;
                price * self.quote_amount
            };
            let symbol = self.aliases.get(coin).unwrap_or(coin);
            snapshot.set_amount(symbol, amount);
        }
        debug!(quote_asset = %self.quote_asset, assets = snapshot.len(), "Converted reference amount");
        Ok(snapshot)
    }
}

#[async_trait]
impl RateConverter for PriceTableConverter {
    async fn convert(&self) -> Result<RateSnapshot, RateError> {
        self.snapshot()
    }
}

fn with_reverse_prices(prices: BTreeMap<String, f64>) -> Result<HashMap<String, f64>, RateError> {
    let mut all = HashMap::with_capacity(prices.len() * 2);
    for (key, price) in prices {
        let key = key.to_ascii_uppercase();
        let Some((base, quote)) = key.split_once('-') else {
            return Err(RateError::MalformedPriceKey(key));
        };
        if !price.is_finite() || price <= 0.0 {
            return Err(RateError::InvalidPrice(key));
        }
        // explicit entries win over derived reverses
        all.entry(format!("{quote}-{base}")).or_insert(1.0 / price);
        all.insert(key, price);
    }
    Ok(all)
}
