use crate::data_sync::exchanges::{ExchangeError, ExchangeWrapper, ReservePool, ReservePoolExchange, SnapshotExchange, StaticExchange};
use crate::data_sync::price_book::Quote;
use crate::data_sync::rates::{PriceTableConverter, RateError};
use crate::utils::{Asset, Pair};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::PathBuf;

fn default_fee_bps() -> u32 {
    30
}

/// Pair metadata. Without explicit assets the symbols come from the name.
#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PairConfig {
    pub name: String,
    pub base: Option<Asset>,
    pub quote: Option<Asset>,
}

impl PairConfig {
    pub fn to_pair(&self) -> Result<Pair, ExchangeError> {
        let parsed = Pair::parse(&self.name)?;
        let base = self.base.clone().unwrap_or_else(|| parsed.base.as_ref().clone());
        let quote = self.quote.clone().unwrap_or_else(|| parsed.quote.as_ref().clone());
        Ok(Pair::new(&self.name, base, quote)?)
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReservePoolConfig {
    pub pair: String,
    pub base: Option<Asset>,
    pub quote: Option<Asset>,
    pub base_reserve: f64,
    pub quote_reserve: f64,
}

impl ReservePoolConfig {
    pub fn to_pool(&self) -> Result<ReservePool, ExchangeError> {
        let pair = PairConfig { name: self.pair.clone(), base: self.base.clone(), quote: self.quote.clone() }.to_pair()?;
        Ok(ReservePool { pair, base_reserve: self.base_reserve, quote_reserve: self.quote_reserve })
    }
}

/// One `[[exchanges]]` entry, discriminated by `kind`.
#[derive(Clone, Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ExchangeConfig {
    Snapshot {
        name: String,
        path: PathBuf,
        #[serde(default)]
        pairs: Vec<PairConfig>,
    },
    Reserves {
        name: String,
        #[serde(default = "default_fee_bps")]
        fee_bps: u32,
        pools: Vec<ReservePoolConfig>,
    },
    Static {
        name: String,
        quotes: BTreeMap<String, Quote>,
    },
}

impl ExchangeConfig {
    pub fn name(&self) -> &str {
        match self {
            ExchangeConfig::Snapshot { name, .. } | ExchangeConfig::Reserves { name, .. } | ExchangeConfig::Static { name, .. } => name,
        }
    }

    pub fn build(&self) -> Result<ExchangeWrapper, ExchangeError> {
        match self {
            ExchangeConfig::Snapshot { name, path, pairs } => {
                let pairs = pairs.iter().map(PairConfig::to_pair).collect::<Result<Vec<_>, _>>()?;
                Ok(Box::new(SnapshotExchange::new(name, path.clone()).with_pairs(pairs)))
            }
            ExchangeConfig::Reserves { name, fee_bps, pools } => {
                let mut exchange = ReservePoolExchange::new(name, *fee_bps)?;
                for pool in pools {
                    exchange.add_pool(pool.to_pool()?);
                }
                Ok(Box::new(exchange))
            }
            ExchangeConfig::Static { name, quotes } => {
                let mut exchange = StaticExchange::new(name);
                for (pair, quote) in quotes {
                    exchange.set_quote(Pair::parse(pair)?, *quote);
                }
                Ok(Box::new(exchange))
            }
        }
    }
}

/// The `[rates]` section.
#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RatesConfig {
    pub quote_asset: String,
    pub quote_amount: f64,
    /// Basket to size. Empty means every coin priced directly against `quote_asset`.
    #[serde(default)]
    pub coins: Vec<String>,
    #[serde(default)]
    pub aliases: BTreeMap<String, String>,
    #[serde(default)]
    pub prices: BTreeMap<String, f64>,
}

impl RatesConfig {
    pub fn build(&self) -> Result<PriceTableConverter, RateError> {
        let mut converter = PriceTableConverter::new(&self.quote_asset, self.quote_amount, self.prices.clone())?;
        if !self.coins.is_empty() {
            let coins: Vec<&str> = self.coins.iter().map(String::as_str).collect();
            converter = converter.with_coins(&coins);
        }
        for (coin, alias) in &self.aliases {
            converter = converter.with_alias(coin, alias);
        }
        Ok(converter)
    }
}
