use super::exchange::{Exchange, ExchangeError};
use crate::data_sync::price_book::PriceBook;
use crate::data_sync::rates::RateSnapshot;
use crate::utils::Pair;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing::{debug, warn};

/// Exchange whose price book is a JSON file written by an external quoting process.
///
/// The file is re-read on every refresh. Pairs without configured metadata are derived from
/// their `BASE-QUOTE` name; quotes under malformed names are dropped.
#[derive(Debug, Clone)]
pub struct SnapshotExchange {
    name: String,
    path: PathBuf,
    configured_pairs: BTreeMap<String, Pair>,
    pairs: BTreeMap<String, Pair>,
    price_book: PriceBook,
}

impl SnapshotExchange {
    pub fn new(name: &str, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.to_string(),
            path: path.into(),
            configured_pairs: BTreeMap::new(),
            pairs: BTreeMap::new(),
            price_book: PriceBook::new(),
        }
    }

    pub fn with_pairs(mut self, pairs: Vec<Pair>) -> Self {
        self.configured_pairs = pairs.into_iter().map(|p| (p.name.clone(), p)).collect();
        self
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }
}

#[async_trait]
impl Exchange for SnapshotExchange {
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
        let contents = tokio::fs::read_to_string(&self.path).await?;
        let mut book: PriceBook = serde_json::from_str(&contents)?;

        let mut pairs = BTreeMap::new();
        let names: Vec<String> = book.pair_names().cloned().collect();
        for name in names {
            if let Some(pair) = self.configured_pairs.get(&name) {
                pairs.insert(name, pair.clone());
                continue;
            }
            match Pair::parse(&name) {
                Ok(pair) => {
                    pairs.insert(name, pair);
                }
                Err(e) => {
                    warn!(exchange = %self.name, "Dropping quote: {}", e);
                    book.remove(&name);
                }
            }
        }

        debug!(exchange = %self.name, path = %self.path.display(), pairs = book.len(), "Loaded price book snapshot");
        self.pairs = pairs;
        self.price_book = book;
        Ok(())
    }
}
