use alloy_primitives::Address;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt::Display;
use std::sync::Arc;
use thiserror::Error;

/// Separator between the base and quote symbol of a pair name.
pub const PAIR_DELIMITER: char = '-';
/// Separator between the parts of a vertex key. Pair names must not contain it.
pub const VERTEX_DELIMITER: char = '_';

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VertexParseError {
    #[error("pair name `{0}` must be BASE-QUOTE with exactly one `-`")]
    MalformedPair(String),
    #[error("pair name `{0}` must not contain `_`")]
    PairContainsDelimiter(String),
    #[error("vertex key `{0}` must be EXCHANGE_PAIR_ACTION")]
    MalformedVertex(String),
    #[error("unknown action `{0}`, expected `buy` or `sell`")]
    UnknownAction(String),
}

/// A tradeable asset. The symbol is always stored upper case.
#[derive(Clone, Debug, Serialize)]
pub struct Asset {
    symbol: String,
    address: Option<Address>,
    decimals: Option<u8>,
}

pub type AssetWrapper = Arc<Asset>;

impl Asset {
    pub fn new(symbol: &str) -> Asset {
        Asset { symbol: symbol.trim().to_ascii_uppercase(), address: None, decimals: None }
    }

    pub fn new_with_data(symbol: &str, address: Option<Address>, decimals: Option<u8>) -> Asset {
        Asset { symbol: symbol.trim().to_ascii_uppercase(), address, decimals }
    }

    // For testing purposes
    pub fn repeat_byte(symbol: &str, byte: u8) -> Asset {
        Asset::new_with_data(symbol, Some(Address::repeat_byte(byte)), Some(18))
    }

    pub fn get_symbol(&self) -> &str {
        &self.symbol
    }

    pub fn get_address(&self) -> Option<Address> {
        self.address
    }

    pub fn get_decimals(&self) -> Option<u8> {
        self.decimals
    }

    /// Two assets are the same when their contract addresses match. Without an address on
    /// both sides the case-normalised symbols must be exactly equal.
    pub fn same_asset(&self, other: &Asset) -> bool {
        match (self.address, other.address) {
            (Some(a), Some(b)) => a == b,
            _ => self.symbol == other.symbol,
        }
    }
}

impl Display for Asset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.address {
            Some(address) => write!(f, "{}({:#})", self.symbol, address),
            None => write!(f, "{}", self.symbol),
        }
    }
}

#[derive(Deserialize)]
struct RawAsset {
    symbol: String,
    #[serde(default)]
    address: Option<Address>,
    #[serde(default)]
    decimals: Option<u8>,
}

impl<'de> Deserialize<'de> for Asset {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = RawAsset::deserialize(deserializer)?;
        Ok(Asset::new_with_data(&raw.symbol, raw.address, raw.decimals))
    }
}

/// A two asset market named `BASE-QUOTE`.
#[derive(Clone, Debug, Serialize)]
pub struct Pair {
    pub name: String,
    pub base: AssetWrapper,
    pub quote: AssetWrapper,
}

impl Pair {
    pub fn new(name: &str, base: Asset, quote: Asset) -> Result<Pair, VertexParseError> {
        validate_pair_name(name)?;
        Ok(Pair { name: name.to_string(), base: Arc::new(base), quote: Arc::new(quote) })
    }

    /// Build a pair from its name alone. The assets carry no address, so matching falls
    /// back to symbols.
    pub fn parse(name: &str) -> Result<Pair, VertexParseError> {
        let (base, quote) = split_pair_name(name)?;
        Ok(Pair { name: name.to_string(), base: Arc::new(Asset::new(base)), quote: Arc::new(Asset::new(quote)) })
    }

    pub fn involves(&self, asset: &Asset) -> bool {
        self.base.same_asset(asset) || self.quote.same_asset(asset)
    }
}

impl Display for Pair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}

pub fn split_pair_name(name: &str) -> Result<(&str, &str), VertexParseError> {
    validate_pair_name(name)?;
    // validated above: exactly one delimiter
    let (base, quote) = name.split_once(PAIR_DELIMITER).ok_or_else(|| VertexParseError::MalformedPair(name.to_string()))?;
    Ok((base, quote))
}

fn validate_pair_name(name: &str) -> Result<(), VertexParseError> {
    if name.contains(VERTEX_DELIMITER) {
        return Err(VertexParseError::PairContainsDelimiter(name.to_string()));
    }
    let mut parts = name.split(PAIR_DELIMITER);
    match (parts.next(), parts.next(), parts.next()) {
        (Some(base), Some(quote), None) if !base.trim().is_empty() && !quote.trim().is_empty() => Ok(()),
        _ => Err(VertexParseError::MalformedPair(name.to_string())),
    }
}
