/// Data layer
///
/// Everything the scanner consumes before any graph work happens:
///
/// - Exchange collaborators that own and refresh a price book per venue
/// - Rate conversion that sizes quote depth per asset
/// - Bounded refresh fan-out with per-exchange timeouts
///
/// Price books are overwritten on every refresh, nothing here is cached across passes.
pub mod config;
pub mod exchanges;
pub mod price_book;
pub mod rates;
pub mod refresh;

pub use config::{ExchangeConfig, PairConfig, RatesConfig, ReservePoolConfig};
pub use exchanges::{
    Exchange, ExchangeError, ExchangeWrapper, ReservePool, ReservePoolExchange, SnapshotExchange, StaticExchange,
};
pub use price_book::{PriceBook, Quote};
pub use rates::{PriceTableConverter, RateConverter, RateError, RateSnapshot, StaticRateConverter};
pub use refresh::{RefreshOutcome, refresh_all};
