pub mod exchange;
pub mod reserve_pool_exchange;
pub mod snapshot_exchange;
pub mod static_exchange;

pub use exchange::{Exchange, ExchangeError, ExchangeWrapper};
pub use reserve_pool_exchange::{ReservePool, ReservePoolExchange};
pub use snapshot_exchange::SnapshotExchange;
pub use static_exchange::StaticExchange;
