pub mod asset;
pub mod cancel;
pub mod config_loader;

pub use asset::{Asset, AssetWrapper, PAIR_DELIMITER, Pair, VERTEX_DELIMITER, VertexParseError, split_pair_name};
pub use cancel::CancelToken;
pub use config_loader::*;
