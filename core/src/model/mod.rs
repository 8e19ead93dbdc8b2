pub mod repository;

mod asset;
mod asset_type;
mod id_types;
pub use asset::*;
pub use asset_type::*;
pub use id_types::*;

mod util;
