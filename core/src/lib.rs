pub mod config;
pub mod model;
pub mod preview;
pub mod query;
pub mod service;
pub mod storage;
pub mod upload;
pub use deadpool_diesel;
