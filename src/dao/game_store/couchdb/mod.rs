//! CouchDB-backed [`GameStore`](crate::dao::game_store::GameStore)
//! implementation. Each room is one document; CouchDB's `_rev` MVCC token
//! backs the version compare-and-swap.

mod config;
mod error;
mod models;
mod store;

pub use config::CouchConfig;
pub use error::{CouchDaoError, CouchResult};
pub use store::CouchGameStore;
