//! # tc-block-storage
//!
//! The chain's persistence layer: an abstract [`KeyValueStore`] seam, an
//! in-memory implementation, and the [`ChainStore`] adapter that maps
//! blocks, balances and the tip pointer onto prefixed keys.

pub mod chain_store;
pub mod errors;
pub mod kv;

pub use chain_store::ChainStore;
pub use errors::StoreError;
pub use kv::{InMemoryKVStore, KeyValueStore};
