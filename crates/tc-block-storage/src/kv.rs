//! # Key-Value Store Seam
//!
//! Abstract interface for the persistence backend.
//!
//! Production: the RocksDB adapter in `node-runtime` (feature `rocksdb-store`).
//! Testing and default builds: [`InMemoryKVStore`] below.
//!
//! Implementations are internally synchronized; the trait takes `&self` so a
//! single handle can be shared across the miner (reads) and the tip manager
//! (sole writer).

use crate::errors::StoreError;
use parking_lot::RwLock;
use std::collections::HashMap;

/// Abstract byte-oriented store.
pub trait KeyValueStore: Send + Sync {
    /// Get a value by key.
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError>;

    /// Put a single key-value pair, replacing any existing value.
    fn put(&self, key: &[u8], value: &[u8]) -> Result<(), StoreError>;

    /// Delete a key. Deleting a missing key is not an error.
    fn delete(&self, key: &[u8]) -> Result<(), StoreError>;
}

/// HashMap-backed store for unit tests and toolchain-light builds.
#[derive(Default)]
pub struct InMemoryKVStore {
    data: RwLock<HashMap<Vec<u8>, Vec<u8>>>,
}

impl InMemoryKVStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for InMemoryKVStore {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.data.read().get(key).cloned())
    }

    fn put(&self, key: &[u8], value: &[u8]) -> Result<(), StoreError> {
        self.data.write().insert(key.to_vec(), value.to_vec());
        Ok(())
    }

    fn delete(&self, key: &[u8]) -> Result<(), StoreError> {
        self.data.write().remove(key);
        Ok(())
    }
}
