//! # Persistence Backends
//!
//! The RocksDB adapter behind the `rocksdb-store` feature, plus the helper
//! that picks a backend from the configuration. Without the feature (or
//! without a `db_path`) the node runs on the in-memory store.

use crate::config::NodeConfig;
use std::sync::Arc;
use tc_block_storage::{InMemoryKVStore, KeyValueStore, StoreError};
use tracing::info;

#[cfg(feature = "rocksdb-store")]
pub use self::rocks::RocksDbStore;

/// Open the configured backend.
pub fn open_store(config: &NodeConfig) -> Result<Arc<dyn KeyValueStore>, StoreError> {
    if config.db_path.is_empty() {
        info!("no db_path configured, using the in-memory store");
        return Ok(Arc::new(InMemoryKVStore::new()));
    }

    #[cfg(feature = "rocksdb-store")]
    {
        info!(path = %config.db_path, "opening RocksDB store");
        Ok(Arc::new(rocks::RocksDbStore::open(&config.db_path)?))
    }
    #[cfg(not(feature = "rocksdb-store"))]
    {
        tracing::warn!(
            path = %config.db_path,
            "built without the rocksdb-store feature, db_path ignored"
        );
        Ok(Arc::new(InMemoryKVStore::new()))
    }
}

#[cfg(feature = "rocksdb-store")]
mod rocks {
    use rocksdb::{Options, DB};
    use std::path::Path;
    use tc_block_storage::{KeyValueStore, StoreError};

    /// RocksDB-backed [`KeyValueStore`]. A single default column family is
    /// enough: the chain store multiplexes through prefix bytes.
    pub struct RocksDbStore {
        db: DB,
    }

    impl RocksDbStore {
        pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
            let mut options = Options::default();
            options.create_if_missing(true);
            let db = DB::open(&options, path).map_err(|e| StoreError::Backend(e.to_string()))?;
            Ok(Self { db })
        }
    }

    impl KeyValueStore for RocksDbStore {
        fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
            self.db
                .get(key)
                .map_err(|e| StoreError::Backend(e.to_string()))
        }

        fn put(&self, key: &[u8], value: &[u8]) -> Result<(), StoreError> {
            self.db
                .put(key, value)
                .map_err(|e| StoreError::Backend(e.to_string()))
        }

        fn delete(&self, key: &[u8]) -> Result<(), StoreError> {
            self.db
                .delete(key)
                .map_err(|e| StoreError::Backend(e.to_string()))
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn round_trip_on_disk() {
            let dir = tempfile::tempdir().unwrap();
            let store = RocksDbStore::open(dir.path()).unwrap();
            store.put(b"k", b"v").unwrap();
            assert_eq!(store.get(b"k").unwrap().as_deref(), Some(&b"v"[..]));
            store.delete(b"k").unwrap();
            assert_eq!(store.get(b"k").unwrap(), None);
        }
    }
}
