//! # Chain/Ledger Store Adapter
//!
//! Namespaced operations over the key-value seam. Three column groups share
//! one keyspace through prefix bytes:
//!
//! | prefix | key              | value                                |
//! |--------|------------------|--------------------------------------|
//! | `0x01` | address (32B)    | balance, LE bits of the `f64` (8B)   |
//! | `0x02` | block hash (32B) | fixed-layout block encoding (924B)   |
//! | `0x03` | (none)           | tip hash (32B)                       |
//!
//! Blocks are content-addressed, so re-inserting one is idempotent; orphans
//! from losing forks stay addressable forever. The tip pointer and balances
//! are the only mutable cells, and only the tip manager writes them.

use crate::errors::StoreError;
use crate::kv::KeyValueStore;
use shared_types::{Address, Block, Hash};
use std::sync::Arc;

const BALANCE_PREFIX: u8 = 0x01;
const BLOCK_PREFIX: u8 = 0x02;
const TIP_KEY: [u8; 1] = [0x03];

fn prefixed(prefix: u8, data: &[u8]) -> Vec<u8> {
    let mut key = Vec::with_capacity(1 + data.len());
    key.push(prefix);
    key.extend_from_slice(data);
    key
}

/// Shared handle to the chain's persistent state.
#[derive(Clone)]
pub struct ChainStore {
    kv: Arc<dyn KeyValueStore>,
}

impl ChainStore {
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        Self { kv }
    }

    /// Fetch a block by its identity hash.
    pub fn get_block(&self, hash: &Hash) -> Result<Option<Block>, StoreError> {
        match self.kv.get(&prefixed(BLOCK_PREFIX, hash))? {
            Some(bytes) => Ok(Some(Block::decode(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Persist a block under its hash. Content-addressed, so idempotent.
    pub fn put_block(&self, hash: &Hash, block: &Block) -> Result<(), StoreError> {
        self.kv.put(&prefixed(BLOCK_PREFIX, hash), &block.encode())
    }

    /// The canonical tip hash. `TipUnset` only before genesis bootstrap.
    pub fn get_tip_hash(&self) -> Result<Hash, StoreError> {
        let bytes = self.kv.get(&TIP_KEY)?.ok_or(StoreError::TipUnset)?;
        let hash: Hash = bytes
            .as_slice()
            .try_into()
            .map_err(|_| StoreError::Backend("tip cell is not 32 bytes".into()))?;
        Ok(hash)
    }

    pub fn set_tip_hash(&self, hash: &Hash) -> Result<(), StoreError> {
        self.kv.put(&TIP_KEY, hash)
    }

    /// The canonical tip block.
    pub fn get_tip_block(&self) -> Result<Block, StoreError> {
        let tip_hash = self.get_tip_hash()?;
        self.get_block(&tip_hash)?
            .ok_or_else(|| StoreError::Backend("tip hash points at a missing block".into()))
    }

    /// Account balance; accounts that never received anything read as 0.
    pub fn get_balance(&self, address: &Address) -> Result<f64, StoreError> {
        match self.kv.get(&prefixed(BALANCE_PREFIX, address))? {
            Some(bytes) => {
                let bits: [u8; 8] = bytes
                    .as_slice()
                    .try_into()
                    .map_err(|_| StoreError::Backend("balance cell is not 8 bytes".into()))?;
                Ok(f64::from_bits(u64::from_le_bytes(bits)))
            }
            None => Ok(0.0),
        }
    }

    pub fn set_balance(&self, address: &Address, balance: f64) -> Result<(), StoreError> {
        self.kv
            .put(&prefixed(BALANCE_PREFIX, address), &balance.to_bits().to_le_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kv::InMemoryKVStore;
    use shared_types::{genesis_block, genesis_hash, Transaction, VdfProof, PROOF_LEN};

    fn store() -> ChainStore {
        ChainStore::new(Arc::new(InMemoryKVStore::new()))
    }

    #[test]
    fn block_round_trip_is_content_addressed() {
        let store = store();
        let block = genesis_block();
        let hash = genesis_hash();

        assert_eq!(store.get_block(&hash).unwrap(), None);
        store.put_block(&hash, &block).unwrap();
        // Idempotent re-insert.
        store.put_block(&hash, &block).unwrap();

        let loaded = store.get_block(&hash).unwrap().unwrap();
        assert_eq!(loaded.hash(), hash);
    }

    #[test]
    fn tip_pointer() {
        let store = store();
        assert!(matches!(store.get_tip_hash(), Err(StoreError::TipUnset)));

        let hash = genesis_hash();
        store.put_block(&hash, &genesis_block()).unwrap();
        store.set_tip_hash(&hash).unwrap();
        assert_eq!(store.get_tip_hash().unwrap(), hash);
        assert_eq!(store.get_tip_block().unwrap().height, 0);
    }

    #[test]
    fn balances_default_to_zero_and_keep_bit_precision() {
        let store = store();
        let addr = [5u8; 32];
        assert_eq!(store.get_balance(&addr).unwrap(), 0.0);

        store.set_balance(&addr, 1234.5678).unwrap();
        assert_eq!(store.get_balance(&addr).unwrap().to_bits(), 1234.5678f64.to_bits());
    }

    #[test]
    fn prefixes_do_not_collide() {
        // A balance written for an address equal to a block hash must not
        // shadow the block, and vice versa.
        let store = store();
        let hash = genesis_hash();
        store.put_block(&hash, &genesis_block()).unwrap();
        store.set_balance(&hash, 7.0).unwrap();

        assert_eq!(store.get_balance(&hash).unwrap(), 7.0);
        assert_eq!(store.get_block(&hash).unwrap().unwrap().height, 0);
    }

    #[test]
    fn arbitrary_blocks_survive_the_store() {
        let store = store();
        let mut txn = Transaction::new([1u8; 32], [2u8; 32], 3.5, 9);
        txn.signature = [4u8; 64];
        let block = Block {
            prev_hash: [6u8; 32],
            height: 9,
            epoch_begin_hash: genesis_hash(),
            txn,
            signature: [7u8; 64],
            public_key: [8u8; 64],
            proof: VdfProof([9u8; PROOF_LEN]),
        };
        let hash = block.hash();
        store.put_block(&hash, &block).unwrap();
        assert_eq!(store.get_block(&hash).unwrap().unwrap(), block);
    }
}
