//! # tc-mempool
//!
//! Transaction pool keyed by intended block height.
//!
//! Each height slot holds at most one transaction, last writer wins; the
//! miner reads the slot for the height it is about to mine and the RPC and
//! gossip ingress paths write. Entries are not consumed on use, since a
//! reorg may mine the same height again. There is no eviction; a long-running node
//! should eventually prune slots at or below the finalized tip, which is
//! outside this core.

use parking_lot::RwLock;
use shared_types::Transaction;
use std::collections::HashMap;
use tracing::debug;

/// Height-keyed pool. Internally synchronized: the miner reads while ingress
/// paths write, contention is low.
#[derive(Default)]
pub struct TransactionPool {
    slots: RwLock<HashMap<u64, Transaction>>,
}

impl TransactionPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a transaction at its intended height, replacing any previous
    /// occupant of that slot.
    pub fn insert(&self, txn: Transaction) {
        let height = txn.height;
        let replaced = self.slots.write().insert(height, txn).is_some();
        debug!(height, replaced, "transaction pooled");
    }

    /// The transaction pooled for `height`, if any. Does not remove it.
    pub fn get(&self, height: u64) -> Option<Transaction> {
        self.slots.read().get(&height).copied()
    }

    pub fn len(&self) -> usize {
        self.slots.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn txn(height: u64, amount: f64) -> Transaction {
        Transaction::new([1u8; 32], [2u8; 32], amount, height)
    }

    #[test]
    fn last_writer_wins_per_height() {
        let pool = TransactionPool::new();
        pool.insert(txn(3, 10.0));
        pool.insert(txn(3, 20.0));

        assert_eq!(pool.len(), 1);
        assert_eq!(pool.get(3).unwrap().amount, 20.0);
    }

    #[test]
    fn slots_are_independent() {
        let pool = TransactionPool::new();
        pool.insert(txn(1, 1.0));
        pool.insert(txn(2, 2.0));

        assert_eq!(pool.get(1).unwrap().amount, 1.0);
        assert_eq!(pool.get(2).unwrap().amount, 2.0);
        assert_eq!(pool.get(3), None);
    }

    #[test]
    fn get_does_not_consume() {
        let pool = TransactionPool::new();
        pool.insert(txn(5, 5.0));

        assert!(pool.get(5).is_some());
        assert!(pool.get(5).is_some());
        assert_eq!(pool.len(), 1);
    }
}
