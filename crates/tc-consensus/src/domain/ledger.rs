//! # Ledger Apply/Undo
//!
//! Balance mutation for confirmed transactions, and its inverse for the
//! reorg path.
//!
//! The balance model is best-effort: a transfer whose sender cannot cover
//! the amount is silently skipped while the block stays canonical. `undo`
//! guards on the receiver's balance instead of the sender's, which makes
//! `apply` followed by `undo` an exact identity on the balance map whether
//! or not the transfer actually paid out.

use shared_types::Transaction;
use tc_block_storage::{ChainStore, StoreError};
use tracing::debug;

/// Apply a confirmed transaction to the balance map.
pub fn apply_transaction(store: &ChainStore, txn: &Transaction) -> Result<(), StoreError> {
    if txn.amount == 0.0 || txn.from == txn.to {
        return Ok(());
    }

    let from_balance = store.get_balance(&txn.from)?;
    if from_balance < txn.amount {
        debug!(
            height = txn.height,
            amount = txn.amount,
            available = from_balance,
            "transfer skipped, sender underfunded"
        );
        return Ok(());
    }
    let to_balance = store.get_balance(&txn.to)?;

    store.set_balance(&txn.from, from_balance - txn.amount)?;
    store.set_balance(&txn.to, to_balance + txn.amount)
}

/// Revert a previously applied transaction.
pub fn undo_transaction(store: &ChainStore, txn: &Transaction) -> Result<(), StoreError> {
    if txn.amount == 0.0 || txn.from == txn.to {
        return Ok(());
    }

    let to_balance = store.get_balance(&txn.to)?;
    if to_balance < txn.amount {
        // The forward transfer never paid out; nothing to revert.
        return Ok(());
    }
    let from_balance = store.get_balance(&txn.from)?;

    store.set_balance(&txn.to, to_balance - txn.amount)?;
    store.set_balance(&txn.from, from_balance + txn.amount)
}
