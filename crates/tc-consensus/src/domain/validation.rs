//! # Block Validation
//!
//! The full admission check run on every block before it can touch the
//! canonical chain, local and peer-received alike. The difficulty is
//! recomputed from the block's own slot signature and the stake table, so a
//! miner cannot claim an easier VDF than their stake entitles them to.

use crate::domain::errors::InvalidBlockReason;
use shared_crypto::{address_of, difficulty, difficulty_seed, verify, verify_transaction};
use shared_crypto::{StakeTable, Vdf};
use shared_types::{genesis_hash, Block};

/// Validate a block against the protocol rules.
///
/// Checks, in order: epoch anchor, transaction height binding, transaction
/// signature, slot signature over the difficulty seed, non-zero proof,
/// miner stake, VDF proof at the recomputed difficulty.
pub fn verify_block(
    block: &Block,
    stake: &StakeTable,
    base_difficulty: u64,
    vdf: &dyn Vdf,
) -> Result<(), InvalidBlockReason> {
    if block.epoch_begin_hash != genesis_hash() {
        return Err(InvalidBlockReason::EpochMismatch);
    }

    if block.txn.height != block.height {
        return Err(InvalidBlockReason::TxnHeightMismatch);
    }

    if !verify_transaction(&block.txn) {
        return Err(InvalidBlockReason::TxnSignature);
    }

    let seed = difficulty_seed(&block.epoch_begin_hash, block.height);
    if !verify(&block.public_key, &seed, &block.signature) {
        return Err(InvalidBlockReason::SlotSignature);
    }

    if block.proof.is_zero() {
        return Err(InvalidBlockReason::ZeroProof);
    }

    let miner = address_of(&block.public_key);
    let stake_mine = stake.stake_of(&miner);
    if stake_mine <= 0.0 {
        return Err(InvalidBlockReason::UnknownMiner);
    }

    let diff = difficulty(&block.signature, stake.sum(), stake_mine, base_difficulty);
    if !vdf.verify(diff, &block.hash_without_proof(), &block.proof) {
        return Err(InvalidBlockReason::ProofInvalid);
    }

    Ok(())
}
