//! The hard-coded genesis block.
//!
//! The literal bytes below are part of the protocol identity: every node
//! derives the same genesis hash from them, and validation pins
//! `epoch_begin_hash` of every block to it. Changing any byte forks the
//! network.

use crate::entities::{Block, Hash, Transaction, VdfProof, PROOF_LEN};
use std::sync::OnceLock;

fn padded<const N: usize>(text: &[u8]) -> [u8; N] {
    let mut buf = [0u8; N];
    buf[..text.len()].copy_from_slice(text);
    buf
}

/// Builds the genesis block. Height 0, zero parent, zero keys; the epoch
/// anchor, signature and proof fields carry fixed ASCII literals.
pub fn genesis_block() -> Block {
    Block {
        prev_hash: [0u8; 32],
        height: 0,
        epoch_begin_hash: padded::<32>(b"HELLO, DA"),
        txn: Transaction::new([0u8; 32], [0u8; 32], 0.0, 0),
        signature: padded::<64>(b"MADE BY RONGWANG"),
        public_key: [0u8; 64],
        proof: VdfProof(padded::<PROOF_LEN>(
            b"There is always something that you cannot proof",
        )),
    }
}

/// The genesis block's identity hash, computed once per process.
pub fn genesis_hash() -> Hash {
    static HASH: OnceLock<Hash> = OnceLock::new();
    *HASH.get_or_init(|| genesis_block().hash())
}
