//! Consensus error types.

use crate::ports::PeerNetError;
use tc_block_storage::StoreError;
use thiserror::Error;

/// Why a block failed validation. Invalid blocks are logged and dropped;
/// the sending peer is never penalized in this core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum InvalidBlockReason {
    #[error("epoch anchor does not match genesis")]
    EpochMismatch,

    #[error("transaction height does not match block height")]
    TxnHeightMismatch,

    #[error("transaction signature invalid")]
    TxnSignature,

    #[error("slot signature over the difficulty seed invalid")]
    SlotSignature,

    #[error("proof is all zeros")]
    ZeroProof,

    #[error("miner has no stake")]
    UnknownMiner,

    #[error("VDF proof does not verify at the recomputed difficulty")]
    ProofInvalid,
}

#[derive(Debug, Error)]
pub enum ConsensusError {
    #[error("invalid block: {0}")]
    InvalidBlock(#[from] InvalidBlockReason),

    #[error(transparent)]
    Storage(#[from] StoreError),

    #[error(transparent)]
    PeerRpc(#[from] PeerNetError),

    #[error("fork walk exceeded {0} ancestors")]
    ForkDepthExceeded(u64),

    #[error("ancestor height mismatch: expected {expected}, got {actual}")]
    AncestorHeightMismatch { expected: u64, actual: u64 },

    #[error("fetched ancestor does not hash to the requested hash")]
    AncestorHashMismatch,

    #[error("candidate chain diverges at genesis")]
    GenesisDivergence,

    #[error("chain state corrupt: {0}")]
    CorruptChain(String),
}
