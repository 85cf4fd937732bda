//! # tc-consensus
//!
//! The consensus core's hardest piece: block validation, the ledger
//! apply/undo pair, the canonical chain array and the single-writer tip
//! manager that arbitrates between locally mined and gossiped blocks,
//! resolving forks by walking candidate chains back to a join point.

pub mod domain;
pub mod ports;
pub mod service;
pub mod test_support;

pub use domain::{
    apply_transaction, undo_transaction, verify_block, ChainLink, ChainState, ConsensusError,
    InvalidBlockReason,
};
pub use ports::{PeerBlock, PeerId, PeerNet, PeerNetError};
pub use service::{
    TipChannels, TipManager, TipManagerConfig, MINED_CHANNEL_CAPACITY, PEER_CHANNEL_CAPACITY,
};
