//! # Outbound Ports
//!
//! Interfaces the tip manager requires from the host: the peer network.
//! The transport behind [`PeerNet`] (gossip, discovery, stream muxing) is
//! outside the consensus core; tests use an in-process implementation.

use async_trait::async_trait;
use shared_types::{Block, Hash, Transaction};
use thiserror::Error;

/// Opaque peer identity as handed out by the transport.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PeerId(pub String);

impl std::fmt::Display for PeerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Error)]
pub enum PeerNetError {
    /// The peer does not have the requested block.
    #[error("peer has no block for the requested hash")]
    NotFound,

    /// Transport-level failure (dial, stream, timeout, decode).
    #[error("peer rpc failed: {0}")]
    Rpc(String),
}

/// A block received from the network, tagged with its sender so that fork
/// resolution can fetch ancestors from the peer that advertised the chain.
#[derive(Debug, Clone)]
pub struct PeerBlock {
    pub block: Block,
    pub sender: PeerId,
}

/// The peer network as seen from the consensus core.
#[async_trait]
pub trait PeerNet: Send + Sync {
    /// Currently connected peers.
    async fn connected_peers(&self) -> Vec<PeerId>;

    /// Fetch one block by hash from a specific peer.
    async fn get_block_by_hash(&self, hash: Hash, peer: &PeerId) -> Result<Block, PeerNetError>;

    /// Ask a specific peer for its canonical tip block.
    async fn get_tip(&self, peer: &PeerId) -> Result<Block, PeerNetError>;

    /// Gossip a block to the network. Fire-and-forget.
    async fn broadcast_block(&self, block: &Block);

    /// Gossip a transaction to the network. Fire-and-forget.
    async fn broadcast_transaction(&self, txn: &Transaction);
}
