//! # In-Process Peer Network
//!
//! A [`PeerNet`] implementation that wires nodes of the same process
//! directly to each other: block fetches read the remote node's store,
//! broadcasts push into the remote peer channels and transaction pools.
//! Used by the multi-node tests and by the standalone binary (where a hub
//! with a single registered node simply has no peers). The real libp2p
//! transport implements the same trait out of tree.

use crate::node::Node;
use async_trait::async_trait;
use parking_lot::RwLock;
use shared_types::{Block, Hash, Transaction};
use std::collections::HashMap;
use std::sync::Arc;
use tc_block_storage::ChainStore;
use tc_consensus::{PeerBlock, PeerId, PeerNet, PeerNetError};
use tc_mempool::TransactionPool;
use tokio::sync::mpsc;
use tracing::debug;

struct Endpoint {
    store: ChainStore,
    peer_tx: mpsc::Sender<PeerBlock>,
    pool: Arc<TransactionPool>,
}

/// Registry of in-process nodes.
#[derive(Default)]
pub struct LoopbackHub {
    endpoints: RwLock<HashMap<PeerId, Endpoint>>,
}

impl LoopbackHub {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Attach a started node under a peer id.
    pub fn register(&self, id: impl Into<String>, node: &Node) {
        self.endpoints.write().insert(
            PeerId(id.into()),
            Endpoint {
                store: node.store(),
                peer_tx: node.peer_sender(),
                pool: node.pool(),
            },
        );
    }

    fn peers_except(&self, local: &PeerId) -> Vec<PeerId> {
        self.endpoints
            .read()
            .keys()
            .filter(|id| *id != local)
            .cloned()
            .collect()
    }
}

/// One node's view of the hub.
pub struct LoopbackPeerNet {
    hub: Arc<LoopbackHub>,
    local_id: PeerId,
}

impl LoopbackPeerNet {
    pub fn new(hub: Arc<LoopbackHub>, local_id: impl Into<String>) -> Self {
        Self {
            hub,
            local_id: PeerId(local_id.into()),
        }
    }
}

#[async_trait]
impl PeerNet for LoopbackPeerNet {
    async fn connected_peers(&self) -> Vec<PeerId> {
        self.hub.peers_except(&self.local_id)
    }

    async fn get_block_by_hash(&self, hash: Hash, peer: &PeerId) -> Result<Block, PeerNetError> {
        let endpoints = self.hub.endpoints.read();
        let endpoint = endpoints
            .get(peer)
            .ok_or_else(|| PeerNetError::Rpc(format!("unknown peer {peer}")))?;
        endpoint
            .store
            .get_block(&hash)
            .map_err(|error| PeerNetError::Rpc(error.to_string()))?
            .ok_or(PeerNetError::NotFound)
    }

    async fn get_tip(&self, peer: &PeerId) -> Result<Block, PeerNetError> {
        let endpoints = self.hub.endpoints.read();
        let endpoint = endpoints
            .get(peer)
            .ok_or_else(|| PeerNetError::Rpc(format!("unknown peer {peer}")))?;
        endpoint
            .store
            .get_tip_block()
            .map_err(|error| PeerNetError::Rpc(error.to_string()))
    }

    async fn broadcast_block(&self, block: &Block) {
        for peer in self.hub.peers_except(&self.local_id) {
            let target = {
                let endpoints = self.hub.endpoints.read();
                endpoints.get(&peer).map(|e| e.peer_tx.clone())
            };
            if let Some(sender) = target {
                if sender
                    .try_send(PeerBlock {
                        block: *block,
                        sender: self.local_id.clone(),
                    })
                    .is_err()
                {
                    debug!(%peer, "peer channel full, dropping gossiped block");
                }
            }
        }
    }

    async fn broadcast_transaction(&self, txn: &Transaction) {
        for peer in self.hub.peers_except(&self.local_id) {
            let pool = {
                let endpoints = self.hub.endpoints.read();
                endpoints.get(&peer).map(|e| Arc::clone(&e.pool))
            };
            if let Some(pool) = pool {
                pool.insert(*txn);
            }
        }
    }
}
