//! # Tip Manager
//!
//! The single writer of canonical chain state. One cooperative task drives a
//! three-way select over the mined-block channel, the peer-block channel and
//! a heartbeat timer; every mutation of the store's tip pointer, the balance
//! map and the chain array happens inside this task.
//!
//! ## Block lifecycle
//!
//! Received → height gate → validated → one of:
//! straight extension (parent is our tip), stale local drop, or fork
//! resolution, which walks the candidate chain backwards through the sender
//! until it joins our chain, then swaps the suffix with an undo/redo cycle.
//!
//! Gossip of an accepted block is ordered after its local persistence.

use crate::domain::{
    apply_transaction, undo_transaction, verify_block, ChainLink, ChainState, ConsensusError,
};
use crate::ports::{PeerBlock, PeerId, PeerNet};
use rand::Rng;
use shared_crypto::{StakeTable, Vdf};
use shared_types::{Block, Hash};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tc_block_storage::ChainStore;
use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info, warn};

/// Capacity of the mined-block channel; the miner blocks on send beyond it.
pub const MINED_CHANNEL_CAPACITY: usize = 10;

/// Capacity of the peer-block channel; ingress returns `ChannelFull` beyond
/// it so gossip backpressure never blocks the transport.
pub const PEER_CHANNEL_CAPACITY: usize = 100;

#[derive(Debug, Clone)]
pub struct TipManagerConfig {
    /// Channel silence before a peer tip probe fires.
    pub heartbeat_interval: Duration,
    /// Deadline for one tip probe.
    pub tip_probe_timeout: Duration,
    /// Maximum ancestors fetched during one fork resolution.
    pub max_fork_depth: u64,
}

impl Default for TipManagerConfig {
    fn default() -> Self {
        Self {
            heartbeat_interval: Duration::from_secs(5),
            tip_probe_timeout: Duration::from_secs(3),
            max_fork_depth: 64,
        }
    }
}

/// Where a block came from; local blocks never trigger fork resolution.
enum BlockOrigin {
    Local,
    Peer(PeerId),
}

/// Channel endpoints the tip manager owns.
pub struct TipChannels {
    pub mined_rx: mpsc::Receiver<Block>,
    pub peer_rx: mpsc::Receiver<PeerBlock>,
    /// Clone of the peer-channel sender, used to feed probed tips back in.
    pub peer_tx: mpsc::Sender<PeerBlock>,
    /// Publishes the canonical tip hash after every change.
    pub tip_tx: watch::Sender<Hash>,
}

pub struct TipManager {
    store: ChainStore,
    chain: ChainState,
    peer_net: Arc<dyn PeerNet>,
    stake: StakeTable,
    base_difficulty: u64,
    vdf: Arc<dyn Vdf>,
    channels: TipChannels,
    config: TipManagerConfig,
}

impl TipManager {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        store: ChainStore,
        chain: ChainState,
        peer_net: Arc<dyn PeerNet>,
        stake: StakeTable,
        base_difficulty: u64,
        vdf: Arc<dyn Vdf>,
        channels: TipChannels,
        config: TipManagerConfig,
    ) -> Self {
        Self {
            store,
            chain,
            peer_net,
            stake,
            base_difficulty,
            vdf,
            channels,
            config,
        }
    }

    /// Drive the select loop until the mined-block channel closes.
    pub async fn run(mut self) {
        info!(tip_height = self.chain.tip_height(), "tip manager started");

        loop {
            tokio::select! {
                maybe_block = self.channels.mined_rx.recv() => {
                    let Some(block) = maybe_block else { break };
                    debug!(height = block.height, "locally mined block received");
                    self.process_new_block(block, BlockOrigin::Local).await;
                }
                maybe_block = self.channels.peer_rx.recv() => {
                    let Some(PeerBlock { block, sender }) = maybe_block else { break };
                    debug!(height = block.height, %sender, "peer block received");
                    self.process_new_block(block, BlockOrigin::Peer(sender)).await;
                }
                _ = tokio::time::sleep(self.config.heartbeat_interval) => {
                    self.probe_random_peer().await;
                }
            }
        }

        info!("tip manager stopped");
    }

    async fn process_new_block(&mut self, block: Block, origin: BlockOrigin) {
        let tip = *self.chain.tip();
        let tip_height = self.chain.tip_height();

        // Reorgs require a strictly higher candidate; equal-height churn is
        // rejected outright, local preference included.
        if block.height <= tip_height {
            debug!(height = block.height, tip_height, "block at or below tip, ignored");
            return;
        }

        if let Err(reason) =
            verify_block(&block, &self.stake, self.base_difficulty, self.vdf.as_ref())
        {
            warn!(height = block.height, %reason, "invalid block dropped");
            return;
        }

        let hash = block.hash();
        if block.prev_hash == tip.hash {
            match self.extend_canonical(&block, &hash) {
                Ok(()) => {
                    info!(height = block.height, hash = %hex_prefix(&hash), "chain extended");
                    self.peer_net.broadcast_block(&block).await;
                }
                Err(error) => {
                    // The tip pointer may lag the block store by one block
                    // here; the next heartbeat recovers via a peer probe.
                    error!(%error, height = block.height, "extension aborted");
                }
            }
            return;
        }

        match origin {
            BlockOrigin::Local => {
                debug!(height = block.height, "stale local block, chain moved on");
            }
            BlockOrigin::Peer(sender) => {
                info!(height = block.height, tip_height, %sender, "potential fork, resolving");
                if let Err(error) = self.resolve_fork(block, sender).await {
                    warn!(%error, "fork resolution aborted");
                }
            }
        }
    }

    /// Persist a block that extends the canonical tip. Write order: block,
    /// balances, tip pointer, chain array, watch publication.
    fn extend_canonical(&mut self, block: &Block, hash: &Hash) -> Result<(), ConsensusError> {
        self.store.put_block(hash, block)?;
        apply_transaction(&self.store, &block.txn)?;
        self.store.set_tip_hash(hash)?;
        self.chain.push(ChainLink {
            hash: *hash,
            prev_hash: block.prev_hash,
        });
        self.publish_tip(*hash);
        Ok(())
    }

    /// Walk the candidate chain backwards through `sender` until it joins
    /// ours, then switch to it. Nothing is persisted unless a join is found.
    async fn resolve_fork(&mut self, block: Block, sender: PeerId) -> Result<(), ConsensusError> {
        let incoming_height = block.height;
        let incoming_hash = block.hash();

        let mut candidates: HashMap<u64, Block> = HashMap::new();
        candidates.insert(incoming_height, block);
        let mut cursor = incoming_height;

        loop {
            if incoming_height - cursor >= self.config.max_fork_depth {
                return Err(ConsensusError::ForkDepthExceeded(self.config.max_fork_depth));
            }

            let expected_height = cursor - 1;
            if expected_height == 0 {
                // The candidate at height 1 already failed to join at
                // genesis, so the branches share no history at all.
                return Err(ConsensusError::GenesisDivergence);
            }

            let parent_hash = candidates[&cursor].prev_hash;
            debug!(height = expected_height, hash = %hex_prefix(&parent_hash), "fetching ancestor");
            let ancestor = self
                .peer_net
                .get_block_by_hash(parent_hash, &sender)
                .await?;

            if ancestor.height != expected_height {
                return Err(ConsensusError::AncestorHeightMismatch {
                    expected: expected_height,
                    actual: ancestor.height,
                });
            }
            if ancestor.hash() != parent_hash {
                return Err(ConsensusError::AncestorHashMismatch);
            }
            verify_block(&ancestor, &self.stake, self.base_difficulty, self.vdf.as_ref())?;

            let join_height = expected_height - 1;
            let joins = self
                .chain
                .link_at(join_height)
                .is_some_and(|link| link.hash == ancestor.prev_hash);

            candidates.insert(expected_height, ancestor);
            cursor = expected_height;

            if joins {
                return self.reorg(join_height, incoming_height, incoming_hash, &candidates);
            }
        }
    }

    /// Swap the canonical suffix above `join` for the candidate branch:
    /// undo tip-first, truncate, apply bottom-up, move the tip pointer.
    fn reorg(
        &mut self,
        join: u64,
        incoming_height: u64,
        incoming_hash: Hash,
        candidates: &HashMap<u64, Block>,
    ) -> Result<(), ConsensusError> {
        let old_tip = self.chain.tip_height();
        info!(join, old_tip, new_tip = incoming_height, "reorganizing chain");

        for height in ((join + 1)..=old_tip).rev() {
            let link = *self
                .chain
                .link_at(height)
                .ok_or_else(|| ConsensusError::CorruptChain("chain array gap".into()))?;
            let old_block = self
                .store
                .get_block(&link.hash)?
                .ok_or_else(|| ConsensusError::CorruptChain("canonical block missing".into()))?;
            undo_transaction(&self.store, &old_block.txn)?;
            debug!(height, "rolled back transaction");
        }
        self.chain.truncate((join + 1) as usize);

        for height in (join + 1)..=incoming_height {
            let block = candidates
                .get(&height)
                .ok_or_else(|| ConsensusError::CorruptChain("candidate chain gap".into()))?;
            let hash = block.hash();
            self.store.put_block(&hash, block)?;
            apply_transaction(&self.store, &block.txn)?;
            self.chain.push(ChainLink {
                hash,
                prev_hash: block.prev_hash,
            });
        }

        self.store.set_tip_hash(&incoming_hash)?;
        self.publish_tip(incoming_hash);
        info!(height = incoming_height, hash = %hex_prefix(&incoming_hash), "chain tip switched");
        Ok(())
    }

    /// Ask one random peer for its tip; the response re-enters through the
    /// peer channel as an ordinary gossiped block.
    async fn probe_random_peer(&self) {
        let peers = self.peer_net.connected_peers().await;
        if peers.is_empty() {
            debug!("heartbeat: no peers available for tip probe");
            return;
        }
        let peer = peers[rand::thread_rng().gen_range(0..peers.len())].clone();
        debug!(%peer, "heartbeat: probing peer tip");

        let peer_net = Arc::clone(&self.peer_net);
        let feed = self.channels.peer_tx.clone();
        let deadline = self.config.tip_probe_timeout;
        tokio::spawn(async move {
            match tokio::time::timeout(deadline, peer_net.get_tip(&peer)).await {
                Ok(Ok(block)) => {
                    let sender = peer.clone();
                    if feed.try_send(PeerBlock { block, sender }).is_err() {
                        debug!(%peer, "peer channel full, dropping probed tip");
                    }
                }
                Ok(Err(error)) => warn!(%peer, %error, "tip probe failed"),
                Err(_) => warn!(%peer, "tip probe timed out"),
            }
        });
    }

    fn publish_tip(&self, hash: Hash) {
        // Nobody watching (e.g. mining disabled) is fine.
        let _ = self.channels.tip_tx.send(hash);
    }
}

fn hex_prefix(hash: &Hash) -> String {
    hash[..4].iter().map(|b| format!("{b:02x}")).collect()
}
