//! Test helpers: deterministic block construction against the bundled VDF
//! and in-process [`PeerNet`] doubles.
//!
//! Compiled unconditionally so downstream crates' tests can build valid
//! chains without re-implementing the mining steps.

use crate::ports::{PeerId, PeerNet, PeerNetError};
use async_trait::async_trait;
use shared_crypto::{difficulty, difficulty_seed, CancelFlag, Keypair, StakeTable, Vdf};
use shared_types::{genesis_hash, Block, Hash, Transaction, VdfProof, ZERO_ADDRESS};
use std::collections::HashMap;
use std::sync::RwLock;

/// A stake table containing exactly the given identity.
pub fn single_staker(keypair: &Keypair, stake: f64) -> StakeTable {
    let mut stakes = HashMap::new();
    stakes.insert(keypair.address(), stake);
    StakeTable::new(stakes, stake)
}

/// A signed zero-amount self-transaction for a height slot.
pub fn empty_txn(keypair: &Keypair, height: u64) -> Transaction {
    let mut txn = Transaction::new(ZERO_ADDRESS, ZERO_ADDRESS, 0.0, height);
    keypair.sign_transaction(&mut txn);
    txn
}

/// Produce a fully valid block the way the miner would: sign the slot seed,
/// derive the difficulty from the signature and stake, run the VDF.
pub fn mine_block(
    keypair: &Keypair,
    prev_hash: Hash,
    height: u64,
    txn: Transaction,
    stake: &StakeTable,
    base_difficulty: u64,
    vdf: &dyn Vdf,
) -> Block {
    let mut block = Block {
        prev_hash,
        height,
        epoch_begin_hash: genesis_hash(),
        txn,
        signature: [0u8; 64],
        public_key: keypair.public_key_bytes(),
        proof: VdfProof::zero(),
    };

    let seed = difficulty_seed(&block.epoch_begin_hash, height);
    block.signature = keypair.sign(&seed);

    let diff = difficulty(
        &block.signature,
        stake.sum(),
        stake.stake_of(&keypair.address()),
        base_difficulty,
    );
    block.proof = vdf
        .execute(diff, &block.hash_without_proof(), &CancelFlag::new())
        .expect("uncancelled VDF run completes");
    block
}

/// A network with no peers; every RPC fails.
pub struct NullPeerNet;

#[async_trait]
impl PeerNet for NullPeerNet {
    async fn connected_peers(&self) -> Vec<PeerId> {
        Vec::new()
    }

    async fn get_block_by_hash(&self, _hash: Hash, _peer: &PeerId) -> Result<Block, PeerNetError> {
        Err(PeerNetError::Rpc("no peers".into()))
    }

    async fn get_tip(&self, _peer: &PeerId) -> Result<Block, PeerNetError> {
        Err(PeerNetError::Rpc("no peers".into()))
    }

    async fn broadcast_block(&self, _block: &Block) {}

    async fn broadcast_transaction(&self, _txn: &Transaction) {}
}

/// Serves a fixed set of blocks by hash, records broadcasts. Stands in for
/// the peer that advertised a competing chain.
#[derive(Default)]
pub struct MapPeerNet {
    blocks: RwLock<HashMap<Hash, Block>>,
    tip: RwLock<Option<Block>>,
    peers: RwLock<Vec<PeerId>>,
    broadcasts: RwLock<Vec<Block>>,
}

impl MapPeerNet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_block(&self, block: Block) {
        self.blocks.write().unwrap().insert(block.hash(), block);
    }

    pub fn set_tip(&self, block: Block) {
        self.add_block(block);
        *self.tip.write().unwrap() = Some(block);
    }

    pub fn add_peer(&self, peer: PeerId) {
        self.peers.write().unwrap().push(peer);
    }

    /// Blocks gossiped by the node under test, in order.
    pub fn broadcasts(&self) -> Vec<Block> {
        self.broadcasts.read().unwrap().clone()
    }
}

#[async_trait]
impl PeerNet for MapPeerNet {
    async fn connected_peers(&self) -> Vec<PeerId> {
        self.peers.read().unwrap().clone()
    }

    async fn get_block_by_hash(&self, hash: Hash, _peer: &PeerId) -> Result<Block, PeerNetError> {
        self.blocks
            .read()
            .unwrap()
            .get(&hash)
            .copied()
            .ok_or(PeerNetError::NotFound)
    }

    async fn get_tip(&self, _peer: &PeerId) -> Result<Block, PeerNetError> {
        self.tip
            .read()
            .unwrap()
            .ok_or_else(|| PeerNetError::Rpc("peer has no tip".into()))
    }

    async fn broadcast_block(&self, block: &Block) {
        self.broadcasts.write().unwrap().push(*block);
    }

    async fn broadcast_transaction(&self, _txn: &Transaction) {}
}
