//! # Node Wiring
//!
//! Owns boot and shutdown: derives the identity, bootstraps or restores the
//! chain, builds the channel fabric, and spawns the two long-lived tasks
//! (miner and tip manager). The resulting [`Node`] handle is the core API
//! the RPC facade and the peer transport call into.

use crate::config::NodeConfig;
use crate::errors::{ApiError, NodeError, SubmitError};
use shared_crypto::{verify_transaction, Keypair, Vdf};
use shared_types::{genesis_block, genesis_hash, Address, Block, Hash, Transaction};
use std::sync::Arc;
use tc_block_production::{Miner, MinerConfig};
use tc_block_storage::{ChainStore, KeyValueStore, StoreError};
use tc_consensus::{
    ChainState, PeerBlock, PeerId, PeerNet, TipChannels, TipManager, TipManagerConfig,
    MINED_CHANNEL_CAPACITY, PEER_CHANNEL_CAPACITY,
};
use tc_mempool::TransactionPool;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::sync::mpsc::error::TrySendError;
use tracing::info;

/// A running node and the core API over it.
pub struct Node {
    store: ChainStore,
    pool: Arc<TransactionPool>,
    peer_net: Arc<dyn PeerNet>,
    peer_tx: mpsc::Sender<PeerBlock>,
    tip_rx: watch::Receiver<Hash>,
    keypair: Arc<Keypair>,
    tasks: Vec<JoinHandle<()>>,
}

impl Node {
    /// Boot a node: bootstrap or restore the chain, then spawn the miner
    /// and tip manager tasks onto the current runtime.
    pub fn start(
        config: &NodeConfig,
        kv: Arc<dyn KeyValueStore>,
        peer_net: Arc<dyn PeerNet>,
        vdf: Arc<dyn Vdf>,
    ) -> Result<Self, NodeError> {
        let keypair = Arc::new(config.keypair()?);
        let store = ChainStore::new(kv);
        let chain = bootstrap_chain(&store, config)?;
        let stake = config.stake_table()?;
        let pool = Arc::new(TransactionPool::new());

        info!(
            address = %hex::encode(keypair.address()),
            tip_height = chain.tip_height(),
            "node starting"
        );

        let (mined_tx, mined_rx) = mpsc::channel(MINED_CHANNEL_CAPACITY);
        let (peer_tx, peer_rx) = mpsc::channel(PEER_CHANNEL_CAPACITY);
        let (tip_tx, tip_rx) = watch::channel(store.get_tip_hash()?);

        let tip_manager = TipManager::new(
            store.clone(),
            chain,
            Arc::clone(&peer_net),
            stake,
            config.mining_difficulty,
            Arc::clone(&vdf),
            TipChannels {
                mined_rx,
                peer_rx,
                peer_tx: peer_tx.clone(),
                tip_tx,
            },
            TipManagerConfig::default(),
        );
        let miner = Miner::new(
            store.clone(),
            Arc::clone(&keypair),
            Arc::clone(&pool),
            vdf,
            mined_tx,
            tip_rx.clone(),
            MinerConfig::new(config.stake_mine, config.stake_sum, config.mining_difficulty),
        );

        let tasks = vec![tokio::spawn(tip_manager.run()), tokio::spawn(miner.run())];

        Ok(Self {
            store,
            pool,
            peer_net,
            peer_tx,
            tip_rx,
            keypair,
            tasks,
        })
    }

    // === Core API exposed to PeerNet and the RPC facade ===

    /// Enqueue a gossiped block. Non-blocking: backpressure surfaces as
    /// [`SubmitError::ChannelFull`] and the transport may retry.
    pub fn submit_peer_block(&self, block: Block, sender: PeerId) -> Result<(), SubmitError> {
        self.peer_tx
            .try_send(PeerBlock { block, sender })
            .map_err(|error| match error {
                TrySendError::Full(_) => SubmitError::ChannelFull,
                TrySendError::Closed(_) => SubmitError::Closed,
            })
    }

    /// Pool a transaction at its intended height, last writer wins.
    pub fn submit_transaction(&self, txn: Transaction) -> Result<(), ApiError> {
        if !verify_transaction(&txn) {
            return Err(ApiError::InvalidArg("transaction signature invalid".into()));
        }
        self.pool.insert(txn);
        Ok(())
    }

    pub fn get_block_by_hash(&self, hash: &Hash) -> Result<Block, ApiError> {
        self.store.get_block(hash)?.ok_or(ApiError::NotFound)
    }

    pub fn get_tip_block(&self) -> Result<Block, ApiError> {
        Ok(self.store.get_tip_block()?)
    }

    pub fn get_address(&self) -> Address {
        self.keypair.address()
    }

    pub fn get_balance(&self, address: &Address) -> Result<f64, ApiError> {
        Ok(self.store.get_balance(address)?)
    }

    /// Build, sign, pool and gossip a transfer from this node's account.
    /// The transaction targets `tip.height + 2` so the slot is still open
    /// once the block currently being mined lands.
    pub async fn send_transaction(&self, dest: Address, amount: f64) -> Result<(), ApiError> {
        let tip = self.get_tip_block()?;
        let mut txn = Transaction::new(self.keypair.address(), dest, amount, tip.height + 2);
        self.keypair.sign_transaction(&mut txn);
        self.pool.insert(txn);
        self.peer_net.broadcast_transaction(&txn).await;
        Ok(())
    }

    // === Accessors used by adapters and tests ===

    /// Watch the canonical tip hash.
    pub fn tip_watch(&self) -> watch::Receiver<Hash> {
        self.tip_rx.clone()
    }

    pub fn store(&self) -> ChainStore {
        self.store.clone()
    }

    pub fn pool(&self) -> Arc<TransactionPool> {
        Arc::clone(&self.pool)
    }

    pub fn peer_sender(&self) -> mpsc::Sender<PeerBlock> {
        self.peer_tx.clone()
    }

    /// Stop both long-lived tasks.
    pub fn shutdown(&mut self) {
        for task in self.tasks.drain(..) {
            task.abort();
        }
        info!("node stopped");
    }
}

impl Drop for Node {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// First boot writes the genesis bank and block; any later boot walks the
/// persisted chain back to genesis to rebuild the chain array.
fn bootstrap_chain(store: &ChainStore, config: &NodeConfig) -> Result<ChainState, NodeError> {
    match store.get_tip_hash() {
        Ok(_) => Ok(ChainState::restore(store)?),
        Err(StoreError::TipUnset) => {
            for (address, balance) in config.initial_balances()? {
                store.set_balance(&address, balance)?;
            }
            store.put_block(&genesis_hash(), &genesis_block())?;
            store.set_tip_hash(&genesis_hash())?;
            info!(hash = %hex::encode(genesis_hash()), "genesis bootstrapped");
            Ok(ChainState::genesis())
        }
        Err(error) => Err(error.into()),
    }
}
