//! # Mining Loop
//!
//! Builds a candidate on the current tip, signs the slot's difficulty seed,
//! samples the VDF iteration count from the signature and stake, then runs
//! the VDF on a blocking worker. The attempt is preempted the moment the
//! canonical tip moves: primarily through the tip watch channel the tip
//! manager publishes on, with a periodic store poll as the configurable
//! fallback for anything the watch missed.
//!
//! Finished blocks go out on the bounded mined-block channel; the send
//! happens only after the VDF completes, so submission never stalls the
//! compute, and the miner does not start the next attempt until the tip
//! manager has taken the block off the channel or buffered it.

use shared_crypto::{difficulty, difficulty_seed, CancelFlag, Keypair, Vdf};
use shared_types::{genesis_hash, Block, Transaction, VdfProof, ZERO_ADDRESS};
use std::sync::Arc;
use std::time::Duration;
use tc_block_storage::ChainStore;
use tc_mempool::TransactionPool;
use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone)]
pub struct MinerConfig {
    /// This node's stake weight.
    pub stake_mine: f64,
    /// Total network stake.
    pub stake_sum: f64,
    /// Base VDF iteration count (the protocol's time parameter).
    pub base_difficulty: u64,
    /// Fallback store-poll cadence for tip changes.
    pub tip_poll_interval: Duration,
    /// Back-off after a store failure.
    pub store_retry_backoff: Duration,
    /// Pause between mining attempts.
    pub restart_delay: Duration,
}

impl MinerConfig {
    pub fn new(stake_mine: f64, stake_sum: f64, base_difficulty: u64) -> Self {
        Self {
            stake_mine,
            stake_sum,
            base_difficulty,
            tip_poll_interval: Duration::from_millis(500),
            store_retry_backoff: Duration::from_secs(5),
            restart_delay: Duration::from_millis(10),
        }
    }
}

pub struct Miner {
    store: ChainStore,
    keypair: Arc<Keypair>,
    pool: Arc<TransactionPool>,
    vdf: Arc<dyn Vdf>,
    mined_tx: mpsc::Sender<Block>,
    tip_rx: watch::Receiver<shared_types::Hash>,
    config: MinerConfig,
}

impl Miner {
    pub fn new(
        store: ChainStore,
        keypair: Arc<Keypair>,
        pool: Arc<TransactionPool>,
        vdf: Arc<dyn Vdf>,
        mined_tx: mpsc::Sender<Block>,
        tip_rx: watch::Receiver<shared_types::Hash>,
        config: MinerConfig,
    ) -> Self {
        Self {
            store,
            keypair,
            pool,
            vdf,
            mined_tx,
            tip_rx,
            config,
        }
    }

    /// Mine until the mined-block channel closes.
    pub async fn run(mut self) {
        info!(
            stake = self.config.stake_mine,
            base_difficulty = self.config.base_difficulty,
            "miner started"
        );
        loop {
            if !self.mine_once().await {
                break;
            }
            tokio::time::sleep(self.config.restart_delay).await;
        }
        info!("miner stopped");
    }

    /// One mining attempt. Returns `false` when the node is shutting down.
    async fn mine_once(&mut self) -> bool {
        let tip_hash = match self.store.get_tip_hash() {
            Ok(hash) => hash,
            Err(error) => {
                warn!(%error, "cannot read tip hash, backing off");
                tokio::time::sleep(self.config.store_retry_backoff).await;
                return true;
            }
        };
        let tip_block = match self.store.get_block(&tip_hash) {
            Ok(Some(block)) => block,
            Ok(None) => {
                warn!("tip hash points at a missing block, backing off");
                tokio::time::sleep(self.config.store_retry_backoff).await;
                return true;
            }
            Err(error) => {
                warn!(%error, "cannot read tip block, backing off");
                tokio::time::sleep(self.config.store_retry_backoff).await;
                return true;
            }
        };

        let height = tip_block.height + 1;
        let mut block = Block {
            prev_hash: tip_hash,
            height,
            epoch_begin_hash: genesis_hash(),
            txn: self.select_transaction(height),
            signature: [0u8; 64],
            public_key: self.keypair.public_key_bytes(),
            proof: VdfProof::zero(),
        };

        let seed = difficulty_seed(&block.epoch_begin_hash, height);
        block.signature = match self.keypair.try_sign(&seed) {
            Ok(signature) => signature,
            Err(error) => {
                warn!(%error, "seed signing failed, skipping attempt");
                return true;
            }
        };

        let diff = difficulty(
            &block.signature,
            self.config.stake_sum,
            self.config.stake_mine,
            self.config.base_difficulty,
        );
        let input = block.hash_without_proof();
        info!(height, difficulty = diff, "mining attempt started");

        let cancel = CancelFlag::new();
        let vdf = Arc::clone(&self.vdf);
        let flag = cancel.clone();
        let mut vdf_task = tokio::task::spawn_blocking(move || vdf.execute(diff, &input, &flag));

        // Mark the current watch value as seen; a change that landed between
        // the store read and here is caught by the poll fallback.
        let _ = self.tip_rx.borrow_and_update();
        let mut poll = tokio::time::interval(self.config.tip_poll_interval);
        poll.tick().await; // the first tick fires immediately

        let outcome = loop {
            tokio::select! {
                joined = &mut vdf_task => {
                    break match joined {
                        Ok(proof) => proof,
                        Err(error) => {
                            error!(%error, "vdf worker failed");
                            None
                        }
                    };
                }
                changed = self.tip_rx.changed() => {
                    match changed {
                        Ok(()) => {
                            if *self.tip_rx.borrow_and_update() != tip_hash {
                                debug!(height, "tip moved, preempting attempt");
                                cancel.cancel();
                            }
                        }
                        Err(_) => {
                            // Tip publisher is gone; wind the attempt down.
                            cancel.cancel();
                            break (&mut vdf_task).await.ok().flatten();
                        }
                    }
                }
                _ = poll.tick() => {
                    match self.store.get_tip_hash() {
                        Ok(hash) if hash != tip_hash => {
                            debug!(height, "tip poll detected a move, preempting attempt");
                            cancel.cancel();
                        }
                        Ok(_) => {}
                        Err(error) => debug!(%error, "tip poll failed"),
                    }
                }
            }
        };

        let Some(proof) = outcome else {
            debug!(height, "mining attempt cancelled");
            return true;
        };

        block.proof = proof;
        info!(height, "block mined");
        if self.mined_tx.send(block).await.is_err() {
            debug!("mined-block channel closed");
            return false;
        }
        true
    }

    /// The pooled transaction for this height, or a signed zero-amount
    /// self-transaction that merely satisfies the height binding. Pool
    /// entries stay put: a reorg may need them again.
    fn select_transaction(&self, height: u64) -> Transaction {
        if let Some(txn) = self.pool.get(height) {
            return txn;
        }
        let mut txn = Transaction::new(ZERO_ADDRESS, ZERO_ADDRESS, 0.0, height);
        self.keypair.sign_transaction(&mut txn);
        txn
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_crypto::SequentialHashVdf;
    use shared_types::{genesis_block, genesis_hash};
    use tc_block_storage::InMemoryKVStore;

    fn miner_fixture() -> (Miner, Arc<TransactionPool>) {
        let store = ChainStore::new(Arc::new(InMemoryKVStore::new()));
        store.put_block(&genesis_hash(), &genesis_block()).unwrap();
        store.set_tip_hash(&genesis_hash()).unwrap();

        let pool = Arc::new(TransactionPool::new());
        let (mined_tx, _mined_rx) = mpsc::channel(1);
        let (_tip_tx, tip_rx) = watch::channel(genesis_hash());
        let miner = Miner::new(
            store,
            Arc::new(Keypair::generate()),
            Arc::clone(&pool),
            Arc::new(SequentialHashVdf::new()),
            mined_tx,
            tip_rx,
            MinerConfig::new(100.0, 100.0, 1),
        );
        (miner, pool)
    }

    #[test]
    fn select_transaction_prefers_the_pool() {
        let (miner, pool) = miner_fixture();
        let mut pooled = Transaction::new([1u8; 32], [2u8; 32], 9.0, 5);
        pooled.signature = [3u8; 64];
        pool.insert(pooled);

        assert_eq!(miner.select_transaction(5), pooled);
        // The pool entry survives selection.
        assert!(pool.get(5).is_some());
    }

    #[test]
    fn select_transaction_falls_back_to_a_signed_self_transfer() {
        let (miner, _pool) = miner_fixture();
        let txn = miner.select_transaction(3);

        assert!(txn.is_empty_transfer());
        assert_eq!(txn.height, 3);
        assert!(shared_crypto::verify_transaction(&txn));
    }
}
