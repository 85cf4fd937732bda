//! Shared fixtures for the node integration tests.

use node_runtime::{IdentityConfig, NodeConfig};
use shared_crypto::Keypair;
use std::collections::HashMap;
use std::time::Duration;

/// A config whose identity is `keypair`, with explicit stake and bank
/// tables (hex-address keyed, as in the file format).
pub fn config_for(
    keypair: &Keypair,
    stake_mine: f64,
    stake_sum: f64,
    init_stake: &[(&Keypair, f64)],
    init_bank: &[(&Keypair, f64)],
) -> NodeConfig {
    NodeConfig {
        id: IdentityConfig {
            private_key: keypair.to_pem().unwrap().to_string(),
        },
        stake_mine,
        stake_sum,
        mining_difficulty: 1,
        db_path: String::new(),
        rpc_port: 0,
        p2p_listen_addr: String::new(),
        bootstrap_peer: Vec::new(),
        init_stake: init_stake
            .iter()
            .map(|(kp, stake)| (hex::encode(kp.address()), *stake))
            .collect::<HashMap<_, _>>(),
        init_bank: init_bank
            .iter()
            .map(|(kp, balance)| (hex::encode(kp.address()), *balance))
            .collect::<HashMap<_, _>>(),
    }
}

/// Poll until `predicate` holds or the deadline passes.
pub async fn wait_until<F: FnMut() -> bool>(deadline: Duration, mut predicate: F) -> bool {
    let started = std::time::Instant::now();
    while started.elapsed() < deadline {
        if predicate() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    predicate()
}
