//! Standalone node binary. Loads a JSON config, opens the configured store
//! and runs until interrupted. The peer transport and RPC listener attach
//! out of tree; a bare binary mines against its own chain.

use anyhow::Context;
use node_runtime::{telemetry, LoopbackHub, LoopbackPeerNet, Node, NodeConfig};
use shared_crypto::SequentialHashVdf;
use std::sync::Arc;
use tracing::info;

fn main() -> anyhow::Result<()> {
    telemetry::init_tracing();

    let config_path = std::env::args()
        .nth(1)
        .context("usage: tempo-node <config.json>")?;
    let config = NodeConfig::from_file(&config_path)
        .with_context(|| format!("loading config from {config_path}"))?;

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(run(config))
}

async fn run(config: NodeConfig) -> anyhow::Result<()> {
    let kv = node_runtime::open_store(&config)?;
    let hub = LoopbackHub::new();
    let peer_net = Arc::new(LoopbackPeerNet::new(Arc::clone(&hub), "local"));
    let vdf = Arc::new(SequentialHashVdf::new());

    let mut node = Node::start(&config, kv, peer_net, vdf)?;
    hub.register("local", &node);

    info!(
        rpc_port = config.rpc_port,
        p2p_listen_addr = %config.p2p_listen_addr,
        "node running, press ctrl-c to stop"
    );
    tokio::signal::ctrl_c().await?;
    node.shutdown();
    Ok(())
}
