//! # Node Configuration
//!
//! JSON-backed configuration. The private key is PEM in the file; the
//! public key and address are always derived from it rather than trusted
//! from the config. Addresses in the stake and bank tables are hex-encoded
//! 32-byte strings.

use crate::errors::ConfigError;
use serde::{Deserialize, Serialize};
use shared_crypto::{Keypair, StakeTable};
use shared_types::Address;
use std::collections::HashMap;
use std::path::Path;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IdentityConfig {
    /// PEM-encoded EC private key (SEC1 `EC PRIVATE KEY` or PKCS#8).
    pub private_key: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeConfig {
    pub id: IdentityConfig,

    /// This node's stake weight.
    pub stake_mine: f64,

    /// Total network stake.
    pub stake_sum: f64,

    /// Base VDF iteration count (the protocol's time parameter T).
    pub mining_difficulty: u64,

    /// Persistence root for the RocksDB backend.
    #[serde(default)]
    pub db_path: String,

    /// Loopback RPC listener port (consumed by the RPC adapter).
    #[serde(default)]
    pub rpc_port: u16,

    /// Multi-address for inbound peers (consumed by the transport).
    #[serde(default)]
    pub p2p_listen_addr: String,

    /// Multi-addresses dialed at start (consumed by the transport).
    #[serde(default)]
    pub bootstrap_peer: Vec<String>,

    /// Hex address → stake weight at genesis.
    #[serde(default)]
    pub init_stake: HashMap<String, f64>,

    /// Hex address → balance at genesis.
    #[serde(default)]
    pub init_bank: HashMap<String, f64>,
}

impl NodeConfig {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let data = std::fs::read_to_string(path)?;
        Self::from_json(&data)
    }

    pub fn from_json(data: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(data)?)
    }

    /// Parse the configured identity.
    pub fn keypair(&self) -> Result<Keypair, ConfigError> {
        Keypair::from_pem(&self.id.private_key).map_err(|_| ConfigError::PrivateKey)
    }

    /// The static stake table.
    pub fn stake_table(&self) -> Result<StakeTable, ConfigError> {
        let mut stakes = HashMap::with_capacity(self.init_stake.len());
        for (hex_addr, stake) in &self.init_stake {
            stakes.insert(parse_address(hex_addr)?, *stake);
        }
        Ok(StakeTable::new(stakes, self.stake_sum))
    }

    /// Genesis balances.
    pub fn initial_balances(&self) -> Result<Vec<(Address, f64)>, ConfigError> {
        let mut balances = Vec::with_capacity(self.init_bank.len());
        for (hex_addr, balance) in &self.init_bank {
            balances.push((parse_address(hex_addr)?, *balance));
        }
        Ok(balances)
    }
}

fn parse_address(hex_addr: &str) -> Result<Address, ConfigError> {
    let bytes = hex::decode(hex_addr).map_err(|_| ConfigError::Address(hex_addr.into()))?;
    bytes
        .try_into()
        .map_err(|_| ConfigError::Address(hex_addr.into()))
}

/// Produce a fresh identity: the PEM for a config file and the derived hex
/// address for the stake and bank tables.
pub fn generate_identity() -> (String, String) {
    let keypair = Keypair::generate();
    let pem = keypair.to_pem().expect("freshly generated key serializes");
    (pem.to_string(), hex::encode(keypair.address()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_config() -> (NodeConfig, String) {
        let (pem, address) = generate_identity();
        let config = NodeConfig {
            id: IdentityConfig { private_key: pem },
            stake_mine: 100.0,
            stake_sum: 100.0,
            mining_difficulty: 1,
            db_path: String::new(),
            rpc_port: 0,
            p2p_listen_addr: String::new(),
            bootstrap_peer: Vec::new(),
            init_stake: HashMap::from([(address.clone(), 100.0)]),
            init_bank: HashMap::from([(address.clone(), 1000.0)]),
        };
        // The file format must survive a serialize/deserialize pass.
        let json = serde_json::to_string(&config).unwrap();
        (NodeConfig::from_json(&json).unwrap(), address)
    }

    #[test]
    fn round_trips_identity_and_tables() {
        let (config, address) = sample_config();
        let keypair = config.keypair().unwrap();
        assert_eq!(hex::encode(keypair.address()), address);

        let stake = config.stake_table().unwrap();
        assert_eq!(stake.stake_of(&keypair.address()), 100.0);
        assert_eq!(stake.sum(), 100.0);

        let balances = config.initial_balances().unwrap();
        assert_eq!(balances, vec![(keypair.address(), 1000.0)]);
    }

    #[test]
    fn optional_fields_default() {
        let (config, _) = sample_config();
        assert_eq!(config.db_path, "");
        assert_eq!(config.rpc_port, 0);
        assert!(config.bootstrap_peer.is_empty());
    }

    #[test]
    fn bad_addresses_are_fatal() {
        let (mut config, _) = sample_config();
        config.init_stake = HashMap::from([("zz".to_string(), 1.0)]);
        assert!(matches!(
            config.stake_table(),
            Err(ConfigError::Address(_))
        ));
    }

    #[test]
    fn bad_pem_is_fatal() {
        let (mut config, _) = sample_config();
        config.id.private_key = "not a pem".to_string();
        assert!(matches!(config.keypair(), Err(ConfigError::PrivateKey)));
    }

    #[test]
    fn minimal_json_parses_with_defaults() {
        let json = r#"{
            "id": { "private_key": "" },
            "stake_mine": 1.0,
            "stake_sum": 10.0,
            "mining_difficulty": 1000
        }"#;
        let config = NodeConfig::from_json(json).unwrap();
        assert_eq!(config.mining_difficulty, 1000);
        assert!(config.init_stake.is_empty());
        assert!(config.init_bank.is_empty());
    }
}
