//! # tc-block-production
//!
//! The miner: a long-lived loop that assembles candidates on the canonical
//! tip, runs the stake-weighted VDF and hands finished blocks to the tip
//! manager. Read-only against the store; all chain mutation happens on the
//! other side of the mined-block channel.

pub mod miner;

pub use miner::{Miner, MinerConfig};
