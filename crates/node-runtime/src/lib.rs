//! # node-runtime
//!
//! Ties the subsystem crates into a running node: configuration, genesis
//! bootstrap, the channel fabric between miner and tip manager, the core
//! API handle, the peer wire framing, and the persistence backends.

pub mod config;
pub mod errors;
pub mod loopback;
pub mod node;
pub mod protocol;
pub mod storage;
pub mod telemetry;

pub use config::{generate_identity, IdentityConfig, NodeConfig};
pub use errors::{ApiError, ConfigError, NodeError, SubmitError};
pub use loopback::{LoopbackHub, LoopbackPeerNet};
pub use node::Node;
pub use storage::open_store;
