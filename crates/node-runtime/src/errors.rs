//! Runtime error surfaces: fatal boot errors, the thin API error the RPC
//! facade maps onto, and the non-blocking submission error.

use tc_block_storage::StoreError;
use tc_consensus::ConsensusError;
use thiserror::Error;

/// Configuration problems are fatal at boot.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed config: {0}")]
    Json(#[from] serde_json::Error),

    #[error("id.private_key is not a usable P-256 key")]
    PrivateKey,

    #[error("malformed address {0:?}: must be 64 hex characters")]
    Address(String),
}

/// Anything that can stop the node from starting.
#[derive(Debug, Error)]
pub enum NodeError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Storage(#[from] StoreError),

    #[error(transparent)]
    Consensus(#[from] ConsensusError),
}

/// User-visible failures of the core API; the RPC facade maps these 1:1.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("not found")]
    NotFound,

    #[error("invalid argument: {0}")]
    InvalidArg(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<StoreError> for ApiError {
    fn from(error: StoreError) -> Self {
        ApiError::Internal(error.to_string())
    }
}

/// Outcome of a non-blocking peer-block submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SubmitError {
    /// Peer channel is backpressured; the caller may retry.
    #[error("peer block channel is full")]
    ChannelFull,

    /// The tip manager is gone; the node is shutting down.
    #[error("node is shutting down")]
    Closed,
}
