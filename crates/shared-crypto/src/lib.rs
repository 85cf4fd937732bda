//! # shared-crypto
//!
//! The cryptographic surface of the node: P-256 signing facade, address
//! derivation, the stake-weighted difficulty sampler and the VDF seam.
//! Everything here is pure or process-local; chain state never enters this
//! crate.

pub mod difficulty;
pub mod ecdsa;
pub mod errors;
pub mod vdf;

pub use difficulty::{difficulty, difficulty_seed, StakeTable, DIFFICULTY_FLOOR};
pub use ecdsa::{
    address_of, verify, verify_transaction, verifying_key_from_raw, verifying_key_to_raw, Keypair,
};
pub use errors::CryptoError;
pub use vdf::{CancelFlag, SequentialHashVdf, Vdf};
