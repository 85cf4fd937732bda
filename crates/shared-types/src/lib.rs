//! # shared-types
//!
//! Chain entities shared by every subsystem: blocks, transactions, the
//! canonical digests, the fixed-layout codec and the genesis constant.
//! This crate is dependency-light on purpose; crypto operations live in
//! `shared-crypto` and everything stateful lives in the subsystem crates.

pub mod codec;
pub mod entities;
pub mod errors;
pub mod genesis;

pub use entities::{
    amount_bits, Address, Block, Hash, PublicKeyBytes, SignatureBytes, Transaction, VdfProof,
    PROOF_LEN, ZERO_ADDRESS,
};
pub use errors::CodecError;
pub use genesis::{genesis_block, genesis_hash};
