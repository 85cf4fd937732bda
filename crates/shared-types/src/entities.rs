//! # Core Chain Entities
//!
//! The block and transaction types shared by every subsystem, together with
//! the two canonical digests consensus is built on.
//!
//! ## Digest rules
//!
//! - Amounts enter every digest as the little-endian IEEE-754 bit pattern of
//!   the `f64` (`amount_bits`), never as a rounded integer.
//! - All integers are hashed little-endian fixed-width, with no framing.
//! - `Block::hash_without_proof` is the VDF input and is stable under any
//!   change to `proof`; `Block::hash` commits to the proof and is the block's
//!   identity.

use serde::{Deserialize, Serialize};
use serde_with::{serde_as, Bytes};
use sha2::{Digest, Sha256};

/// A 32-byte SHA-256 digest.
pub type Hash = [u8; 32];

/// A 32-byte account address: SHA-256 of the raw 64-byte public key.
pub type Address = [u8; 32];

/// A raw ECDSA P-256 signature, `r ‖ s`, each half padded to 32 bytes.
pub type SignatureBytes = [u8; 64];

/// A raw P-256 public key, `X ‖ Y`, each coordinate padded to 32 bytes.
pub type PublicKeyBytes = [u8; 64];

/// Serialized VDF output length: `y ‖ π`, 258 bytes each.
pub const PROOF_LEN: usize = 516;

/// The all-zero address used by self-transactions that only fill a slot.
pub const ZERO_ADDRESS: Address = [0u8; 32];

/// Serialized VDF output carried inside a block.
#[serde_as]
#[derive(Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VdfProof(#[serde_as(as = "Bytes")] pub [u8; PROOF_LEN]);

impl VdfProof {
    /// The all-zero proof; never valid on a non-genesis block.
    pub fn zero() -> Self {
        Self([0u8; PROOF_LEN])
    }

    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|b| *b == 0)
    }

    pub fn as_bytes(&self) -> &[u8; PROOF_LEN] {
        &self.0
    }
}

impl Default for VdfProof {
    fn default() -> Self {
        Self::zero()
    }
}

impl std::fmt::Debug for VdfProof {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "VdfProof({}..)", hex::encode(&self.0[..8]))
    }
}

/// Returns the digest form of an amount: the little-endian bytes of the
/// `f64` bit pattern.
#[inline]
pub fn amount_bits(amount: f64) -> [u8; 8] {
    amount.to_bits().to_le_bytes()
}

/// A single value transfer, bound to the block height it is intended for.
#[serde_as]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// Sender address.
    pub from: Address,
    /// Receiver address.
    pub to: Address,
    /// Transferred amount.
    pub amount: f64,
    /// The block height this transaction is valid at. Must equal the height
    /// of the block that carries it.
    pub height: u64,
    /// ECDSA signature over `sighash()`.
    #[serde_as(as = "Bytes")]
    pub signature: SignatureBytes,
    /// The sender's raw public key.
    #[serde_as(as = "Bytes")]
    pub public_key: PublicKeyBytes,
}

impl Transaction {
    /// An unsigned transaction; signature and key are filled in by the
    /// signing facade.
    pub fn new(from: Address, to: Address, amount: f64, height: u64) -> Self {
        Self {
            from,
            to,
            amount,
            height,
            signature: [0u8; 64],
            public_key: [0u8; 64],
        }
    }

    /// The bytes covered by the transaction signature:
    /// `from ‖ to ‖ amount_bits ‖ height`.
    pub fn signing_bytes(&self) -> [u8; 80] {
        let mut buf = [0u8; 80];
        buf[..32].copy_from_slice(&self.from);
        buf[32..64].copy_from_slice(&self.to);
        buf[64..72].copy_from_slice(&amount_bits(self.amount));
        buf[72..80].copy_from_slice(&self.height.to_le_bytes());
        buf
    }

    /// Pre-signature digest: `SHA-256(signing_bytes)`.
    pub fn sighash(&self) -> Hash {
        Sha256::digest(self.signing_bytes()).into()
    }

    /// Full digest including signature and public key; this is the form the
    /// block digests commit to.
    pub fn hash(&self) -> Hash {
        let mut hasher = Sha256::new();
        hasher.update(self.signing_bytes());
        hasher.update(self.signature);
        hasher.update(self.public_key);
        hasher.finalize().into()
    }

    /// True for the slot-filling transactions the miner emits when the pool
    /// has nothing for a height.
    pub fn is_empty_transfer(&self) -> bool {
        self.amount == 0.0 && self.from == ZERO_ADDRESS && self.to == ZERO_ADDRESS
    }
}

/// One block of the chain. Exactly one transaction per block.
#[serde_as]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Block {
    /// Hash of the parent block (its full, proof-inclusive digest).
    pub prev_hash: Hash,
    /// Height in the chain; genesis is 0.
    pub height: u64,
    /// Epoch anchor. Fixed to the genesis hash until epoch transitions land.
    pub epoch_begin_hash: Hash,
    /// The block's transaction.
    pub txn: Transaction,
    /// Miner's ECDSA signature over the difficulty seed for this slot.
    #[serde_as(as = "Bytes")]
    pub signature: SignatureBytes,
    /// Miner's raw public key.
    #[serde_as(as = "Bytes")]
    pub public_key: PublicKeyBytes,
    /// VDF output over `hash_without_proof()`.
    pub proof: VdfProof,
}

impl Block {
    fn digest_common(&self, hasher: &mut Sha256) {
        hasher.update(self.prev_hash);
        hasher.update(self.height.to_le_bytes());
        hasher.update(self.epoch_begin_hash);
        hasher.update(self.txn.hash());
        hasher.update(amount_bits(self.txn.amount));
        hasher.update(self.signature);
        hasher.update(self.public_key);
    }

    /// Digest of everything but the proof. This is the VDF input, so it must
    /// be computable before mining starts.
    pub fn hash_without_proof(&self) -> Hash {
        let mut hasher = Sha256::new();
        self.digest_common(&mut hasher);
        hasher.finalize().into()
    }

    /// The block's identity: `hash_without_proof` material plus the proof.
    pub fn hash(&self) -> Hash {
        let mut hasher = Sha256::new();
        self.digest_common(&mut hasher);
        hasher.update(self.proof.0);
        hasher.finalize().into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_txn() -> Transaction {
        let mut txn = Transaction::new([1u8; 32], [2u8; 32], 42.5, 7);
        txn.signature = [3u8; 64];
        txn.public_key = [4u8; 64];
        txn
    }

    fn sample_block() -> Block {
        Block {
            prev_hash: [9u8; 32],
            height: 8,
            epoch_begin_hash: [10u8; 32],
            txn: sample_txn(),
            signature: [11u8; 64],
            public_key: [12u8; 64],
            proof: VdfProof([13u8; PROOF_LEN]),
        }
    }

    #[test]
    fn amount_enters_digest_as_bit_pattern() {
        let a = Transaction::new([0u8; 32], [0u8; 32], 1.0, 0);
        let b = Transaction::new([0u8; 32], [0u8; 32], 1.0 + f64::EPSILON, 0);
        assert_ne!(a.sighash(), b.sighash());
        assert_eq!(amount_bits(1.0), 1.0f64.to_bits().to_le_bytes());
    }

    #[test]
    fn sighash_ignores_signature_fields() {
        let mut txn = sample_txn();
        let before = txn.sighash();
        txn.signature = [0xFF; 64];
        txn.public_key = [0xEE; 64];
        assert_eq!(txn.sighash(), before);
        // ...but the full hash commits to them.
        assert_ne!(txn.hash(), sample_txn().hash());
    }

    #[test]
    fn hash_without_proof_is_stable_under_proof_changes() {
        let mut block = sample_block();
        let without = block.hash_without_proof();
        let with = block.hash();

        block.proof = VdfProof([99u8; PROOF_LEN]);
        assert_eq!(block.hash_without_proof(), without);
        assert_ne!(block.hash(), with);
    }

    #[test]
    fn block_digest_layout() {
        // Reference recomputation: the identity digest is SHA-256 over
        // prev ‖ height_le ‖ epoch ‖ txn_hash ‖ amount_bits ‖ sig ‖ pk ‖ proof.
        let block = sample_block();
        let mut buf = Vec::new();
        buf.extend_from_slice(&block.prev_hash);
        buf.extend_from_slice(&block.height.to_le_bytes());
        buf.extend_from_slice(&block.epoch_begin_hash);
        buf.extend_from_slice(&block.txn.hash());
        buf.extend_from_slice(&amount_bits(block.txn.amount));
        buf.extend_from_slice(&block.signature);
        buf.extend_from_slice(&block.public_key);
        buf.extend_from_slice(block.proof.as_bytes());
        let expected: Hash = Sha256::digest(&buf).into();
        assert_eq!(block.hash(), expected);
    }

    #[test]
    fn json_round_trip_preserves_identity() {
        // The wire protocol ships blocks as JSON bodies; the serde path
        // must agree with the in-memory value exactly.
        let block = sample_block();
        let json = serde_json::to_string(&block).unwrap();
        let decoded: Block = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded, block);
        assert_eq!(decoded.hash(), block.hash());
    }

    #[test]
    fn zero_proof_detection() {
        assert!(VdfProof::zero().is_zero());
        let mut proof = VdfProof::zero();
        proof.0[515] = 1;
        assert!(!proof.is_zero());
    }
}
