//! Fixed-layout binary codec for blocks and transactions.
//!
//! This is the consensus-critical encoding used both in the persistent block
//! store and when shipping blocks between peers. Little-endian, fixed-width,
//! no framing; a block always encodes to exactly [`Block::ENCODED_LEN`]
//! bytes. It is deliberately hand-rolled rather than serde-derived so the
//! byte layout can never drift with a library upgrade.

use crate::entities::{amount_bits, Block, Transaction, VdfProof, PROOF_LEN};
use crate::errors::CodecError;

impl Transaction {
    /// Encoded size: `from ‖ to ‖ amount_bits ‖ height ‖ signature ‖ public_key`.
    pub const ENCODED_LEN: usize = 32 + 32 + 8 + 8 + 64 + 64;

    pub fn encode(&self) -> [u8; Self::ENCODED_LEN] {
        let mut buf = [0u8; Self::ENCODED_LEN];
        buf[..32].copy_from_slice(&self.from);
        buf[32..64].copy_from_slice(&self.to);
        buf[64..72].copy_from_slice(&amount_bits(self.amount));
        buf[72..80].copy_from_slice(&self.height.to_le_bytes());
        buf[80..144].copy_from_slice(&self.signature);
        buf[144..208].copy_from_slice(&self.public_key);
        buf
    }

    pub fn decode(data: &[u8]) -> Result<Self, CodecError> {
        if data.len() != Self::ENCODED_LEN {
            return Err(CodecError::Length {
                kind: "transaction",
                expected: Self::ENCODED_LEN,
                actual: data.len(),
            });
        }
        let mut txn = Transaction::new([0u8; 32], [0u8; 32], 0.0, 0);
        txn.from.copy_from_slice(&data[..32]);
        txn.to.copy_from_slice(&data[32..64]);
        txn.amount = f64::from_bits(u64::from_le_bytes(data[64..72].try_into().unwrap()));
        txn.height = u64::from_le_bytes(data[72..80].try_into().unwrap());
        txn.signature.copy_from_slice(&data[80..144]);
        txn.public_key.copy_from_slice(&data[144..208]);
        Ok(txn)
    }
}

impl Block {
    /// Encoded size: header fields, embedded transaction and proof.
    pub const ENCODED_LEN: usize = 32 + 8 + 32 + Transaction::ENCODED_LEN + 64 + 64 + PROOF_LEN;

    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(Self::ENCODED_LEN);
        buf.extend_from_slice(&self.prev_hash);
        buf.extend_from_slice(&self.height.to_le_bytes());
        buf.extend_from_slice(&self.epoch_begin_hash);
        buf.extend_from_slice(&self.txn.encode());
        buf.extend_from_slice(&self.signature);
        buf.extend_from_slice(&self.public_key);
        buf.extend_from_slice(&self.proof.0);
        buf
    }

    pub fn decode(data: &[u8]) -> Result<Self, CodecError> {
        if data.len() != Self::ENCODED_LEN {
            return Err(CodecError::Length {
                kind: "block",
                expected: Self::ENCODED_LEN,
                actual: data.len(),
            });
        }
        let mut prev_hash = [0u8; 32];
        prev_hash.copy_from_slice(&data[..32]);
        let height = u64::from_le_bytes(data[32..40].try_into().unwrap());
        let mut epoch_begin_hash = [0u8; 32];
        epoch_begin_hash.copy_from_slice(&data[40..72]);
        let txn = Transaction::decode(&data[72..72 + Transaction::ENCODED_LEN])?;

        let rest = &data[72 + Transaction::ENCODED_LEN..];
        let mut signature = [0u8; 64];
        signature.copy_from_slice(&rest[..64]);
        let mut public_key = [0u8; 64];
        public_key.copy_from_slice(&rest[64..128]);
        let mut proof = VdfProof::zero();
        proof.0.copy_from_slice(&rest[128..128 + PROOF_LEN]);

        Ok(Block {
            prev_hash,
            height,
            epoch_begin_hash,
            txn,
            signature,
            public_key,
            proof,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_block() -> Block {
        let mut txn = Transaction::new([1u8; 32], [2u8; 32], -17.25, 3);
        txn.signature = [5u8; 64];
        txn.public_key = [6u8; 64];
        Block {
            prev_hash: [7u8; 32],
            height: 3,
            epoch_begin_hash: [8u8; 32],
            txn,
            signature: [9u8; 64],
            public_key: [10u8; 64],
            proof: VdfProof([11u8; PROOF_LEN]),
        }
    }

    #[test]
    fn block_round_trip() {
        let block = sample_block();
        let bytes = block.encode();
        assert_eq!(bytes.len(), Block::ENCODED_LEN);
        let decoded = Block::decode(&bytes).unwrap();
        assert_eq!(decoded, block);
        assert_eq!(decoded.hash(), block.hash());
    }

    #[test]
    fn negative_and_nan_amounts_survive_the_codec() {
        let mut block = sample_block();
        block.txn.amount = f64::from_bits(0x7FF8_0000_0000_0001); // a NaN payload
        let decoded = Block::decode(&block.encode()).unwrap();
        assert_eq!(
            decoded.txn.amount.to_bits(),
            block.txn.amount.to_bits(),
            "codec must preserve the exact bit pattern"
        );
    }

    #[test]
    fn truncated_input_is_rejected() {
        let block = sample_block();
        let bytes = block.encode();
        let err = Block::decode(&bytes[..bytes.len() - 1]).unwrap_err();
        assert!(matches!(err, CodecError::Length { kind: "block", .. }));

        let err = Transaction::decode(&bytes[..10]).unwrap_err();
        assert!(matches!(err, CodecError::Length { kind: "transaction", .. }));
    }
}
