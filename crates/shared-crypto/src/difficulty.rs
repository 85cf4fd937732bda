//! # Stake-Weighted VDF Difficulty
//!
//! Maps a miner's slot signature to a VDF iteration count, biased inversely
//! by stake.
//!
//! ## How the sampling works
//!
//! The signature is the miner's only source of per-slot randomness: it is
//! required later to verify the block, so publishing a block commits the
//! miner to the sample, and re-rolling means publishing a different block.
//! Hashing the signature gives a uniform `u ∈ (0, 1]`; `ln(u) / ln(1 − p)`
//! with `p = stake_mine / (stake_sum · base)` is an inverse-exponential
//! sample whose mean shrinks as stake grows, which approximates exponential
//! inter-arrival times across the network.
//!
//! A cap of `base · 10 · stake_sum / stake_mine` keeps one unlucky draw from
//! locking a miner out of the slot entirely, and a floor of 100 iterations
//! bounds verification cost from below.

use shared_types::{Address, Hash};
use sha2::{Digest, Sha256};
use std::collections::HashMap;

/// Iteration floor added to every sample.
pub const DIFFICULTY_FLOOR: u64 = 100;

/// Deterministic per-slot seed: `SHA-256(epoch_hash ‖ height_be)`.
///
/// The height is big-endian here, unlike in the block digests; the seed
/// preimage is part of the protocol identity.
pub fn difficulty_seed(epoch_hash: &Hash, height: u64) -> Hash {
    let mut hasher = Sha256::new();
    hasher.update(epoch_hash);
    hasher.update(height.to_be_bytes());
    hasher.finalize().into()
}

/// Sample the VDF iteration count for a slot signature.
///
/// Requires `0 < stake_mine` and `stake_mine < stake_sum * base_difficulty`;
/// callers gate on stake before sampling.
pub fn difficulty(
    signature: &[u8],
    stake_sum: f64,
    stake_mine: f64,
    base_difficulty: u64,
) -> u64 {
    let digest = Sha256::digest(signature);
    let value = u64::from_be_bytes(digest[..8].try_into().expect("digest is 32 bytes"));

    let uniform = value as f64 / u64::MAX as f64;
    let rm = uniform.ln();
    let t = (1.0 - stake_mine / (stake_sum * base_difficulty as f64)).ln();

    let mut diff = (rm / t) as u64;

    let max_diff = (base_difficulty as f64 * (10.0 * stake_sum / stake_mine)) as u64;
    if diff > max_diff {
        diff = max_diff;
    }

    DIFFICULTY_FLOOR + diff
}

/// The static stake table the chain is configured with.
///
/// Read-only for the lifetime of the process; a future slashing path would
/// swap it between blocks.
#[derive(Debug, Clone, Default)]
pub struct StakeTable {
    stakes: HashMap<Address, f64>,
    stake_sum: f64,
}

impl StakeTable {
    pub fn new(stakes: HashMap<Address, f64>, stake_sum: f64) -> Self {
        Self { stakes, stake_sum }
    }

    /// Stake weight of an address; unknown addresses weigh nothing.
    pub fn stake_of(&self, address: &Address) -> f64 {
        self.stakes.get(address).copied().unwrap_or(0.0)
    }

    /// Total network stake (configured, not summed, so light nodes can run
    /// with a partial table).
    pub fn sum(&self) -> f64 {
        self.stake_sum
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seed_is_pure_and_height_sensitive() {
        let epoch = [7u8; 32];
        assert_eq!(difficulty_seed(&epoch, 5), difficulty_seed(&epoch, 5));
        assert_ne!(difficulty_seed(&epoch, 5), difficulty_seed(&epoch, 6));
        assert_ne!(difficulty_seed(&[8u8; 32], 5), difficulty_seed(&epoch, 5));
    }

    #[test]
    fn seed_hashes_height_big_endian() {
        let epoch = [0u8; 32];
        let mut preimage = [0u8; 40];
        preimage[32..].copy_from_slice(&5u64.to_be_bytes());
        let expected: Hash = Sha256::digest(preimage).into();
        assert_eq!(difficulty_seed(&epoch, 5), expected);
    }

    #[test]
    fn difficulty_is_pure_and_floored() {
        let sig = [0x5Au8; 64];
        let a = difficulty(&sig, 100.0, 10.0, 1000);
        let b = difficulty(&sig, 100.0, 10.0, 1000);
        assert_eq!(a, b);
        assert!(a >= DIFFICULTY_FLOOR);
    }

    #[test]
    fn difficulty_respects_the_cap() {
        // Every sample must fall within [floor, floor + base*10*sum/mine].
        for i in 0u8..=63 {
            let sig = [i; 64];
            let d = difficulty(&sig, 100.0, 10.0, 1);
            let cap = (1.0f64 * 10.0 * 100.0 / 10.0) as u64;
            assert!(d <= DIFFICULTY_FLOOR + cap, "sample {d} above cap {cap}");
        }
    }

    #[test]
    fn larger_stake_means_smaller_average_difficulty() {
        // Deterministic sample set: the same 64 signatures drawn with a
        // small and a large stake share. The large share must win on mean.
        let mean = |stake: f64| -> f64 {
            (0u8..64)
                .map(|i| difficulty(&[i.wrapping_mul(37).wrapping_add(1); 64], 100.0, stake, 1000) as f64)
                .sum::<f64>()
                / 64.0
        };
        assert!(mean(90.0) < mean(5.0));
    }

    #[test]
    fn stake_table_defaults_unknown_addresses_to_zero() {
        let mut stakes = HashMap::new();
        stakes.insert([1u8; 32], 25.0);
        let table = StakeTable::new(stakes, 100.0);

        assert_eq!(table.stake_of(&[1u8; 32]), 25.0);
        assert_eq!(table.stake_of(&[2u8; 32]), 0.0);
        assert_eq!(table.sum(), 100.0);
    }
}
