//! # Canonical Chain Array
//!
//! The in-memory `my_chain` bookkeeping: an ordered array of
//! `(hash, prev_hash)` links from genesis to the tip, indexed by height.
//! Owned exclusively by the tip manager; everyone else sees the tip through
//! the watch channel or reads blocks from the store.

use crate::domain::errors::ConsensusError;
use shared_types::{genesis_hash, Hash};
use tc_block_storage::ChainStore;

/// One entry of the chain array.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChainLink {
    pub hash: Hash,
    pub prev_hash: Hash,
}

/// The canonical chain from genesis to tip. `len() == tip height + 1`.
#[derive(Debug, Clone)]
pub struct ChainState {
    links: Vec<ChainLink>,
}

impl ChainState {
    /// A fresh chain holding only genesis.
    pub fn genesis() -> Self {
        Self {
            links: vec![ChainLink {
                hash: genesis_hash(),
                prev_hash: [0u8; 32],
            }],
        }
    }

    /// Rebuild the array from a bootstrapped store by walking the tip's
    /// `prev_hash` links back to genesis.
    pub fn restore(store: &ChainStore) -> Result<Self, ConsensusError> {
        let tip_hash = store.get_tip_hash()?;
        let mut reversed = Vec::new();
        let mut cursor = tip_hash;
        let mut expected_height: Option<u64> = None;

        loop {
            let block = store.get_block(&cursor)?.ok_or_else(|| {
                ConsensusError::CorruptChain(format!(
                    "chain walk hit a missing block {}",
                    hex_prefix(&cursor)
                ))
            })?;
            if let Some(expected) = expected_height {
                if block.height != expected {
                    return Err(ConsensusError::CorruptChain(
                        "non-contiguous heights in chain walk".into(),
                    ));
                }
            }
            reversed.push(ChainLink {
                hash: cursor,
                prev_hash: block.prev_hash,
            });
            if block.height == 0 {
                if cursor != genesis_hash() {
                    return Err(ConsensusError::CorruptChain(
                        "chain walk terminated at a foreign genesis".into(),
                    ));
                }
                break;
            }
            expected_height = Some(block.height - 1);
            cursor = block.prev_hash;
        }

        reversed.reverse();
        Ok(Self { links: reversed })
    }

    pub fn tip(&self) -> &ChainLink {
        // The array always holds at least genesis.
        self.links.last().expect("chain array never empty")
    }

    /// Height of the tip; equals `len() - 1`.
    pub fn tip_height(&self) -> u64 {
        (self.links.len() - 1) as u64
    }

    /// Number of links, genesis included; never zero.
    pub fn len(&self) -> usize {
        self.links.len()
    }

    /// Link at a given height, if the chain reaches it.
    pub fn link_at(&self, height: u64) -> Option<&ChainLink> {
        self.links.get(height as usize)
    }

    pub fn push(&mut self, link: ChainLink) {
        self.links.push(link);
    }

    /// Drop everything above `len - 1`; used by the reorg path.
    pub fn truncate(&mut self, len: usize) {
        debug_assert!(len >= 1, "genesis is never truncated away");
        self.links.truncate(len);
    }

    /// Check the linkage invariant; used by tests and the restore path.
    pub fn is_well_linked(&self) -> bool {
        self.links[0].hash == genesis_hash()
            && self
                .links
                .windows(2)
                .all(|pair| pair[1].prev_hash == pair[0].hash)
    }
}

fn hex_prefix(hash: &Hash) -> String {
    hash[..4].iter().map(|b| format!("{b:02x}")).collect()
}
