//! Candidate list ordering and reduction.
//!
//! The trie keeps the first block inserted over any overlapping range, so the
//! order of the candidate list decides attribution. [`sort_candidates`] fixes
//! that order: widest prefix first, then v4 before v6, then base address,
//! then provider id. Identical networks claimed by two providers therefore go
//! to the provider with the lower id.

use std::cmp::Ordering;
use std::collections::HashSet;

use crate::trie::{InsertOutcome, PrefixTrie};
use crate::types::{address_bits, AddressFamily, NetworkBlock};

/// Total order used before trie insertion
#[must_use]
pub fn candidate_order(a: &NetworkBlock, b: &NetworkBlock) -> Ordering {
    a.prefix_len()
        .cmp(&b.prefix_len())
        .then_with(|| a.family().cmp(&b.family()))
        .then_with(|| address_bits(a.base()).cmp(&address_bits(b.base())))
        .then_with(|| a.provider().id().cmp(&b.provider().id()))
}

/// Sort blocks widest first (see module docs)
pub fn sort_candidates(blocks: &mut [NetworkBlock]) {
    blocks.sort_by(candidate_order);
}

/// Drop blocks whose dedup key was already seen, keeping the first occurrence
#[must_use]
pub fn dedup_candidates(blocks: Vec<NetworkBlock>) -> Vec<NetworkBlock> {
    let mut seen = HashSet::with_capacity(blocks.len());
    blocks
        .into_iter()
        .filter(|block| seen.insert(block.key()))
        .collect()
}

/// Deduplicate then sort: the canonical candidate list
#[must_use]
pub fn prepare_candidates(blocks: Vec<NetworkBlock>) -> Vec<NetworkBlock> {
    let mut blocks = dedup_candidates(blocks);
    sort_candidates(&mut blocks);
    blocks
}

/// Reduce the output of a single source: duplicates collapse and blocks
/// covered by a wider block of the same source are dropped.
///
/// Blocks are expected to carry one provider; the result is sorted.
#[must_use]
pub fn reduce_source_blocks(blocks: Vec<NetworkBlock>) -> Vec<NetworkBlock> {
    let mut blocks = blocks;
    sort_candidates(&mut blocks);

    let mut v4 = PrefixTrie::new(AddressFamily::V4);
    let mut v6 = PrefixTrie::new(AddressFamily::V6);
    let mut kept = Vec::with_capacity(blocks.len());

    for block in blocks {
        let trie = match block.family() {
            AddressFamily::V4 => &mut v4,
            AddressFamily::V6 => &mut v6,
        };
        // Unattributed blocks are rejected by the trie and dropped here.
        if let Ok(InsertOutcome::Inserted) = trie.insert(block) {
            kept.push(block);
        }
    }

    kept
}
