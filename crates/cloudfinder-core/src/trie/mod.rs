//! Binary prefix trie partitioning an address space into disjoint blocks.
//!
//! Nodes live in an arena and reference their children by index. A node
//! carrying a provider is a terminal: its bit-path is the base of an inserted
//! block and its depth is the prefix length. Terminals never nest, so a walk
//! along an address stops at the only block that can contain it.
//!
//! Overlaps are resolved by insertion order alone: a block is discarded when
//! its range intersects a block inserted earlier, whichever of the two is
//! wider. Insert widest-first (see [`crate::sort_candidates`]) to make the
//! widest block win.

mod codec;

pub use codec::BLOB_VERSION;

use std::net::IpAddr;

use ipnet::IpNet;
use tracing::debug;

use crate::error::{CoreError, Result};
use crate::types::{address_bits, address_from_bits, AddressFamily, NetworkBlock, Provider};

/// Index of the root node; never the child of another node, so `0` doubles
/// as the "no child" marker.
const ROOT: u32 = 0;
const NO_CHILD: u32 = 0;

#[derive(Debug, Clone, Copy, Default)]
struct Node {
    children: [u32; 2],
    terminal: Option<Provider>,
}

impl Node {
    const fn child(&self, bit: usize) -> Option<u32> {
        match self.children[bit] {
            NO_CHILD => None,
            idx => Some(idx),
        }
    }

    #[cfg(test)]
    const fn is_leaf(&self) -> bool {
        self.children[0] == NO_CHILD && self.children[1] == NO_CHILD
    }
}

/// Result of a single insertion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    /// The block now owns its range
    Inserted,
    /// The block overlapped this earlier block and was discarded
    Shadowed(NetworkBlock),
}

/// Counters for a batch insertion
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InsertStats {
    /// Blocks that became terminals
    pub inserted: usize,
    /// Blocks discarded because of an overlap
    pub shadowed: usize,
}

/// Address-family specific prefix trie
#[derive(Debug, Clone)]
pub struct PrefixTrie {
    family: AddressFamily,
    nodes: Vec<Node>,
    len: usize,
}

impl PrefixTrie {
    /// Create an empty trie for one family
    #[must_use]
    pub fn new(family: AddressFamily) -> Self {
        Self {
            family,
            nodes: vec![Node::default()],
            len: 0,
        }
    }

    /// Empty IPv4 trie
    #[must_use]
    pub fn v4() -> Self {
        Self::new(AddressFamily::V4)
    }

    /// Empty IPv6 trie
    #[must_use]
    pub fn v6() -> Self {
        Self::new(AddressFamily::V6)
    }

    /// Address family of the trie
    #[must_use]
    pub const fn family(&self) -> AddressFamily {
        self.family
    }

    /// Number of blocks stored
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Returns true if no block is stored
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Insert a block, keeping the first block seen over any range.
    ///
    /// Blocks of the other family and blocks attributed to
    /// [`Provider::Unknown`] are contract violations and return an error.
    pub fn insert(&mut self, block: NetworkBlock) -> Result<InsertOutcome> {
        if block.family() != self.family {
            return Err(CoreError::FamilyMismatch {
                trie: self.family,
                block: block.family(),
            });
        }
        if !block.provider().is_known() {
            return Err(CoreError::unattributed(block.network(), block.provider()));
        }

        let bits = address_bits(block.base());
        let mut node = ROOT;

        for depth in 0..block.prefix_len() {
            if let Some(existing) = self.terminal_block(node, bits, depth) {
                debug!(block = %block, existing = %existing, "skipping block inside existing range");
                return Ok(InsertOutcome::Shadowed(existing));
            }
            let bit = bit_at(bits, depth);
            node = match self.nodes[node as usize].child(bit) {
                Some(child) => child,
                None => {
                    let child = self.alloc()?;
                    self.nodes[node as usize].children[bit] = child;
                    child
                }
            };
        }

        if let Some(existing) = self.terminal_block(node, bits, block.prefix_len()) {
            debug!(block = %block, existing = %existing, "skipping duplicate range");
            return Ok(InsertOutcome::Shadowed(existing));
        }
        if let Some(narrower) = self.first_terminal_below(node, bits, block.prefix_len()) {
            debug!(block = %block, existing = %narrower, "skipping range covering an existing block");
            return Ok(InsertOutcome::Shadowed(narrower));
        }

        // Whatever hangs below is a partial path with no terminal.
        let target = &mut self.nodes[node as usize];
        target.children = [NO_CHILD; 2];
        target.terminal = Some(block.provider());
        self.len += 1;

        Ok(InsertOutcome::Inserted)
    }

    /// Insert blocks in iteration order. A block the trie rejects aborts
    /// the batch.
    pub fn insert_all<I>(&mut self, blocks: I) -> Result<InsertStats>
    where
        I: IntoIterator<Item = NetworkBlock>,
    {
        let mut stats = InsertStats::default();
        for block in blocks {
            match self.insert(block)? {
                InsertOutcome::Inserted => stats.inserted += 1,
                InsertOutcome::Shadowed(_) => stats.shadowed += 1,
            }
        }
        Ok(stats)
    }

    /// Find the block containing `addr`.
    ///
    /// Addresses of the other family never match.
    #[must_use]
    pub fn lookup(&self, addr: IpAddr) -> Option<NetworkBlock> {
        if AddressFamily::of(&addr) != self.family {
            return None;
        }

        let bits = address_bits(addr);
        let mut node = ROOT;
        let mut depth = 0u8;

        loop {
            if let Some(block) = self.terminal_block(node, bits, depth) {
                return Some(block);
            }
            if depth == self.family.width() {
                return None;
            }
            node = self.nodes[node as usize].child(bit_at(bits, depth))?;
            depth += 1;
        }
    }

    /// All stored blocks in ascending address order
    #[must_use]
    pub fn enumerate(&self) -> Vec<NetworkBlock> {
        let mut blocks = Vec::with_capacity(self.len);
        self.walk_from(ROOT, 0, 0, |block| {
            blocks.push(block);
            false
        });
        blocks
    }

    /// Iterate providers present in the trie with their block counts
    #[must_use]
    pub fn provider_counts(&self) -> Vec<(Provider, usize)> {
        let mut counts = [0usize; Provider::ALL.len()];
        for node in &self.nodes {
            if let Some(provider) = node.terminal {
                counts[usize::from(provider.id())] += 1;
            }
        }
        Provider::ALL
            .into_iter()
            .zip(counts)
            .filter(|(_, n)| *n > 0)
            .collect()
    }

    fn alloc(&mut self) -> Result<u32> {
        let idx = u32::try_from(self.nodes.len()).map_err(|_| CoreError::Capacity)?;
        self.nodes.push(Node::default());
        Ok(idx)
    }

    /// Terminal block of `node`, rebuilt from its path
    fn terminal_block(&self, node: u32, bits: u128, depth: u8) -> Option<NetworkBlock> {
        let provider = self.nodes[node as usize].terminal?;
        block_at(self.family, bits, depth, provider)
    }

    /// First terminal strictly below `node`
    fn first_terminal_below(&self, node: u32, bits: u128, depth: u8) -> Option<NetworkBlock> {
        let mut found = None;
        let start = &self.nodes[node as usize];
        for bit in 0..2 {
            if let Some(child) = start.child(bit) {
                let child_bits = with_bit(bits, depth, bit);
                self.walk_from(child, child_bits, depth + 1, |block| {
                    found = Some(block);
                    true
                });
            }
            if found.is_some() {
                break;
            }
        }
        found
    }

    /// Pre-order walk below `start` (0-branch first) calling `visit` on every
    /// terminal until it returns true.
    fn walk_from<F>(&self, start: u32, bits: u128, depth: u8, mut visit: F)
    where
        F: FnMut(NetworkBlock) -> bool,
    {
        let mut stack = vec![(start, bits, depth)];
        while let Some((idx, bits, depth)) = stack.pop() {
            let node = &self.nodes[idx as usize];
            if let Some(block) = node.terminal.and_then(|p| block_at(self.family, bits, depth, p)) {
                if visit(block) {
                    return;
                }
            }
            for bit in [1, 0] {
                if let Some(child) = node.child(bit) {
                    stack.push((child, with_bit(bits, depth, bit), depth + 1));
                }
            }
        }
    }
}

/// Bit `depth` of a left-aligned address
const fn bit_at(bits: u128, depth: u8) -> usize {
    ((bits >> (127 - depth as u32)) & 1) as usize
}

/// Set bit `depth` of a path to `bit`
const fn with_bit(bits: u128, depth: u8, bit: usize) -> u128 {
    let mask = 1u128 << (127 - depth as u32);
    if bit == 1 {
        bits | mask
    } else {
        bits & !mask
    }
}

/// Keep the first `depth` bits of a path
const fn mask_to(bits: u128, depth: u8) -> u128 {
    if depth == 0 {
        0
    } else {
        bits & (u128::MAX << (128 - depth as u32))
    }
}

fn block_at(family: AddressFamily, bits: u128, depth: u8, provider: Provider) -> Option<NetworkBlock> {
    let base = address_from_bits(family, mask_to(bits, depth));
    IpNet::new(base, depth)
        .ok()
        .map(|net| NetworkBlock::new(net, provider))
}
