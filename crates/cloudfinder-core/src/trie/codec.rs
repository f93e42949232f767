//! Persisted trie blobs.
//!
//! A blob is a CBOR document holding the node records of the trie in
//! pre-order: every record is followed by its zero-branch subtree, then its
//! one-branch subtree. Terminals only carry the prefix length and provider id;
//! the base address is the path leading to the record.

use serde::{Deserialize, Serialize};
use std::io::{Read, Write};

use super::{PrefixTrie, ROOT};
use crate::error::{CoreError, Result};
use crate::types::{AddressFamily, Provider};

/// Current blob format version
pub const BLOB_VERSION: u8 = 1;

const ZERO_CHILD: u8 = 0b01;
const ONE_CHILD: u8 = 0b10;

#[derive(Debug, Serialize, Deserialize)]
struct Blob {
    #[serde(rename = "v")]
    version: u8,
    #[serde(rename = "f")]
    family: u8,
    #[serde(rename = "n")]
    nodes: Vec<NodeRecord>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
struct NodeRecord {
    #[serde(rename = "c")]
    children: u8,
    #[serde(rename = "t", default, skip_serializing_if = "Option::is_none")]
    terminal: Option<TerminalRecord>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
struct TerminalRecord {
    #[serde(rename = "l")]
    prefix_len: u8,
    #[serde(rename = "p")]
    provider: u8,
}

impl PrefixTrie {
    /// Write the trie as a blob
    pub fn serialize<W: Write>(&self, writer: W) -> Result<()> {
        let blob = Blob {
            version: BLOB_VERSION,
            family: self.family.tag(),
            nodes: self.records(),
        };
        ciborium::into_writer(&blob, writer).map_err(|e| CoreError::Encode(e.to_string()))
    }

    /// Encode the trie into a byte vector
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        self.serialize(&mut out)?;
        Ok(out)
    }

    /// Read a trie blob of the expected family.
    ///
    /// The blob is fully validated; any inconsistency is an error and no
    /// partially decoded trie is ever returned.
    pub fn deserialize<R: Read>(reader: R, family: AddressFamily) -> Result<Self> {
        let blob: Blob =
            ciborium::from_reader(reader).map_err(|e| CoreError::Decode(e.to_string()))?;

        if blob.version != BLOB_VERSION {
            return Err(CoreError::Decode(format!(
                "unsupported blob version {} (expected {BLOB_VERSION})",
                blob.version
            )));
        }
        match AddressFamily::from_tag(blob.family) {
            Some(found) if found == family => {}
            Some(found) => {
                return Err(CoreError::Decode(format!(
                    "blob holds an {found} trie, expected {family}"
                )))
            }
            None => {
                return Err(CoreError::Decode(format!(
                    "invalid family tag {}",
                    blob.family
                )))
            }
        }

        let mut decoder = Decoder {
            records: &blob.nodes,
            cursor: 0,
            trie: Self::new(family),
        };
        decoder.decode_root()?;

        if decoder.cursor != blob.nodes.len() {
            return Err(CoreError::Decode(format!(
                "{} trailing node records",
                blob.nodes.len() - decoder.cursor
            )));
        }
        Ok(decoder.trie)
    }

    /// Decode a blob held in memory
    pub fn from_bytes(bytes: &[u8], family: AddressFamily) -> Result<Self> {
        Self::deserialize(bytes, family)
    }

    /// Node records in pre-order, reachable nodes only
    fn records(&self) -> Vec<NodeRecord> {
        let mut records = Vec::with_capacity(self.nodes.len());
        let mut stack = vec![(ROOT, 0u8)];

        while let Some((idx, depth)) = stack.pop() {
            let node = &self.nodes[idx as usize];
            let mut children = 0;
            if node.child(0).is_some() {
                children |= ZERO_CHILD;
            }
            if node.child(1).is_some() {
                children |= ONE_CHILD;
            }
            records.push(NodeRecord {
                children,
                terminal: node.terminal.map(|provider| TerminalRecord {
                    prefix_len: depth,
                    provider: provider.id(),
                }),
            });
            for bit in [1, 0] {
                if let Some(child) = node.child(bit) {
                    stack.push((child, depth + 1));
                }
            }
        }

        records
    }
}

struct Decoder<'a> {
    records: &'a [NodeRecord],
    cursor: usize,
    trie: PrefixTrie,
}

impl Decoder<'_> {
    fn decode_root(&mut self) -> Result<()> {
        let record = self.next_record()?;
        self.check_record(&record, 0)?;
        self.fill(ROOT, &record, 0)
    }

    /// Decode the record at the cursor as a child at `depth` and return its
    /// node index. Recursion depth is bounded by the family width.
    fn decode_node(&mut self, depth: u8) -> Result<u32> {
        let record = self.next_record()?;
        self.check_record(&record, depth)?;

        let idx = self.trie.alloc()?;
        self.fill(idx, &record, depth)?;
        Ok(idx)
    }

    fn fill(&mut self, idx: u32, record: &NodeRecord, depth: u8) -> Result<()> {
        if let Some(terminal) = record.terminal {
            self.trie.nodes[idx as usize].terminal = Some(Provider::try_from(terminal.provider)?);
            self.trie.len += 1;
        }

        for (bit, flag) in [(0usize, ZERO_CHILD), (1usize, ONE_CHILD)] {
            if record.children & flag != 0 {
                let child = self.decode_node(depth + 1)?;
                self.trie.nodes[idx as usize].children[bit] = child;
            }
        }

        Ok(())
    }

    fn next_record(&mut self) -> Result<NodeRecord> {
        let record = self
            .records
            .get(self.cursor)
            .copied()
            .ok_or_else(|| CoreError::Decode("truncated node records".to_string()))?;
        self.cursor += 1;
        Ok(record)
    }

    fn check_record(&self, record: &NodeRecord, depth: u8) -> Result<()> {
        let width = self.trie.family.width();

        if record.children & !(ZERO_CHILD | ONE_CHILD) != 0 {
            return Err(CoreError::Decode(format!(
                "invalid children mask {:#04b} at record {}",
                record.children, self.cursor
            )));
        }
        if depth == width && record.children != 0 {
            return Err(CoreError::Decode(format!(
                "node deeper than {width} bits at record {}",
                self.cursor
            )));
        }

        if let Some(terminal) = record.terminal {
            if terminal.prefix_len != depth {
                return Err(CoreError::Decode(format!(
                    "terminal /{} stored at depth {depth}",
                    terminal.prefix_len
                )));
            }
            if record.children != 0 {
                return Err(CoreError::Decode(format!(
                    "terminal at depth {depth} has children"
                )));
            }
            if !Provider::try_from(terminal.provider)?.is_known() {
                return Err(CoreError::Decode(format!(
                    "terminal at depth {depth} attributed to {}",
                    Provider::Unknown
                )));
            }
        }

        Ok(())
    }
}
