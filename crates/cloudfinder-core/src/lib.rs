//! Core types and lookup structures for cloud provider classification.
//!
//! This crate provides the pieces every other cloudfinder crate builds on:
//!
//! - **Types**: [`Provider`], [`AddressFamily`] and [`NetworkBlock`]
//! - **Candidates**: ordering and reduction of raw block lists
//! - **Trie**: the [`PrefixTrie`] partition and its persisted blob format
//! - **Errors**: [`CoreError`] and the [`Result`] alias
//!
//! # Example
//!
//! ```rust
//! use cloudfinder_core::{prepare_candidates, AddressFamily, NetworkBlock, PrefixTrie, Provider};
//!
//! let blocks = prepare_candidates(vec![
//!     NetworkBlock::parse("8.8.4.0/24", Provider::Gcp).unwrap(),
//!     NetworkBlock::parse("8.0.0.0/8", Provider::Aws).unwrap(),
//! ]);
//!
//! let mut trie = PrefixTrie::new(AddressFamily::V4);
//! trie.insert_all(blocks).unwrap();
//!
//! let hit = trie.lookup("8.8.4.5".parse().unwrap()).unwrap();
//! assert_eq!(hit.provider(), Provider::Aws);
//! ```

mod candidates;
mod error;
mod trie;
pub mod types;

pub use candidates::{
    candidate_order, dedup_candidates, prepare_candidates, reduce_source_blocks, sort_candidates,
};
pub use error::{CoreError, Result};
pub use trie::{InsertOutcome, InsertStats, PrefixTrie, BLOB_VERSION};
pub use types::*;
