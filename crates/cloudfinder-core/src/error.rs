use thiserror::Error;

use crate::types::{AddressFamily, Provider};

/// Result type alias for core operations
pub type Result<T> = std::result::Result<T, CoreError>;

/// Errors raised while building, encoding or decoding lookup structures
#[derive(Error, Debug)]
pub enum CoreError {
    /// A network notation could not be parsed
    #[error("invalid network notation: {0}")]
    InvalidCidr(String),

    /// A block was handed to a trie of the other address family
    #[error("family mismatch: {block} block inserted into {trie} trie")]
    FamilyMismatch {
        /// Family of the trie
        trie: AddressFamily,
        /// Family of the rejected block
        block: AddressFamily,
    },

    /// A block carrying no real provider attribution
    #[error("block {0} is not attributed to a provider")]
    Unattributed(String),

    /// Numeric provider id that maps to no provider
    #[error("unknown provider id {0}")]
    UnknownProviderId(u8),

    /// Provider name that maps to no provider
    #[error("unknown provider name: {0}")]
    UnknownProviderName(String),

    /// Trie blob could not be written
    #[error("blob encoding failed: {0}")]
    Encode(String),

    /// Trie blob is corrupt, truncated or inconsistent
    #[error("blob decoding failed: {0}")]
    Decode(String),

    /// The node arena ran out of handles
    #[error("prefix trie node arena exhausted")]
    Capacity,
}

impl CoreError {
    /// Returns true if the error points at a corrupt persisted blob
    #[must_use]
    pub const fn is_corrupt_blob(&self) -> bool {
        matches!(self, Self::Decode(_) | Self::UnknownProviderId(_))
    }

    pub(crate) fn unattributed(block: impl std::fmt::Display, provider: Provider) -> Self {
        Self::Unattributed(format!("{block} ({provider})"))
    }
}
