//! Runtime classification against compiled tries.

use std::fs;
use std::net::IpAddr;
use std::path::Path;
use tracing::debug;

use cloudfinder_core::{AddressFamily, CoreError, NetworkBlock, PrefixTrie, Provider};

use crate::build::{V4_BLOB, V6_BLOB};
use crate::error::{Error, Result};

/// Answers `address -> provider` from one IPv4 and one IPv6 trie.
///
/// Both tries are fully loaded at construction and never change, so a
/// resolver can be shared across threads (e.g. behind an `Arc`) and
/// queried without locking.
#[derive(Debug, Clone)]
pub struct Resolver {
    v4: PrefixTrie,
    v6: PrefixTrie,
}

impl Resolver {
    /// Wrap already built tries
    pub fn from_tries(v4: PrefixTrie, v6: PrefixTrie) -> Result<Self> {
        for (trie, expected) in [(&v4, AddressFamily::V4), (&v6, AddressFamily::V6)] {
            if trie.family() != expected {
                return Err(CoreError::FamilyMismatch {
                    trie: expected,
                    block: trie.family(),
                }
                .into());
            }
        }
        Ok(Self { v4, v6 })
    }

    /// Decode both blobs; any decoding error fails the whole load
    pub fn from_blobs(v4: &[u8], v6: &[u8]) -> Result<Self> {
        let v4 = PrefixTrie::from_bytes(v4, AddressFamily::V4)?;
        let v6 = PrefixTrie::from_bytes(v6, AddressFamily::V6)?;
        debug!(v4_blocks = v4.len(), v6_blocks = v6.len(), "resolver loaded");
        Self::from_tries(v4, v6)
    }

    /// Load `ipv4.bin` and `ipv6.bin` from a data directory
    pub fn load(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        let read = |name: &str| {
            let path = dir.join(name);
            fs::read(&path).map_err(|e| Error::io(path, e))
        };
        Self::from_blobs(&read(V4_BLOB)?, &read(V6_BLOB)?)
    }

    /// Provider owning `addr`, [`Provider::Unknown`] when none does.
    ///
    /// IPv4-mapped IPv6 addresses are looked up as IPv4.
    #[must_use]
    pub fn classify(&self, addr: IpAddr) -> Provider {
        self.lookup(addr)
            .map_or(Provider::Unknown, |block| block.provider())
    }

    /// Block containing `addr`, if any
    #[must_use]
    pub fn lookup(&self, addr: IpAddr) -> Option<NetworkBlock> {
        match addr.to_canonical() {
            addr @ IpAddr::V4(_) => self.v4.lookup(addr),
            addr @ IpAddr::V6(_) => self.v6.lookup(addr),
        }
    }

    /// The IPv4 trie
    #[must_use]
    pub const fn v4(&self) -> &PrefixTrie {
        &self.v4
    }

    /// The IPv6 trie
    #[must_use]
    pub const fn v6(&self) -> &PrefixTrie {
        &self.v6
    }

    /// Total number of blocks
    #[must_use]
    pub const fn len(&self) -> usize {
        self.v4.len() + self.v6.len()
    }

    /// Returns true if both tries are empty
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn block(cidr: &str, provider: Provider) -> NetworkBlock {
        NetworkBlock::parse(cidr, provider).unwrap()
    }

    fn resolver() -> Resolver {
        let mut v4 = PrefixTrie::v4();
        v4.insert_all([
            block("8.0.0.0/8", Provider::Gcp),
            block("13.64.0.0/11", Provider::Azure),
        ])
        .unwrap();
        let mut v6 = PrefixTrie::v6();
        v6.insert(block("2600:1f00::/24", Provider::Aws)).unwrap();
        Resolver::from_tries(v4, v6).unwrap()
    }

    #[test]
    fn test_classify() {
        let resolver = resolver();
        assert_eq!(resolver.classify("8.8.4.5".parse().unwrap()), Provider::Gcp);
        assert_eq!(resolver.classify("13.70.1.1".parse().unwrap()), Provider::Azure);
        assert_eq!(resolver.classify("2600:1f00::1".parse().unwrap()), Provider::Aws);
        assert_eq!(resolver.classify("203.0.113.1".parse().unwrap()), Provider::Unknown);
        assert_eq!(resolver.classify("2001:db8::1".parse().unwrap()), Provider::Unknown);
        assert_eq!(resolver.len(), 3);
    }

    #[test]
    fn test_mapped_addresses_use_v4_trie() {
        let resolver = resolver();
        assert_eq!(resolver.classify("::ffff:8.8.8.8".parse().unwrap()), Provider::Gcp);
        let hit = resolver.lookup("::ffff:13.64.0.1".parse().unwrap()).unwrap();
        assert_eq!(hit.network().to_string(), "13.64.0.0/11");
    }

    #[test]
    fn test_swapped_tries_rejected() {
        let err = Resolver::from_tries(PrefixTrie::v6(), PrefixTrie::v4()).unwrap_err();
        assert!(matches!(err, Error::Core(CoreError::FamilyMismatch { .. })));
    }

    #[test]
    fn test_blob_roundtrip() {
        let original = resolver();
        let loaded = Resolver::from_blobs(
            &original.v4().to_bytes().unwrap(),
            &original.v6().to_bytes().unwrap(),
        )
        .unwrap();
        assert_eq!(loaded.v4().enumerate(), original.v4().enumerate());
        assert_eq!(loaded.v6().enumerate(), original.v6().enumerate());
    }

    #[test]
    fn test_corrupt_blob_is_fatal() {
        let good = resolver().v6().to_bytes().unwrap();
        let err = Resolver::from_blobs(b"\xff\x00garbage", &good).unwrap_err();
        assert!(err.is_corrupt_blob());
    }

    #[test]
    fn test_wrong_family_blob_rejected() {
        let v4 = resolver().v4().to_bytes().unwrap();
        assert!(Resolver::from_blobs(&v4, &v4).is_err());
    }

    #[test]
    fn test_load_missing_dir() {
        let dir = tempfile::tempdir().unwrap();
        let err = Resolver::load(dir.path().join("nope")).unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
    }

    #[test]
    fn test_concurrent_classify() {
        let resolver = Arc::new(resolver());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let resolver = Arc::clone(&resolver);
                std::thread::spawn(move || {
                    let addr: IpAddr = format!("8.{i}.1.1").parse().unwrap();
                    resolver.classify(addr)
                })
            })
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap(), Provider::Gcp);
        }
    }
}
