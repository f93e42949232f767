//! Build driver: candidate list in, persisted artifacts out.
//!
//! A build writes three files into the data directory: `ipv4.bin` and
//! `ipv6.bin` (the trie blobs) and `hash.txt`, the SHA-256 of the candidate
//! list they were compiled from. When the candidate list hashes to the
//! stored value the build is skipped.

use ring::digest::{Context, SHA256};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use cloudfinder_core::{prepare_candidates, AddressFamily, InsertStats, NetworkBlock, PrefixTrie, Provider};
use cloudfinder_sources::Aggregator;

use crate::error::{Error, Result};

/// IPv4 trie blob file name
pub const V4_BLOB: &str = "ipv4.bin";
/// IPv6 trie blob file name
pub const V6_BLOB: &str = "ipv6.bin";
/// Content hash file name
pub const HASH_FILE: &str = "hash.txt";

/// Tries compiled from one candidate list
#[derive(Debug, Clone)]
pub struct Compiled {
    /// IPv4 trie
    pub v4: PrefixTrie,
    /// IPv6 trie
    pub v6: PrefixTrie,
    /// Insertion counters over both families
    pub stats: InsertStats,
    /// Content hash of the candidate list
    pub hash: String,
}

/// Options of a full build
#[derive(Debug, Clone)]
pub struct BuildOptions {
    /// Directory receiving the blobs and the hash file
    pub data_dir: PathBuf,
    /// Rebuild even if the candidate hash is unchanged
    pub force: bool,
    /// Also export one range file per provider into this directory
    pub ranges_dir: Option<PathBuf>,
}

impl BuildOptions {
    /// Build into `data_dir` with no range export
    #[must_use]
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            force: false,
            ranges_dir: None,
        }
    }

    /// Rebuild even when nothing changed
    #[must_use]
    pub const fn force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    /// Export per-provider range files into `dir`
    #[must_use]
    pub fn ranges_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.ranges_dir = Some(dir.into());
        self
    }
}

/// What a build did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildOutcome {
    /// Artifacts were (re)written
    Written {
        /// Insertion counters
        stats: InsertStats,
        /// Number of range files exported
        range_files: usize,
    },
    /// The stored hash matched, nothing was written
    Unchanged,
}

/// Summary of a build
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildReport {
    /// Content hash of the candidate list
    pub hash: String,
    /// Size of the deduplicated candidate list
    pub candidates: usize,
    /// What happened
    pub outcome: BuildOutcome,
}

/// Collect every source, then build from the result
pub async fn run(aggregator: &Aggregator, options: &BuildOptions) -> Result<BuildReport> {
    let candidates = aggregator.collect().await?;
    build_from_candidates(candidates, options)
}

/// Build artifacts from an already collected candidate list
pub fn build_from_candidates(
    candidates: Vec<NetworkBlock>,
    options: &BuildOptions,
) -> Result<BuildReport> {
    let candidates = prepare_candidates(candidates);
    let hash = content_hash(&candidates);
    info!(hash = %hash, candidates = candidates.len(), "candidate list hashed");

    if !options.force && is_up_to_date(&options.data_dir, &hash)? {
        info!("candidate list unchanged, skipping build");
        return Ok(BuildReport {
            hash,
            candidates: candidates.len(),
            outcome: BuildOutcome::Unchanged,
        });
    }

    let count = candidates.len();
    let compiled = compile(candidates)?;
    write_artifacts(&options.data_dir, &compiled)?;

    let range_files = match &options.ranges_dir {
        Some(dir) => export_ranges(dir, &compiled)?,
        None => 0,
    };

    Ok(BuildReport {
        hash,
        candidates: count,
        outcome: BuildOutcome::Written {
            stats: compiled.stats,
            range_files,
        },
    })
}

/// Sort the candidates and insert them into one trie per family.
///
/// A block the trie rejects (unattributed) aborts the compilation.
pub fn compile(candidates: Vec<NetworkBlock>) -> Result<Compiled> {
    let candidates = prepare_candidates(candidates);
    let hash = content_hash(&candidates);

    let (v4_blocks, v6_blocks): (Vec<_>, Vec<_>) = candidates
        .into_iter()
        .partition(|block| block.family() == AddressFamily::V4);

    let mut v4 = PrefixTrie::v4();
    let v4_stats = v4.insert_all(v4_blocks)?;
    info!(inserted = v4_stats.inserted, shadowed = v4_stats.shadowed, "IPv4 trie built");

    let mut v6 = PrefixTrie::v6();
    let v6_stats = v6.insert_all(v6_blocks)?;
    info!(inserted = v6_stats.inserted, shadowed = v6_stats.shadowed, "IPv6 trie built");

    Ok(Compiled {
        v4,
        v6,
        stats: InsertStats {
            inserted: v4_stats.inserted + v6_stats.inserted,
            shadowed: v4_stats.shadowed + v6_stats.shadowed,
        },
        hash,
    })
}

/// Lowercase hex SHA-256 over the candidate keys, one per line.
///
/// Expects a prepared (deduplicated, sorted) list.
#[must_use]
pub fn content_hash(candidates: &[NetworkBlock]) -> String {
    let mut context = Context::new(&SHA256);
    for block in candidates {
        context.update(block.key().as_bytes());
        context.update(b"\n");
    }
    hex::encode(context.finish().as_ref())
}

/// Hash stored by the previous build, if any
pub fn stored_hash(data_dir: &Path) -> Result<Option<String>> {
    let path = data_dir.join(HASH_FILE);
    match fs::read_to_string(&path) {
        Ok(hash) => Ok(Some(hash.trim().to_string())),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(Error::io(path, e)),
    }
}

fn is_up_to_date(data_dir: &Path, hash: &str) -> Result<bool> {
    if stored_hash(data_dir)?.as_deref() != Some(hash) {
        return Ok(false);
    }
    // A hash without its blobs means a previous build was interrupted.
    Ok(data_dir.join(V4_BLOB).is_file() && data_dir.join(V6_BLOB).is_file())
}

/// Write both blobs, then the hash file
pub fn write_artifacts(data_dir: &Path, compiled: &Compiled) -> Result<()> {
    fs::create_dir_all(data_dir).map_err(|e| Error::io(data_dir, e))?;

    for (name, trie) in [(V4_BLOB, &compiled.v4), (V6_BLOB, &compiled.v6)] {
        let bytes = trie.to_bytes()?;
        write_file(&data_dir.join(name), &bytes)?;
        info!(file = name, bytes = bytes.len(), blocks = trie.len(), "wrote trie blob");
    }
    write_file(&data_dir.join(HASH_FILE), compiled.hash.as_bytes())?;
    Ok(())
}

/// Write `<slug>.txt` per provider listing its blocks, IPv4 first.
///
/// Returns the number of files written.
pub fn export_ranges(dir: &Path, compiled: &Compiled) -> Result<usize> {
    fs::create_dir_all(dir).map_err(|e| Error::io(dir, e))?;

    let mut per_provider: BTreeMap<Provider, String> = BTreeMap::new();
    for block in compiled.v4.enumerate().into_iter().chain(compiled.v6.enumerate()) {
        per_provider
            .entry(block.provider())
            .or_default()
            .push_str(&format!("{}\n", block.network()));
    }

    for (provider, lines) in &per_provider {
        let path = dir.join(format!("{}.txt", provider.slug()));
        write_file(&path, lines.as_bytes())?;
        debug!(provider = %provider, path = %path.display(), "wrote range file");
    }
    info!(dir = %dir.display(), files = per_provider.len(), "exported ranges");
    Ok(per_provider.len())
}

/// Write through a temporary file so readers never see a partial file
fn write_file(path: &Path, contents: &[u8]) -> Result<()> {
    let tmp = path.with_extension("tmp");
    fs::write(&tmp, contents).map_err(|e| Error::io(&tmp, e))?;
    fs::rename(&tmp, path).map_err(|e| Error::io(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Resolver;

    fn block(cidr: &str, provider: Provider) -> NetworkBlock {
        NetworkBlock::parse(cidr, provider).unwrap()
    }

    fn candidates() -> Vec<NetworkBlock> {
        vec![
            block("8.8.4.0/24", Provider::Gcp),
            block("8.0.0.0/8", Provider::Aws),
            block("2600:1f00::/24", Provider::Aws),
            block("104.16.0.0/13", Provider::Cloudflare),
            block("8.8.4.0/24", Provider::Gcp),
        ]
    }

    #[test]
    fn test_compile_widest_wins() {
        let compiled = compile(candidates()).unwrap();
        assert_eq!(compiled.v4.len(), 2);
        assert_eq!(compiled.v6.len(), 1);
        assert_eq!(compiled.stats, InsertStats { inserted: 3, shadowed: 1 });

        let hit = compiled.v4.lookup("8.8.4.5".parse().unwrap()).unwrap();
        assert_eq!(hit.provider(), Provider::Aws);
    }

    #[test]
    fn test_content_hash_is_order_independent_after_prepare() {
        let mut reversed = candidates();
        reversed.reverse();
        let a = content_hash(&prepare_candidates(candidates()));
        let b = content_hash(&prepare_candidates(reversed));
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
        assert_eq!(
            content_hash(&[]),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_build_writes_then_skips() {
        let dir = tempfile::tempdir().unwrap();
        let options = BuildOptions::new(dir.path());

        let first = build_from_candidates(candidates(), &options).unwrap();
        assert!(matches!(first.outcome, BuildOutcome::Written { .. }));
        assert_eq!(first.candidates, 4);
        assert_eq!(stored_hash(dir.path()).unwrap().as_deref(), Some(first.hash.as_str()));

        let second = build_from_candidates(candidates(), &options).unwrap();
        assert_eq!(second.outcome, BuildOutcome::Unchanged);

        let forced = build_from_candidates(candidates(), &options.clone().force(true)).unwrap();
        assert!(matches!(forced.outcome, BuildOutcome::Written { .. }));

        let resolver = Resolver::load(dir.path()).unwrap();
        assert_eq!(resolver.classify("8.8.4.5".parse().unwrap()), Provider::Aws);
        assert_eq!(resolver.classify("9.9.9.9".parse().unwrap()), Provider::Unknown);
    }

    #[test]
    fn test_missing_blob_forces_rebuild() {
        let dir = tempfile::tempdir().unwrap();
        let options = BuildOptions::new(dir.path());
        build_from_candidates(candidates(), &options).unwrap();
        fs::remove_file(dir.path().join(V6_BLOB)).unwrap();

        let report = build_from_candidates(candidates(), &options).unwrap();
        assert!(matches!(report.outcome, BuildOutcome::Written { .. }));
        assert!(dir.path().join(V6_BLOB).is_file());
    }

    #[test]
    fn test_export_ranges() {
        let dir = tempfile::tempdir().unwrap();
        let mut list = candidates();
        list.push(block("2400:cb00::/32", Provider::Cloudflare));
        let compiled = compile(list).unwrap();

        let files = export_ranges(dir.path(), &compiled).unwrap();
        assert_eq!(files, 2);
        let cloudflare = fs::read_to_string(dir.path().join("cloudflare.txt")).unwrap();
        assert_eq!(cloudflare, "104.16.0.0/13\n2400:cb00::/32\n");
        let aws = fs::read_to_string(dir.path().join("aws.txt")).unwrap();
        assert_eq!(aws, "8.0.0.0/8\n2600:1f00::/24\n");
        assert!(!dir.path().join("gcp.txt").exists());
    }

    #[test]
    fn test_unattributed_block_aborts() {
        let list = vec![block("1.0.0.0/8", Provider::Unknown)];
        assert!(matches!(
            compile(list),
            Err(Error::Core(cloudfinder_core::CoreError::Unattributed(_)))
        ));
    }
}
