//! The source capability and its registry.

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Arc;

use cloudfinder_core::{NetworkBlock, Provider};

use crate::asn::AsnTable;
use crate::config::FetchConfig;
use crate::error::{Result, SourceError};
use crate::fetch::Fetcher;

/// Producer of candidate blocks for exactly one provider.
///
/// Whatever provider a produced block carries is overwritten with
/// [`Source::provider`] by the aggregator.
#[async_trait]
pub trait Source: Send + Sync {
    /// Provider this source attributes its blocks to
    fn provider(&self) -> Provider;

    /// Fetch and parse the source's blocks
    async fn produce(&self, ctx: &SourceContext) -> Result<Vec<NetworkBlock>>;
}

/// Collaborators shared by every source of one aggregation run
#[derive(Clone)]
pub struct SourceContext {
    fetcher: Fetcher,
    asn_table: Arc<AsnTable>,
}

impl SourceContext {
    /// Create a context from its parts
    #[must_use]
    pub const fn new(fetcher: Fetcher, asn_table: Arc<AsnTable>) -> Self {
        Self { fetcher, asn_table }
    }

    /// Create a context with a fresh fetcher and ASN table
    pub fn from_config(config: &FetchConfig) -> Result<Self> {
        let fetcher = Fetcher::new(config)?;
        let asn_table = AsnTable::new(config.asn_table_url.clone(), config.retry.clone());
        Ok(Self::new(fetcher, Arc::new(asn_table)))
    }

    /// Shared HTTP fetcher
    #[must_use]
    pub const fn fetcher(&self) -> &Fetcher {
        &self.fetcher
    }

    /// Shared ASN table
    #[must_use]
    pub fn asn_table(&self) -> &AsnTable {
        &self.asn_table
    }
}

/// Set of sources in bijection with every provider but `Unknown`
#[derive(Clone)]
pub struct SourceRegistry {
    sources: Vec<Arc<dyn Source>>,
}

impl SourceRegistry {
    /// Validate and wrap a source list.
    ///
    /// Fails if a source claims `Unknown`, if two sources claim one
    /// provider, or if a provider has no source.
    pub fn new(sources: Vec<Arc<dyn Source>>) -> Result<Self> {
        let mut seen = HashSet::with_capacity(sources.len());
        for source in &sources {
            let provider = source.provider();
            if !provider.is_known() {
                return Err(SourceError::UnknownSource);
            }
            if !seen.insert(provider) {
                return Err(SourceError::DuplicateSource(provider));
            }
        }
        if let Some(missing) = Provider::attributable().find(|p| !seen.contains(p)) {
            return Err(SourceError::MissingSource(missing));
        }
        Ok(Self { sources })
    }

    /// Registry of the built-in feeds
    pub fn builtin() -> Result<Self> {
        Self::new(crate::feeds::builtin())
    }

    /// Registered sources in registration order
    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn Source>> {
        self.sources.iter()
    }

    /// Number of registered sources
    #[must_use]
    pub fn len(&self) -> usize {
        self.sources.len()
    }

    /// Always false for a validated registry
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feeds::StaticSource;

    fn all_static() -> Vec<Arc<dyn Source>> {
        Provider::attributable()
            .map(|p| Arc::new(StaticSource::new(p, Vec::<String>::new())) as Arc<dyn Source>)
            .collect()
    }

    #[test]
    fn test_complete_registry() {
        let registry = SourceRegistry::new(all_static()).unwrap();
        assert_eq!(registry.len(), 16);
        assert!(!registry.is_empty());
    }

    #[test]
    fn test_builtin_registry_is_complete() {
        let registry = SourceRegistry::builtin().unwrap();
        let providers: HashSet<Provider> = registry.iter().map(|s| s.provider()).collect();
        assert_eq!(providers.len(), Provider::ALL.len() - 1);
    }

    #[test]
    fn test_duplicate_source_rejected() {
        let mut sources = all_static();
        sources.push(Arc::new(StaticSource::new(Provider::Aws, ["1.0.0.0/8"])));
        assert!(matches!(
            SourceRegistry::new(sources),
            Err(SourceError::DuplicateSource(Provider::Aws))
        ));
    }

    #[test]
    fn test_missing_source_rejected() {
        let sources: Vec<_> = all_static()
            .into_iter()
            .filter(|s| s.provider() != Provider::Gcp)
            .collect();
        assert!(matches!(
            SourceRegistry::new(sources),
            Err(SourceError::MissingSource(Provider::Gcp))
        ));
    }

    #[test]
    fn test_unknown_source_rejected() {
        let mut sources = all_static();
        sources.push(Arc::new(StaticSource::new(Provider::Unknown, Vec::<String>::new())));
        assert!(matches!(
            SourceRegistry::new(sources),
            Err(SourceError::UnknownSource)
        ));
    }
}
