use async_trait::async_trait;
use tracing::info;

use cloudfinder_core::{NetworkBlock, Provider};

use crate::error::Result;
use crate::source::{Source, SourceContext};

/// Akamai's announcing ASNs. AS63949 belongs to Linode and is left out.
const AKAMAI_ASNS: &[u32] = &[
    12222, 16625, 16702, 17204, 18680, 18717, 20189, 20940, 21342, 21357, 21399, 22207, 22452,
    23454, 23455, 23903, 24319, 26008, 30675, 31107, 31108, 31109, 31110, 31377, 33047, 33905,
    34164, 34850, 35204, 35993, 35994, 36183, 39836, 43639, 55409, 55770, 133_103, 393_560,
];

/// OVHcloud. AS22598 (OVH Telecom) carries no hosting and is left out.
const OVH_ASNS: &[u32] = &[16276];

const SCALEWAY_ASNS: &[u32] = &[12876];

/// Networks announced by a provider's ASNs, read from the shared table
#[derive(Debug, Clone)]
pub struct AsnListSource {
    provider: Provider,
    asns: Vec<u32>,
}

impl AsnListSource {
    /// Create a source for `provider` backed by `asns`
    #[must_use]
    pub fn new(provider: Provider, asns: Vec<u32>) -> Self {
        Self { provider, asns }
    }

    /// Akamai
    #[must_use]
    pub fn akamai() -> Self {
        Self::new(Provider::Akamai, AKAMAI_ASNS.to_vec())
    }

    /// OVHcloud
    #[must_use]
    pub fn ovh() -> Self {
        Self::new(Provider::Ovh, OVH_ASNS.to_vec())
    }

    /// Scaleway
    #[must_use]
    pub fn scaleway() -> Self {
        Self::new(Provider::Scaleway, SCALEWAY_ASNS.to_vec())
    }

    /// ASNs read for this provider
    #[must_use]
    pub fn asns(&self) -> &[u32] {
        &self.asns
    }
}

#[async_trait]
impl Source for AsnListSource {
    fn provider(&self) -> Provider {
        self.provider
    }

    async fn produce(&self, ctx: &SourceContext) -> Result<Vec<NetworkBlock>> {
        let mut blocks = Vec::new();
        for &asn in &self.asns {
            let ranges = ctx.asn_table().ranges(ctx.fetcher(), asn).await?;
            info!(provider = %self.provider, asn, ranges = ranges.len(), "ranges from ASN");
            blocks.extend(ranges.into_iter().map(|net| NetworkBlock::new(net, self.provider)));
        }
        Ok(blocks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::asn::AsnTable;
    use crate::feeds::tests_support::context;

    #[test]
    fn test_akamai_excludes_linode_asn() {
        assert!(!AsnListSource::akamai().asns().contains(&63949));
        assert!(AsnListSource::akamai().asns().contains(&20940));
    }

    #[tokio::test]
    async fn test_produce_from_table() {
        let table = AsnTable::from_text("23.32.0.0/11 20940\n2.16.0.0/13 20940\n96.6.0.0/15 16625\n5.5.5.0/24 1\n");
        let ctx = SourceContext::new(context().fetcher().clone(), Arc::new(table));

        let blocks = AsnListSource::akamai().produce(&ctx).await.unwrap();
        assert_eq!(blocks.len(), 3);
        assert!(blocks.iter().all(|b| b.provider() == Provider::Akamai));
    }
}
