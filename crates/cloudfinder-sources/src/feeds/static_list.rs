use async_trait::async_trait;

use cloudfinder_core::{NetworkBlock, Provider};

use super::parse_blocks;
use crate::error::Result;
use crate::source::{Source, SourceContext};

/// Vercel publishes no list; its edge network is one well-known block.
const VERCEL_RANGES: &[&str] = &["76.76.21.0/24"];

/// Fixed list of networks, no I/O
#[derive(Debug, Clone)]
pub struct StaticSource {
    provider: Provider,
    networks: Vec<String>,
}

impl StaticSource {
    /// Create a source producing `networks` for `provider`
    pub fn new<I, S>(provider: Provider, networks: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            provider,
            networks: networks.into_iter().map(Into::into).collect(),
        }
    }

    /// Vercel's static range
    #[must_use]
    pub fn vercel() -> Self {
        Self::new(Provider::Vercel, VERCEL_RANGES.iter().copied())
    }
}

#[async_trait]
impl Source for StaticSource {
    fn provider(&self) -> Provider {
        self.provider
    }

    async fn produce(&self, _ctx: &SourceContext) -> Result<Vec<NetworkBlock>> {
        Ok(parse_blocks(self.networks.iter().map(String::as_str), self.provider))
    }
}
