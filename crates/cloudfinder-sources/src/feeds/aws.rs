use async_trait::async_trait;
use serde::Deserialize;
use tracing::info;

use cloudfinder_core::{NetworkBlock, Provider};

use super::parse_blocks;
use crate::error::Result;
use crate::source::{Source, SourceContext};

const AWS_URL: &str = "https://ip-ranges.amazonaws.com/ip-ranges.json";

#[derive(Debug, Deserialize)]
struct IpRanges {
    #[serde(default)]
    prefixes: Vec<V4Prefix>,
    #[serde(default)]
    ipv6_prefixes: Vec<V6Prefix>,
}

#[derive(Debug, Deserialize)]
struct V4Prefix {
    ip_prefix: String,
}

#[derive(Debug, Deserialize)]
struct V6Prefix {
    ipv6_prefix: String,
}

/// Amazon Web Services `ip-ranges.json`
#[derive(Debug, Clone)]
pub struct AwsSource {
    url: String,
}

impl AwsSource {
    /// Read the document at `url`
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

impl Default for AwsSource {
    fn default() -> Self {
        Self::new(AWS_URL)
    }
}

#[async_trait]
impl Source for AwsSource {
    fn provider(&self) -> Provider {
        Provider::Aws
    }

    async fn produce(&self, ctx: &SourceContext) -> Result<Vec<NetworkBlock>> {
        info!(url = %self.url, "fetching AWS ranges");
        let ranges: IpRanges = ctx.fetcher().get_json(&self.url).await?;

        let v4 = ranges.prefixes.iter().map(|p| p.ip_prefix.as_str());
        let v6 = ranges.ipv6_prefixes.iter().map(|p| p.ipv6_prefix.as_str());
        Ok(parse_blocks(v4.chain(v6), Provider::Aws))
    }
}
