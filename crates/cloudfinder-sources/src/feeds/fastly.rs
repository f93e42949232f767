use async_trait::async_trait;
use serde::Deserialize;
use tracing::info;

use cloudfinder_core::{NetworkBlock, Provider};

use super::parse_blocks;
use crate::error::Result;
use crate::source::{Source, SourceContext};

const FASTLY_URL: &str = "https://api.fastly.com/public-ip-list";

#[derive(Debug, Deserialize)]
struct PublicIpList {
    #[serde(default)]
    addresses: Vec<String>,
    #[serde(default)]
    ipv6_addresses: Vec<String>,
}

/// Fastly's public IP list API
#[derive(Debug, Clone)]
pub struct FastlySource {
    url: String,
}

impl FastlySource {
    /// Read the list at `url`
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

impl Default for FastlySource {
    fn default() -> Self {
        Self::new(FASTLY_URL)
    }
}

#[async_trait]
impl Source for FastlySource {
    fn provider(&self) -> Provider {
        Provider::Fastly
    }

    async fn produce(&self, ctx: &SourceContext) -> Result<Vec<NetworkBlock>> {
        info!(url = %self.url, "fetching Fastly ranges");
        let list: PublicIpList = ctx.fetcher().get_json(&self.url).await?;
        let all = list.addresses.iter().chain(&list.ipv6_addresses);
        Ok(parse_blocks(all.map(String::as_str), Provider::Fastly))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feeds::tests_support::{context, mock_text};

    #[tokio::test]
    async fn test_produce() {
        let server = mock_text(
            "/public-ip-list",
            r#"{"addresses": ["151.101.0.0/16", "199.232.0.0/16"], "ipv6_addresses": ["2a04:4e40::/32"]}"#,
        )
        .await;
        let source = FastlySource::new(format!("{}/public-ip-list", server.uri()));
        let blocks = source.produce(&context()).await.unwrap();
        assert_eq!(blocks.len(), 3);
        assert!(blocks.iter().all(|b| b.provider() == Provider::Fastly));
    }
}
