use async_trait::async_trait;
use tracing::info;

use cloudfinder_core::{NetworkBlock, Provider};

use super::parse_lines;
use crate::error::Result;
use crate::source::{Source, SourceContext};

const CLOUDFLARE_URLS: &[&str] = &[
    "https://www.cloudflare.com/ips-v4/",
    "https://www.cloudflare.com/ips-v6/",
];

/// Cloudflare's `ips-v4` and `ips-v6` lists
#[derive(Debug, Clone)]
pub struct CloudflareSource {
    urls: Vec<String>,
}

impl CloudflareSource {
    /// Read every list in `urls`
    #[must_use]
    pub fn new(urls: Vec<String>) -> Self {
        Self { urls }
    }
}

impl Default for CloudflareSource {
    fn default() -> Self {
        Self::new(CLOUDFLARE_URLS.iter().map(ToString::to_string).collect())
    }
}

#[async_trait]
impl Source for CloudflareSource {
    fn provider(&self) -> Provider {
        Provider::Cloudflare
    }

    async fn produce(&self, ctx: &SourceContext) -> Result<Vec<NetworkBlock>> {
        let mut blocks = Vec::new();
        for url in &self.urls {
            info!(url = %url, "fetching Cloudflare ranges");
            let text = ctx.fetcher().get_text(url).await?;
            blocks.extend(parse_lines(&text, Provider::Cloudflare));
        }
        Ok(blocks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feeds::tests_support::{context, mount_text};
    use wiremock::MockServer;

    #[tokio::test]
    async fn test_produce() {
        let server = MockServer::start().await;
        mount_text(&server, "/ips-v4", "173.245.48.0/20\n103.21.244.0/22").await;
        mount_text(&server, "/ips-v6", "2400:cb00::/32\n").await;

        let source = CloudflareSource::new(vec![
            format!("{}/ips-v4", server.uri()),
            format!("{}/ips-v6", server.uri()),
        ]);
        let blocks = source.produce(&context()).await.unwrap();
        assert_eq!(blocks.len(), 3);
        assert_eq!(blocks[2].network().to_string(), "2400:cb00::/32");
    }
}
