use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, info};

use cloudfinder_core::{NetworkBlock, Provider};

use super::parse_blocks;
use crate::error::Result;
use crate::source::{Source, SourceContext};

const GCP_URLS: &[&str] = &[
    "https://www.gstatic.com/ipranges/goog.json",
    "https://www.gstatic.com/ipranges/cloud.json",
];

#[derive(Debug, Deserialize)]
struct Ranges {
    #[serde(default)]
    prefixes: Vec<Prefix>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Prefix {
    ipv4_prefix: Option<String>,
    ipv6_prefix: Option<String>,
}

/// Google's `goog.json` and `cloud.json` range documents
#[derive(Debug, Clone)]
pub struct GcpSource {
    urls: Vec<String>,
}

impl GcpSource {
    /// Read every document in `urls`
    #[must_use]
    pub fn new(urls: Vec<String>) -> Self {
        Self { urls }
    }
}

impl Default for GcpSource {
    fn default() -> Self {
        Self::new(GCP_URLS.iter().map(ToString::to_string).collect())
    }
}

#[async_trait]
impl Source for GcpSource {
    fn provider(&self) -> Provider {
        Provider::Gcp
    }

    async fn produce(&self, ctx: &SourceContext) -> Result<Vec<NetworkBlock>> {
        let mut blocks = Vec::new();
        for url in &self.urls {
            info!(url = %url, "fetching GCP ranges");
            let ranges: Ranges = ctx.fetcher().get_json(url).await?;

            let prefixes = ranges.prefixes.iter().filter_map(|p| {
                let prefix = p.ipv4_prefix.as_deref().or(p.ipv6_prefix.as_deref());
                if prefix.is_none() {
                    debug!(url = %url, "prefix entry without address");
                }
                prefix
            });
            blocks.extend(parse_blocks(prefixes, Provider::Gcp));
        }
        Ok(blocks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feeds::tests_support::{context, mount_status, mount_text};
    use wiremock::MockServer;

    #[tokio::test]
    async fn test_produce_reads_every_document() {
        let server = MockServer::start().await;
        mount_text(
            &server,
            "/goog.json",
            r#"{"prefixes": [{"ipv4Prefix": "8.8.4.0/24"}, {"ipv6Prefix": "2001:4860::/32"}]}"#,
        )
        .await;
        mount_text(
            &server,
            "/cloud.json",
            r#"{"prefixes": [{"ipv4Prefix": "34.1.208.0/20", "service": "Google Cloud"}, {"scope": "global"}]}"#,
        )
        .await;

        let source = GcpSource::new(vec![
            format!("{}/goog.json", server.uri()),
            format!("{}/cloud.json", server.uri()),
        ]);
        let blocks = source.produce(&context()).await.unwrap();
        assert_eq!(blocks.len(), 3);
    }

    #[tokio::test]
    async fn test_failing_document_fails_source() {
        let server = MockServer::start().await;
        mount_text(&server, "/goog.json", r#"{"prefixes": []}"#).await;
        mount_status(&server, "/cloud.json", 404).await;

        let source = GcpSource::new(vec![
            format!("{}/goog.json", server.uri()),
            format!("{}/cloud.json", server.uri()),
        ]);
        assert!(source.produce(&context()).await.is_err());
    }
}
