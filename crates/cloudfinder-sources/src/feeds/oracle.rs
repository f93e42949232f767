use async_trait::async_trait;
use serde::Deserialize;
use tracing::info;

use cloudfinder_core::{NetworkBlock, Provider};

use super::parse_blocks;
use crate::error::Result;
use crate::source::{Source, SourceContext};

const ORACLE_URL: &str =
    "https://raw.githubusercontent.com/femueller/cloud-ip-ranges/master/oracle-cloud-ip-ranges.json";

#[derive(Debug, Deserialize)]
struct Document {
    #[serde(default)]
    regions: Vec<Region>,
}

#[derive(Debug, Deserialize)]
struct Region {
    #[serde(default)]
    cidrs: Vec<Cidr>,
}

#[derive(Debug, Deserialize)]
struct Cidr {
    cidr: String,
}

/// Oracle Cloud regional ranges
#[derive(Debug, Clone)]
pub struct OracleSource {
    url: String,
}

impl OracleSource {
    /// Read the document at `url`
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

impl Default for OracleSource {
    fn default() -> Self {
        Self::new(ORACLE_URL)
    }
}

#[async_trait]
impl Source for OracleSource {
    fn provider(&self) -> Provider {
        Provider::Oracle
    }

    async fn produce(&self, ctx: &SourceContext) -> Result<Vec<NetworkBlock>> {
        info!(url = %self.url, "fetching Oracle ranges");
        let doc: Document = ctx.fetcher().get_json(&self.url).await?;
        let cidrs = doc
            .regions
            .iter()
            .flat_map(|region| region.cidrs.iter().map(|c| c.cidr.as_str()));
        Ok(parse_blocks(cidrs, Provider::Oracle))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feeds::tests_support::{context, mock_text};

    #[tokio::test]
    async fn test_produce() {
        let body = r#"{
            "last_updated_timestamp": "2024-01-01T00:00:00",
            "regions": [
                {"region": "us-phoenix-1", "cidrs": [{"cidr": "129.146.0.0/21", "tags": ["OCI"]}]},
                {"region": "eu-frankfurt-1", "cidrs": [{"cidr": "130.61.0.0/16"}, {"cidr": "138.1.0.0/20"}]}
            ]
        }"#;
        let server = mock_text("/oracle.json", body).await;
        let source = OracleSource::new(format!("{}/oracle.json", server.uri()));
        let blocks = source.produce(&context()).await.unwrap();
        assert_eq!(blocks.len(), 3);
    }
}
