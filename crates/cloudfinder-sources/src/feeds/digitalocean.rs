use async_trait::async_trait;
use tracing::{debug, info};

use cloudfinder_core::{NetworkBlock, Provider};

use super::parse_blocks;
use crate::error::Result;
use crate::source::{Source, SourceContext};

const DIGITALOCEAN_URL: &str = "https://digitalocean.com/geo/google.csv";

/// DigitalOcean geofeed: `network,country,region,city,postal`
#[derive(Debug, Clone)]
pub struct DigitaloceanSource {
    url: String,
}

impl DigitaloceanSource {
    /// Read the feed at `url`
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

impl Default for DigitaloceanSource {
    fn default() -> Self {
        Self::new(DIGITALOCEAN_URL)
    }
}

#[async_trait]
impl Source for DigitaloceanSource {
    fn provider(&self) -> Provider {
        Provider::Digitalocean
    }

    async fn produce(&self, ctx: &SourceContext) -> Result<Vec<NetworkBlock>> {
        info!(url = %self.url, "fetching DigitalOcean ranges");
        let text = ctx.fetcher().get_text(&self.url).await?;

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .comment(Some(b'#'))
            .from_reader(text.as_bytes());

        let mut networks = Vec::new();
        for record in reader.records() {
            match record {
                Ok(record) => {
                    if let Some(network) = record.get(0) {
                        networks.push(network.to_string());
                    }
                }
                Err(e) => debug!(error = %e, "skipping malformed geofeed row"),
            }
        }

        Ok(parse_blocks(
            networks.iter().map(String::as_str),
            Provider::Digitalocean,
        ))
    }
}
