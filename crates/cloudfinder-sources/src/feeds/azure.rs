//! Azure publishes its service tags as dated JSON downloads whose names
//! change weekly. The index page is scraped for the current links.

use async_trait::async_trait;
use regex::Regex;
use serde::Deserialize;
use std::collections::BTreeSet;
use tracing::{info, warn};

use cloudfinder_core::{NetworkBlock, Provider};

use super::parse_blocks;
use crate::error::{Result, SourceError};
use crate::source::{Source, SourceContext};

const AZURE_INDEX_URL: &str = "https://azservicetags.azurewebsites.net";
const AZURE_DOWNLOAD_PREFIX: &str = "https://download.microsoft.com/download/";

#[derive(Debug, Deserialize)]
struct ServiceTags {
    #[serde(default)]
    values: Vec<ServiceTag>,
}

#[derive(Debug, Deserialize)]
struct ServiceTag {
    properties: Properties,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Properties {
    #[serde(default)]
    address_prefixes: Vec<String>,
}

/// Microsoft Azure service tags
#[derive(Debug, Clone)]
pub struct AzureSource {
    index_url: String,
    download_prefix: String,
}

impl AzureSource {
    /// Scrape `index_url` for JSON links starting with `download_prefix`
    #[must_use]
    pub fn new(index_url: impl Into<String>, download_prefix: impl Into<String>) -> Self {
        Self {
            index_url: index_url.into(),
            download_prefix: download_prefix.into(),
        }
    }

    fn document_urls(&self, page: &str) -> Result<BTreeSet<String>> {
        let pattern = format!(r#""({}[^"]*\.json)""#, regex::escape(&self.download_prefix));
        let links = Regex::new(&pattern).map_err(|e| SourceError::Feed(e.to_string()))?;
        Ok(links
            .captures_iter(page)
            .filter_map(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
            .collect())
    }
}

impl Default for AzureSource {
    fn default() -> Self {
        Self::new(AZURE_INDEX_URL, AZURE_DOWNLOAD_PREFIX)
    }
}

#[async_trait]
impl Source for AzureSource {
    fn provider(&self) -> Provider {
        Provider::Azure
    }

    async fn produce(&self, ctx: &SourceContext) -> Result<Vec<NetworkBlock>> {
        info!(url = %self.index_url, "fetching Azure service tag index");
        let page = ctx.fetcher().get_text(&self.index_url).await?;
        let urls = self.document_urls(&page)?;
        if urls.is_empty() {
            return Err(SourceError::Feed(format!(
                "no service tag documents linked from {}",
                self.index_url
            )));
        }

        let mut blocks = Vec::new();
        for url in &urls {
            let tags: ServiceTags = match ctx.fetcher().get_json(url).await {
                Ok(tags) => tags,
                Err(e) => {
                    warn!(url = %url, error = %e, "skipping Azure service tag document");
                    continue;
                }
            };
            let prefixes = tags
                .values
                .iter()
                .flat_map(|tag| tag.properties.address_prefixes.iter().map(String::as_str));
            blocks.extend(parse_blocks(prefixes, Provider::Azure));
        }
        Ok(blocks)
    }
}
