//! IBM Cloud lists its networks per datacenter, split into categories
//! (public front end, load balancers, service network, ...). Every
//! category is an array of groups carrying `cidr_blocks`; the service
//! network categories include private ranges, which are dropped.

use async_trait::async_trait;
use serde::Deserialize;
use std::collections::BTreeMap;
use tracing::info;

use cloudfinder_core::{NetworkBlock, Provider};

use super::parse_blocks;
use crate::error::Result;
use crate::source::{Source, SourceContext};

const IBM_URL: &str =
    "https://raw.githubusercontent.com/dprosper/cidr-calculator/main/data/datacenters.json";

#[derive(Debug, Deserialize)]
struct Document {
    #[serde(default)]
    data_centers: Vec<BTreeMap<String, Section>>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Section {
    Groups(Vec<Group>),
    Other(#[allow(dead_code)] serde::de::IgnoredAny),
}

#[derive(Debug, Deserialize)]
struct Group {
    #[serde(default)]
    cidr_blocks: Vec<String>,
}

/// IBM Cloud datacenter networks
#[derive(Debug, Clone)]
pub struct IbmSource {
    url: String,
}

impl IbmSource {
    /// Read the document at `url`
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

impl Default for IbmSource {
    fn default() -> Self {
        Self::new(IBM_URL)
    }
}

#[async_trait]
impl Source for IbmSource {
    fn provider(&self) -> Provider {
        Provider::Ibm
    }

    async fn produce(&self, ctx: &SourceContext) -> Result<Vec<NetworkBlock>> {
        info!(url = %self.url, "fetching IBM ranges");
        let doc: Document = ctx.fetcher().get_json(&self.url).await?;

        let cidrs = doc
            .data_centers
            .iter()
            .flat_map(BTreeMap::values)
            .filter_map(|section| match section {
                Section::Groups(groups) => Some(groups),
                Section::Other(_) => None,
            })
            .flatten()
            .flat_map(|group| group.cidr_blocks.iter().map(String::as_str));

        let mut blocks = parse_blocks(cidrs, Provider::Ibm);
        blocks.retain(|block| !block.is_private());
        Ok(blocks)
    }
}
