//! Built-in provider feeds.
//!
//! Every feed keeps its upstream location in a field so tests can point it
//! at a mock server. Entries that do not parse as a network are skipped.

mod asn_list;
mod aws;
mod azure;
mod cloudflare;
mod digitalocean;
mod fastly;
mod gcp;
mod ibm;
mod oracle;
mod static_list;
mod text_list;

#[cfg(test)]
pub(crate) mod tests_support;

pub use asn_list::AsnListSource;
pub use aws::AwsSource;
pub use azure::AzureSource;
pub use cloudflare::CloudflareSource;
pub use digitalocean::DigitaloceanSource;
pub use fastly::FastlySource;
pub use gcp::GcpSource;
pub use ibm::IbmSource;
pub use oracle::OracleSource;
pub use static_list::StaticSource;
pub use text_list::TextListSource;

use std::sync::Arc;
use tracing::debug;

use cloudfinder_core::{NetworkBlock, Provider};

use crate::source::Source;

/// One source per attributable provider, with upstream defaults
#[must_use]
pub fn builtin() -> Vec<Arc<dyn Source>> {
    vec![
        Arc::new(AwsSource::default()),
        Arc::new(TextListSource::alibaba()),
        Arc::new(AzureSource::default()),
        Arc::new(CloudflareSource::default()),
        Arc::new(DigitaloceanSource::default()),
        Arc::new(FastlySource::default()),
        Arc::new(GcpSource::default()),
        Arc::new(IbmSource::default()),
        Arc::new(TextListSource::linode()),
        Arc::new(OracleSource::default()),
        Arc::new(AsnListSource::ovh()),
        Arc::new(AsnListSource::scaleway()),
        Arc::new(TextListSource::tencent()),
        Arc::new(TextListSource::ucloud()),
        Arc::new(StaticSource::vercel()),
        Arc::new(AsnListSource::akamai()),
    ]
}

/// Parse network notations, skipping blanks, `#` comments and garbage
pub(crate) fn parse_blocks<'a, I>(entries: I, provider: Provider) -> Vec<NetworkBlock>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut skipped = 0usize;
    let blocks: Vec<NetworkBlock> = entries
        .into_iter()
        .map(str::trim)
        .filter(|entry| !entry.is_empty() && !entry.starts_with('#'))
        .filter_map(|entry| match NetworkBlock::parse(entry, provider) {
            Ok(block) => Some(block),
            Err(e) => {
                debug!(provider = %provider, error = %e, "skipping malformed entry");
                skipped += 1;
                None
            }
        })
        .collect();

    if skipped > 0 {
        debug!(provider = %provider, skipped, "feed contained malformed entries");
    }
    blocks
}

/// Parse a one-network-per-line text body
pub(crate) fn parse_lines(text: &str, provider: Provider) -> Vec<NetworkBlock> {
    parse_blocks(text.lines(), provider)
}
