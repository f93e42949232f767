use async_trait::async_trait;
use tracing::info;

use cloudfinder_core::{NetworkBlock, Provider};

use super::parse_lines;
use crate::error::Result;
use crate::source::{Source, SourceContext};

const IP2CLOUD_BASE: &str = "https://raw.githubusercontent.com/devanshbatham/ip2cloud/main/data";

/// Plain-text list, one network per line
#[derive(Debug, Clone)]
pub struct TextListSource {
    provider: Provider,
    url: String,
}

impl TextListSource {
    /// Create a source reading `url` for `provider`
    #[must_use]
    pub fn new(provider: Provider, url: impl Into<String>) -> Self {
        Self {
            provider,
            url: url.into(),
        }
    }

    /// Alibaba Cloud
    #[must_use]
    pub fn alibaba() -> Self {
        Self::new(Provider::Alibaba, format!("{IP2CLOUD_BASE}/aliyun.txt"))
    }

    /// Linode
    #[must_use]
    pub fn linode() -> Self {
        Self::new(Provider::Linode, format!("{IP2CLOUD_BASE}/linode.txt"))
    }

    /// Tencent Cloud
    #[must_use]
    pub fn tencent() -> Self {
        Self::new(Provider::Tencent, format!("{IP2CLOUD_BASE}/tencent.txt"))
    }

    /// UCloud
    #[must_use]
    pub fn ucloud() -> Self {
        Self::new(Provider::Ucloud, format!("{IP2CLOUD_BASE}/ucloud.txt"))
    }

    /// Feed location
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl Source for TextListSource {
    fn provider(&self) -> Provider {
        self.provider
    }

    async fn produce(&self, ctx: &SourceContext) -> Result<Vec<NetworkBlock>> {
        info!(provider = %self.provider, url = %self.url, "fetching ranges");
        let text = ctx.fetcher().get_text(&self.url).await?;
        Ok(parse_lines(&text, self.provider))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feeds::tests_support::{context, mock_text};

    #[test]
    fn test_default_urls() {
        assert!(TextListSource::alibaba().url().ends_with("/aliyun.txt"));
        assert_eq!(TextListSource::ucloud().provider(), Provider::Ucloud);
    }

    #[tokio::test]
    async fn test_produce() {
        let server = mock_text("/tencent.txt", "43.128.0.0/10\n\n162.14.0.0/16\n").await;
        let source = TextListSource::new(Provider::Tencent, format!("{}/tencent.txt", server.uri()));
        let blocks = source.produce(&context()).await.unwrap();
        assert_eq!(blocks.len(), 2);
        assert!(blocks.iter().all(|b| b.provider() == Provider::Tencent));
    }
}
