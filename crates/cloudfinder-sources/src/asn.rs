//! Shared prefix-to-ASN table.
//!
//! Several providers publish no range list of their own and are derived from
//! the prefixes their autonomous systems announce. The table behind them is
//! large, so it is fetched once per [`AsnTable`] and shared by every source
//! of a run. A failed load is remembered: later callers get the same error
//! without another fetch.

use ipnet::IpNet;
use std::collections::HashMap;
use tokio::sync::OnceCell;
use tracing::{debug, error, info};

use cloudfinder_core::is_private_network;

use crate::config::RetryConfig;
use crate::error::{Result, SourceError};
use crate::fetch::Fetcher;

type Table = HashMap<u32, Vec<IpNet>>;

/// Lazily loaded `ASN -> announced prefixes` table
#[derive(Debug)]
pub struct AsnTable {
    url: String,
    retry: RetryConfig,
    table: OnceCell<std::result::Result<Table, String>>,
}

impl AsnTable {
    /// Create an empty table that loads `url` on first use
    #[must_use]
    pub fn new(url: impl Into<String>, retry: RetryConfig) -> Self {
        Self {
            url: url.into(),
            retry,
            table: OnceCell::new(),
        }
    }

    /// Create a table already loaded from `<CIDR> <ASN>` lines
    #[must_use]
    pub fn from_text(text: &str) -> Self {
        Self {
            url: String::new(),
            retry: RetryConfig::none(),
            table: OnceCell::new_with(Some(Ok(parse_table(text)))),
        }
    }

    /// URL the table is loaded from
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Returns true once a load attempt finished, successful or not
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.table.initialized()
    }

    /// Prefixes announced by `asn`, loading the table on first call.
    ///
    /// An ASN absent from the table yields an empty list.
    pub async fn ranges(&self, fetcher: &Fetcher, asn: u32) -> Result<Vec<IpNet>> {
        let table = self.table.get_or_init(|| self.load(fetcher)).await;
        match table {
            Ok(table) => Ok(table.get(&asn).cloned().unwrap_or_default()),
            Err(message) => Err(SourceError::AsnTable(message.clone())),
        }
    }

    async fn load(&self, fetcher: &Fetcher) -> std::result::Result<Table, String> {
        info!(url = %self.url, "fetching ASN table");
        match fetcher.get_text_with(&self.url, &self.retry).await {
            Ok(text) => {
                let table = parse_table(&text);
                info!(asns = table.len(), "ASN table loaded");
                Ok(table)
            }
            Err(e) => {
                error!(url = %self.url, error = %e, "ASN table load failed");
                Err(e.to_string())
            }
        }
    }
}

/// Parse `<CIDR> <ASN>` lines; malformed lines and private ranges are skipped.
fn parse_table(text: &str) -> Table {
    let mut table = Table::new();
    let mut skipped = 0usize;

    for line in text.lines() {
        let mut fields = line.split_whitespace();
        let (Some(cidr), Some(asn), None) = (fields.next(), fields.next(), fields.next()) else {
            skipped += 1;
            continue;
        };
        let Ok(network) = cidr.parse::<IpNet>() else {
            skipped += 1;
            continue;
        };
        let Ok(asn) = asn.trim_start_matches("AS").parse::<u32>() else {
            skipped += 1;
            continue;
        };
        let network = network.trunc();
        if is_private_network(&network) {
            continue;
        }
        table.entry(asn).or_default().push(network);
    }

    if skipped > 0 {
        debug!(skipped, "skipped malformed ASN table lines");
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio_test::{assert_err, assert_ok};
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const TABLE: &str = "\
1.0.0.0/24 13335
2606:4700::/32 13335
51.15.0.0/16 12876
10.0.0.0/8 12876
fd00::/8 12876
garbage line here
62.210.0.0/16 AS12876
";

    fn fetcher() -> Fetcher {
        Fetcher::builder().build().unwrap()
    }

    fn fast_retry(attempts: u32) -> RetryConfig {
        RetryConfig::new()
            .max_attempts(attempts)
            .initial_backoff(Duration::ZERO)
    }

    #[test]
    fn test_parse_table() {
        let table = parse_table(TABLE);
        assert_eq!(table[&13335].len(), 2);
        let scaleway: Vec<String> = table[&12876].iter().map(ToString::to_string).collect();
        assert_eq!(scaleway, vec!["51.15.0.0/16", "62.210.0.0/16"]);
    }

    #[tokio::test]
    async fn test_from_text_needs_no_fetch() {
        let table = AsnTable::from_text(TABLE);
        assert!(table.is_initialized());
        let ranges = assert_ok!(table.ranges(&fetcher(), 13335).await);
        assert_eq!(ranges.len(), 2);
        assert!(assert_ok!(table.ranges(&fetcher(), 64512).await).is_empty());
    }

    #[tokio::test]
    async fn test_fetched_once_for_concurrent_callers() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/table.txt"))
            .respond_with(ResponseTemplate::new(200).set_body_string(TABLE))
            .expect(1)
            .mount(&server)
            .await;

        let table = Arc::new(AsnTable::new(
            format!("{}/table.txt", server.uri()),
            fast_retry(3),
        ));
        let fetcher = fetcher();

        let mut handles = Vec::new();
        for asn in [13335, 12876, 13335, 12876] {
            let table = Arc::clone(&table);
            let fetcher = fetcher.clone();
            handles.push(tokio::spawn(async move { table.ranges(&fetcher, asn).await }));
        }
        for handle in handles {
            assert_eq!(handle.await.unwrap().unwrap().len(), 2);
        }
    }

    #[tokio::test]
    async fn test_failure_is_remembered() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .expect(3)
            .mount(&server)
            .await;

        let table = AsnTable::new(server.uri(), fast_retry(3));
        let fetcher = fetcher();

        let first = assert_err!(table.ranges(&fetcher, 13335).await);
        assert!(first.is_fatal());
        let second = assert_err!(table.ranges(&fetcher, 12876).await);
        assert!(matches!(second, SourceError::AsnTable(_)));
    }
}
