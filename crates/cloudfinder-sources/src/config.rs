//! Fetch configuration types.

use std::time::Duration;

/// Default per-request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(45);

/// Routing table mapping announced prefixes to origin ASNs
pub const DEFAULT_ASN_TABLE_URL: &str = "https://bgp.tools/table.txt";

/// The routing-table host asks for a descriptive, contactable user agent.
pub const DEFAULT_USER_AGENT: &str = concat!(
    "cloudfinder/",
    env!("CARGO_PKG_VERSION"),
    " (+https://github.com/Escape-Technologies/cloudfinder)"
);

/// Retry configuration for failed requests
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryConfig {
    /// Total number of attempts, the first one included
    pub max_attempts: u32,

    /// Delay before the second attempt
    pub initial_backoff: Duration,

    /// Upper bound for any delay
    pub max_backoff: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl RetryConfig {
    /// Create the default configuration: 3 attempts, 2s doubling up to 30s
    #[must_use]
    pub const fn new() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_secs(2),
            max_backoff: Duration::from_secs(30),
        }
    }

    /// A single attempt, no retry
    #[must_use]
    pub const fn none() -> Self {
        Self::new().max_attempts(1)
    }

    /// Set the total number of attempts
    #[must_use]
    pub const fn max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts;
        self
    }

    /// Set initial backoff duration
    #[must_use]
    pub const fn initial_backoff(mut self, duration: Duration) -> Self {
        self.initial_backoff = duration;
        self
    }

    /// Set maximum backoff duration
    #[must_use]
    pub const fn max_backoff(mut self, duration: Duration) -> Self {
        self.max_backoff = duration;
        self
    }

    /// Delay after the failed attempt number `attempt` (0-based)
    #[must_use]
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt);
        self.initial_backoff
            .saturating_mul(factor)
            .min(self.max_backoff)
    }
}

/// Settings shared by every feed request
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Per-request timeout
    pub timeout: Duration,

    /// User-Agent header
    pub user_agent: String,

    /// Retry policy for feed requests and the ASN table
    pub retry: RetryConfig,

    /// Location of the prefix-to-ASN table
    pub asn_table_url: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            retry: RetryConfig::default(),
            asn_table_url: DEFAULT_ASN_TABLE_URL.to_string(),
        }
    }
}
