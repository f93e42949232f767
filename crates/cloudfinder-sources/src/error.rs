use cloudfinder_core::{CoreError, Provider};
use thiserror::Error;

/// Result type alias for source and aggregation operations
pub type Result<T> = std::result::Result<T, SourceError>;

/// Errors raised while fetching feeds or aggregating their output
#[derive(Error, Debug)]
pub enum SourceError {
    /// HTTP request failed for a reason other than a timeout or connection error
    #[error("HTTP request to {url} failed: {message}")]
    Http {
        /// Requested URL
        url: String,
        /// Error description
        message: String,
    },

    /// Server answered with a non-success status
    #[error("{url} returned status {code}")]
    Status {
        /// Requested URL
        url: String,
        /// HTTP status code
        code: u16,
    },

    /// Request timed out
    #[error("request to {0} timed out")]
    Timeout(String),

    /// Connection could not be established
    #[error("connection to {0} failed")]
    Connection(String),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV parsing error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Feed content did not have the expected shape
    #[error("malformed feed: {0}")]
    Feed(String),

    /// The shared routing table could not be loaded
    #[error("ASN table unavailable: {0}")]
    AsnTable(String),

    /// Two sources registered for one provider
    #[error("more than one source registered for {0}")]
    DuplicateSource(Provider),

    /// A provider has no registered source
    #[error("no source registered for {0}")]
    MissingSource(Provider),

    /// A source claims the `Unknown` provider
    #[error("a source is registered for the Unknown provider")]
    UnknownSource,

    /// HTTP client could not be constructed
    #[error("HTTP client setup failed: {0}")]
    Client(String),

    /// Error from the core crate
    #[error(transparent)]
    Core(#[from] CoreError),
}

impl SourceError {
    /// Returns true if a retry may succeed
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        match self {
            Self::Timeout(_) | Self::Connection(_) => true,
            Self::Status { code, .. } => *code == 429 || *code >= 500,
            _ => false,
        }
    }

    /// Returns true if the error must abort aggregation instead of
    /// degrading the failing source to zero blocks
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::AsnTable(_)
                | Self::DuplicateSource(_)
                | Self::MissingSource(_)
                | Self::UnknownSource
        )
    }

    /// Returns the HTTP status code if the server answered
    #[must_use]
    pub const fn status_code(&self) -> Option<u16> {
        match self {
            Self::Status { code, .. } => Some(*code),
            _ => None,
        }
    }

    pub(crate) fn from_reqwest(url: &str, err: &reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout(url.to_string())
        } else if err.is_connect() {
            Self::Connection(url.to_string())
        } else if let Some(status) = err.status() {
            Self::Status {
                url: url.to_string(),
                code: status.as_u16(),
            }
        } else {
            Self::Http {
                url: url.to_string(),
                message: err.to_string(),
            }
        }
    }
}
