use std::path::PathBuf;
use thiserror::Error;

use cloudfinder_core::CoreError;
use cloudfinder_sources::SourceError;

/// Result type alias for resolver and build operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while loading a resolver or building artifacts
#[derive(Error, Debug)]
pub enum Error {
    /// Trie or blob error
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Aggregation error
    #[error(transparent)]
    Source(#[from] SourceError),

    /// Artifact file could not be read or written
    #[error("{path}: {source}")]
    Io {
        /// File or directory involved
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Returns true if a persisted blob is corrupt
    #[must_use]
    pub const fn is_corrupt_blob(&self) -> bool {
        match self {
            Self::Core(e) => e.is_corrupt_blob(),
            _ => false,
        }
    }
}
