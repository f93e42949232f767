//! Classify IP addresses by the cloud or CDN provider that owns them.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use cloudfinder::{Provider, Resolver};
//!
//! fn main() -> cloudfinder::Result<()> {
//!     let resolver = Resolver::load("data")?;
//!
//!     let provider = resolver.classify("8.8.4.4".parse().unwrap());
//!     if provider != Provider::Unknown {
//!         println!("hosted on {provider}");
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! The data directory is produced by [`build::run`], which collects every
//! provider feed and compiles the result:
//!
//! ```rust,no_run
//! use cloudfinder::build::{self, BuildOptions};
//! use cloudfinder::{Aggregator, FetchConfig, SourceContext, SourceRegistry};
//!
//! #[tokio::main]
//! async fn main() -> cloudfinder::Result<()> {
//!     let ctx = SourceContext::from_config(&FetchConfig::default())?;
//!     let aggregator = Aggregator::new(SourceRegistry::builtin()?, ctx);
//!     let report = build::run(&aggregator, &BuildOptions::new("data")).await?;
//!     println!("{report:?}");
//!     Ok(())
//! }
//! ```
//!
//! # Features
//!
//! - `default` - Uses rustls for TLS
//! - `rustls` - Use rustls for TLS (recommended)
//! - `native-tls` - Use system native TLS

pub mod build;
mod error;
mod resolver;

pub use error::{Error, Result};
pub use resolver::Resolver;

// Re-export core types
pub use cloudfinder_core::{
    candidate_order, dedup_candidates, is_private_network, prepare_candidates,
    reduce_source_blocks, sort_candidates, AddressFamily, CoreError, InsertOutcome, InsertStats,
    NetworkBlock, PrefixTrie, Provider, BLOB_VERSION,
};

// Re-export sources
pub use cloudfinder_sources::{
    feeds, Aggregator, AsnTable, FetchConfig, Fetcher, FetcherBuilder, RetryConfig, Source,
    SourceContext, SourceError, SourceRegistry,
};

// Re-export runtime for convenience
pub use tokio;
