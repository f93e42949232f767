//! Provider feeds and concurrent aggregation for cloudfinder.
//!
//! A [`Source`] produces the network blocks of one provider. The
//! [`SourceRegistry`] holds exactly one source per provider and the
//! [`Aggregator`] runs them all concurrently, sharing one [`Fetcher`] and
//! one lazily loaded [`AsnTable`], to produce the candidate list the prefix
//! tries are built from.
//!
//! # Example
//!
//! ```rust,no_run
//! use cloudfinder_sources::{Aggregator, FetchConfig, SourceContext, SourceRegistry};
//!
//! # async fn run() -> cloudfinder_sources::Result<()> {
//! let ctx = SourceContext::from_config(&FetchConfig::default())?;
//! let aggregator = Aggregator::new(SourceRegistry::builtin()?, ctx);
//! let candidates = aggregator.collect().await?;
//! println!("{} candidate blocks", candidates.len());
//! # Ok(())
//! # }
//! ```

mod aggregator;
mod asn;
mod config;
mod error;
mod fetch;
pub mod feeds;
mod source;

pub use aggregator::Aggregator;
pub use asn::AsnTable;
pub use config::*;
pub use error::{Result, SourceError};
pub use fetch::{Fetcher, FetcherBuilder};
pub use source::{Source, SourceContext, SourceRegistry};
