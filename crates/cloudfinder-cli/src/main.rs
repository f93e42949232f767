//! cloudfinder - classify IP addresses by cloud provider
//!
//! Builds the provider lookup data from public feeds and answers queries
//! against it.

use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    cloudfinder_cli::run().await
}
