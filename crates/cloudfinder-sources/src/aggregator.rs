//! Concurrent collection of every registered source.

use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::JoinSet;
use tracing::{error, info, warn};

use cloudfinder_core::{prepare_candidates, reduce_source_blocks, NetworkBlock};

use crate::error::Result;
use crate::source::{SourceContext, SourceRegistry};

/// Runs all sources of a registry and merges their output
pub struct Aggregator {
    registry: SourceRegistry,
    ctx: SourceContext,
}

impl Aggregator {
    /// Create an aggregator over a validated registry
    #[must_use]
    pub const fn new(registry: SourceRegistry, ctx: SourceContext) -> Self {
        Self { registry, ctx }
    }

    /// Shared context handed to every source
    #[must_use]
    pub const fn context(&self) -> &SourceContext {
        &self.ctx
    }

    /// Run every source concurrently and return the merged candidate list,
    /// deduplicated and in candidate order.
    ///
    /// A failing or panicking source contributes nothing. A fatal error
    /// (the shared ASN table could not be loaded) is returned once every
    /// task has finished.
    pub async fn collect(&self) -> Result<Vec<NetworkBlock>> {
        let merged = Arc::new(Mutex::new(Vec::new()));
        let mut tasks = JoinSet::new();

        for source in self.registry.iter() {
            let source = Arc::clone(source);
            let ctx = self.ctx.clone();
            let merged = Arc::clone(&merged);

            tasks.spawn(async move {
                let provider = source.provider();
                info!(provider = %provider, "collecting ranges");

                match source.produce(&ctx).await {
                    Ok(blocks) => {
                        let produced = blocks.len();
                        let blocks = reduce_source_blocks(
                            blocks.into_iter().map(|b| b.with_provider(provider)).collect(),
                        );
                        info!(provider = %provider, produced, blocks = blocks.len(), "source done");
                        merged.lock().await.extend(blocks);
                        Ok(())
                    }
                    Err(e) if e.is_fatal() => {
                        error!(provider = %provider, error = %e, "source failed fatally");
                        Err(e)
                    }
                    Err(e) => {
                        warn!(provider = %provider, error = %e, "source failed, contributing no blocks");
                        Ok(())
                    }
                }
            });
        }

        let mut fatal = None;
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    fatal.get_or_insert(e);
                }
                Err(e) => error!(error = %e, "source task panicked, contributing no blocks"),
            }
        }
        if let Some(e) = fatal {
            return Err(e);
        }

        let merged = std::mem::take(&mut *merged.lock().await);
        let candidates = prepare_candidates(merged);
        info!(blocks = candidates.len(), "aggregation complete");
        Ok(candidates)
    }
}
