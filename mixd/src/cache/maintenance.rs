use std::sync::Arc;
use std::time::Duration;
use anyhow::Result;
use chrono::Utc;
use tokio_util::sync::CancellationToken;
use crate::cache::TtlCache;
use crate::config::CacheConfig;

/// Cache maintenance loop. Without `prune_after_secs` it never evicts.
pub async fn run(
    cache: Arc<TtlCache>,
    config: CacheConfig,
    cancel: CancellationToken,
) -> Result<()> {
    let Some(prune_after) = config.prune_after_secs.map(Duration::from_secs) else {
        tracing::info!("Cache pruning disabled; entries are kept until superseded");
        cancel.cancelled().await;
        return Ok(());
    };

    let mut maintenance_interval = tokio::time::interval(
        Duration::from_secs(config.maintenance_interval_secs)
    );

    loop {
        tokio::select! {
            _ = maintenance_interval.tick() => {
                let pruned = cache.prune_older_than(prune_after, Utc::now());
                if pruned > 0 {
                    tracing::debug!("Pruned {} cache entries, {} remain", pruned, cache.len());
                }
            }
            _ = cancel.cancelled() => {
                tracing::info!("Cache maintenance shutting down");
                break;
            }
        }
    }

    Ok(())
}
