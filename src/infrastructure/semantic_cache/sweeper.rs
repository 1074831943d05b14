//! Background task that drops expired cache entries

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::domain::semantic_cache::SemanticCache;
use crate::infrastructure::observability::metrics;

/// Spawn a sweeper running `cleanup_expired` every `interval` until `shutdown` fires
pub fn spawn_cache_sweeper(
    cache: Arc<dyn SemanticCache>,
    interval: Duration,
    shutdown: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        // The first tick completes immediately
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    debug!("Semantic cache sweeper stopped");
                    break;
                }
                _ = ticker.tick() => {
                    match cache.cleanup_expired().await {
                        Ok(0) => {}
                        Ok(removed) => debug!(removed, "Swept expired semantic cache entries"),
                        Err(e) => {
                            metrics::record_cache_degraded("sweep");
                            warn!("Semantic cache sweep failed: {}", e);
                        }
                    }
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::semantic_cache::SemanticCacheConfig;
    use crate::infrastructure::semantic_cache::InMemorySemanticCache;

    #[tokio::test]
    async fn test_sweeper_removes_expired_entries() {
        let cache = Arc::new(InMemorySemanticCache::new(
            SemanticCacheConfig::new().with_dimensions(2),
        ));
        cache
            .put(vec![1.0, 0.0], "stale", serde_json::json!(1), Some(Duration::ZERO))
            .await
            .unwrap();

        let shutdown = CancellationToken::new();
        let handle = spawn_cache_sweeper(cache.clone(), Duration::from_millis(10), shutdown.clone());

        tokio::time::sleep(Duration::from_millis(100)).await;

        assert_eq!(cache.stats().await.unwrap().entry_count, 0);

        shutdown.cancel();
        handle.await.unwrap();
    }
}
