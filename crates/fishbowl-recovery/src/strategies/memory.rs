use crate::context::RecoveryContext;
use crate::error::{OperationError, Result};
use crate::services::CacheCleaner;
use crate::strategy::{RecoveryOutcome, RecoveryStrategy, error_mentions};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

const KEYWORDS: &[&str] = &["memory", "heap"];

/// Drops the process-wide IPC cache to relieve memory pressure.
pub struct MemoryStrategy {
    cache: Option<Arc<dyn CacheCleaner>>,
}

impl MemoryStrategy {
    /// Strategy clearing `cache`, if one is configured.
    pub fn new(cache: Option<Arc<dyn CacheCleaner>>) -> Self {
        Self { cache }
    }
}

#[async_trait]
impl RecoveryStrategy for MemoryStrategy {
    fn can_recover(&self, error: &OperationError) -> bool {
        error_mentions(error, KEYWORDS)
    }

    async fn recover(
        &self,
        _error: &OperationError,
        context: &RecoveryContext,
    ) -> Result<RecoveryOutcome> {
        let released = match &self.cache {
            Some(cache) => cache.clear().await,
            None => 0,
        };
        info!(channel = %context.channel, released, "Memory cleanup performed");
        Ok(RecoveryOutcome::recovered("Memory cleanup performed"))
    }

    fn max_retries(&self) -> Option<u32> {
        Some(2)
    }

    fn retry_delay(&self) -> Option<Duration> {
        Some(Duration::from_millis(5000))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Cache {
        entries: AtomicUsize,
    }

    #[async_trait]
    impl CacheCleaner for Cache {
        async fn clear(&self) -> usize {
            self.entries.swap(0, Ordering::SeqCst)
        }
    }

    #[test]
    fn test_matching() {
        let strategy = MemoryStrategy::new(None);
        assert!(strategy.can_recover(&io::Error::other("JavaScript heap out of memory")));
        assert!(strategy.can_recover(&io::Error::other("Out of Memory")));
        assert!(!strategy.can_recover(&io::Error::other("disk full")));
    }

    #[tokio::test]
    async fn test_clears_cache() {
        let cache = Arc::new(Cache {
            entries: AtomicUsize::new(42),
        });
        let strategy = MemoryStrategy::new(Some(cache.clone()));

        let outcome = strategy
            .recover(
                &io::Error::other("heap limit reached"),
                &RecoveryContext::new("ipc:cache"),
            )
            .await
            .unwrap();

        assert!(outcome.success);
        assert_eq!(outcome.message.as_deref(), Some("Memory cleanup performed"));
        assert_eq!(cache.entries.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_without_cache_still_succeeds() {
        let outcome = MemoryStrategy::new(None)
            .recover(&io::Error::other("memory"), &RecoveryContext::new("c"))
            .await
            .unwrap();
        assert!(outcome.success);
    }
}
