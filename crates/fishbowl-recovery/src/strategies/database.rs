use crate::context::RecoveryContext;
use crate::error::{OperationError, Result};
use crate::services::DatabaseConnector;
use crate::strategy::{RecoveryOutcome, RecoveryStrategy, error_mentions};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

const KEYWORDS: &[&str] = &["database", "sqlite"];

/// Re-initializes the database connection.
///
/// A failed reconnect is returned as an error, not an outcome, so the
/// connector's own message reaches the caller.
pub struct DatabaseConnectionStrategy {
    database: Arc<dyn DatabaseConnector>,
}

impl DatabaseConnectionStrategy {
    /// Strategy reconnecting through `database`.
    pub fn new(database: Arc<dyn DatabaseConnector>) -> Self {
        Self { database }
    }
}

#[async_trait]
impl RecoveryStrategy for DatabaseConnectionStrategy {
    fn can_recover(&self, error: &OperationError) -> bool {
        error_mentions(error, KEYWORDS)
    }

    async fn recover(
        &self,
        _error: &OperationError,
        context: &RecoveryContext,
    ) -> Result<RecoveryOutcome> {
        self.database.reconnect().await?;
        info!(channel = %context.channel, "Database connection re-established");
        Ok(RecoveryOutcome::recovered("Database connection re-established"))
    }

    fn max_retries(&self) -> Option<u32> {
        Some(3)
    }

    fn retry_delay(&self) -> Option<Duration> {
        Some(Duration::from_millis(1000))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RecoveryError;
    use rstest::rstest;
    use std::io;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct CountingDb {
        reconnects: AtomicU32,
        fail_with: Option<&'static str>,
    }

    #[async_trait]
    impl DatabaseConnector for CountingDb {
        async fn reconnect(&self) -> Result<()> {
            self.reconnects.fetch_add(1, Ordering::SeqCst);
            match self.fail_with {
                Some(message) => Err(RecoveryError::Database(message.to_string())),
                None => Ok(()),
            }
        }

        async fn ping(&self) -> Result<bool> {
            Ok(true)
        }
    }

    fn strategy(fail_with: Option<&'static str>) -> (DatabaseConnectionStrategy, Arc<CountingDb>) {
        let db = Arc::new(CountingDb {
            reconnects: AtomicU32::new(0),
            fail_with,
        });
        (DatabaseConnectionStrategy::new(db.clone()), db)
    }

    #[rstest]
    #[case("database connection failed", true)]
    #[case("SQLITE_BUSY: database is locked", true)]
    #[case("Database is closed", true)]
    #[case("network unreachable", false)]
    fn test_matching(#[case] message: &str, #[case] expected: bool) {
        let (strategy, _) = strategy(None);
        assert_eq!(strategy.can_recover(&io::Error::other(message.to_string())), expected);
    }

    #[tokio::test]
    async fn test_reconnects() {
        let (strategy, db) = strategy(None);
        let outcome = strategy
            .recover(
                &io::Error::other("database connection failed"),
                &RecoveryContext::new("db:agents:create"),
            )
            .await
            .unwrap();

        assert!(outcome.success);
        assert_eq!(outcome.fallback, None);
        assert_eq!(db.reconnects.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_reconnect_failure_propagates_message() {
        let (strategy, _) = strategy(Some("unable to open database file"));
        let err = strategy
            .recover(
                &io::Error::other("database connection failed"),
                &RecoveryContext::new("db:agents:create"),
            )
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "unable to open database file");
    }
}
