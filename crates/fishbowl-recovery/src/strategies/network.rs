use crate::context::RecoveryContext;
use crate::error::{OperationError, Result};
use crate::strategy::{RecoveryOutcome, RecoveryStrategy, error_mentions};
use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

const KEYWORDS: &[&str] = &["network", "timeout", "econnreset", "econnrefused"];

/// Signals the caller to re-issue a request that failed on the network.
///
/// Makes no network call itself; the retry ceiling bounds how often a
/// channel can be told to try again.
#[derive(Debug, Default, Clone, Copy)]
pub struct NetworkStrategy;

#[async_trait]
impl RecoveryStrategy for NetworkStrategy {
    fn can_recover(&self, error: &OperationError) -> bool {
        error_mentions(error, KEYWORDS)
    }

    async fn recover(
        &self,
        _error: &OperationError,
        context: &RecoveryContext,
    ) -> Result<RecoveryOutcome> {
        debug!(channel = %context.channel, "Network failure, caller may re-issue request");
        Ok(RecoveryOutcome::recovered(
            "Network error is transient, request may be retried",
        ))
    }

    fn max_retries(&self) -> Option<u32> {
        Some(5)
    }

    fn retry_delay(&self) -> Option<Duration> {
        Some(Duration::from_millis(2000))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::io;

    #[rstest]
    #[case("network unreachable")]
    #[case("Request timeout after 30000ms")]
    #[case("read ECONNRESET")]
    #[case("connect ECONNREFUSED 127.0.0.1:11434")]
    fn test_matches_network_errors(#[case] message: &str) {
        assert!(NetworkStrategy.can_recover(&io::Error::other(message.to_string())));
    }

    #[test]
    fn test_ignores_other_errors() {
        assert!(!NetworkStrategy.can_recover(&io::Error::other("permission denied")));
    }

    #[tokio::test]
    async fn test_reports_success() {
        let outcome = NetworkStrategy
            .recover(
                &io::Error::other("network unreachable"),
                &RecoveryContext::new("api:chat:send"),
            )
            .await
            .unwrap();
        assert!(outcome.success);
        assert_eq!(outcome.fallback, None);
    }
}
