//! Recovery strategy trait and helpers
//!
//! A strategy pairs an applicability predicate with a corrective action. The
//! manager asks each registered strategy in turn whether it can handle an
//! error and runs the first that says yes.

use crate::context::RecoveryContext;
use crate::error::{OperationError, Result};
use async_trait::async_trait;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

/// What a strategy reports after running.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecoveryOutcome {
    /// Whether the failure was dealt with
    pub success: bool,

    /// Explanation passed through to the caller
    pub message: Option<String>,

    /// Set when recovery only succeeded through a degraded path
    pub fallback: Option<bool>,
}

impl RecoveryOutcome {
    /// Successful recovery with a message.
    pub fn recovered(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            fallback: None,
        }
    }

    /// Successful recovery through a fallback path.
    pub fn degraded(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            fallback: Some(true),
        }
    }

    /// Recovery was attempted and did not work.
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
            fallback: None,
        }
    }
}

/// A pluggable recovery policy.
///
/// Returning `Ok` with `success: false` is an ordinary failure the manager
/// reports back. Returning `Err` means the strategy itself broke; the manager
/// still counts it against the channel's circuit breaker and then hands the
/// error to the caller unchanged.
#[async_trait]
pub trait RecoveryStrategy: Send + Sync {
    /// Whether this strategy applies to `error`.
    fn can_recover(&self, error: &OperationError) -> bool;

    /// Try to recover from `error`.
    async fn recover(
        &self,
        error: &OperationError,
        context: &RecoveryContext,
    ) -> Result<RecoveryOutcome>;

    /// Attempt ceiling per channel. `None` uses the manager default.
    fn max_retries(&self) -> Option<u32> {
        None
    }

    /// Advisory delay between attempts. `None` uses the manager default.
    fn retry_delay(&self) -> Option<Duration> {
        None
    }
}

/// Whether `error`, or anything in its source chain, mentions one of
/// `keywords`.
///
/// Messages are lowercased before matching, so keywords must be lowercase.
pub fn error_mentions(error: &OperationError, keywords: &[&str]) -> bool {
    let mut current: Option<&(dyn std::error::Error + 'static)> = Some(error);
    while let Some(err) = current {
        let message = err.to_string().to_lowercase();
        if keywords.iter().any(|keyword| message.contains(keyword)) {
            return true;
        }
        current = err.source();
    }
    false
}

/// Predicate used by [`ClosureStrategy`].
pub type RecoverPredicate = Arc<dyn Fn(&OperationError) -> bool + Send + Sync>;

/// Action used by [`ClosureStrategy`].
///
/// Receives the error's message (the error itself is borrowed and cannot move
/// into a `'static` future) and a clone of the context.
pub type RecoverAction = Arc<
    dyn Fn(String, RecoveryContext) -> Pin<Box<dyn Future<Output = Result<RecoveryOutcome>> + Send>>
        + Send
        + Sync,
>;

/// A strategy built from closures, for callers that do not need a type.
///
/// # Examples
///
/// ```rust
/// use fishbowl_recovery::strategy::{ClosureStrategy, RecoveryOutcome};
/// use std::time::Duration;
///
/// let strategy = ClosureStrategy::matching_keywords(&["rate limit"], |_message, _context| {
///     Box::pin(async { Ok(RecoveryOutcome::recovered("Backed off")) })
/// })
/// .with_max_retries(2)
/// .with_retry_delay(Duration::from_secs(5));
/// ```
#[derive(Clone)]
pub struct ClosureStrategy {
    predicate: RecoverPredicate,
    action: RecoverAction,
    max_retries: Option<u32>,
    retry_delay: Option<Duration>,
}

impl ClosureStrategy {
    /// Build a strategy from a predicate and an action.
    pub fn new<P, A>(predicate: P, action: A) -> Self
    where
        P: Fn(&OperationError) -> bool + Send + Sync + 'static,
        A: Fn(String, RecoveryContext) -> Pin<Box<dyn Future<Output = Result<RecoveryOutcome>> + Send>>
            + Send
            + Sync
            + 'static,
    {
        Self {
            predicate: Arc::new(predicate),
            action: Arc::new(action),
            max_retries: None,
            retry_delay: None,
        }
    }

    /// Build a strategy that applies when the error mentions any keyword.
    pub fn matching_keywords<A>(keywords: &[&str], action: A) -> Self
    where
        A: Fn(String, RecoveryContext) -> Pin<Box<dyn Future<Output = Result<RecoveryOutcome>> + Send>>
            + Send
            + Sync
            + 'static,
    {
        let keywords: Vec<String> = keywords.iter().map(|k| k.to_lowercase()).collect();
        Self::new(
            move |error| {
                let keywords: Vec<&str> = keywords.iter().map(String::as_str).collect();
                error_mentions(error, &keywords)
            },
            action,
        )
    }

    /// Set the attempt ceiling.
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = Some(max_retries);
        self
    }

    /// Set the advisory retry delay.
    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = Some(delay);
        self
    }
}

impl std::fmt::Debug for ClosureStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClosureStrategy")
            .field("max_retries", &self.max_retries)
            .field("retry_delay", &self.retry_delay)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl RecoveryStrategy for ClosureStrategy {
    fn can_recover(&self, error: &OperationError) -> bool {
        (self.predicate)(error)
    }

    async fn recover(
        &self,
        error: &OperationError,
        context: &RecoveryContext,
    ) -> Result<RecoveryOutcome> {
        (self.action)(error.to_string(), context.clone()).await
    }

    fn max_retries(&self) -> Option<u32> {
        self.max_retries
    }

    fn retry_delay(&self) -> Option<Duration> {
        self.retry_delay
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RecoveryError;
    use std::io;

    #[derive(Debug, thiserror::Error)]
    #[error("IPC call failed")]
    struct Wrapped(#[source] io::Error);

    #[test]
    fn test_error_mentions_is_case_insensitive() {
        let err = io::Error::other("Database Connection FAILED");
        assert!(error_mentions(&err, &["database"]));
        assert!(!error_mentions(&err, &["keytar"]));
    }

    #[test]
    fn test_error_mentions_walks_source_chain() {
        let err = Wrapped(io::Error::other("keytar operation failed"));
        assert!(error_mentions(&err, &["keytar"]));
    }

    #[tokio::test]
    async fn test_closure_strategy() {
        let strategy = ClosureStrategy::matching_keywords(&["Quota"], |message, context| {
            Box::pin(async move {
                Ok(RecoveryOutcome::recovered(format!(
                    "{} on {}",
                    message, context.channel
                )))
            })
        })
        .with_max_retries(4);

        let err = io::Error::other("quota exceeded");
        assert!(strategy.can_recover(&err));
        assert!(!strategy.can_recover(&io::Error::other("other")));
        assert_eq!(strategy.max_retries(), Some(4));
        assert_eq!(strategy.retry_delay(), None);

        let outcome = strategy
            .recover(&err, &RecoveryContext::new("api:usage"))
            .await
            .unwrap();
        assert!(outcome.success);
        assert_eq!(outcome.message.as_deref(), Some("quota exceeded on api:usage"));
    }

    #[tokio::test]
    async fn test_closure_strategy_error_propagates() {
        let strategy = ClosureStrategy::new(
            |_| true,
            |_, _| Box::pin(async { Err(RecoveryError::strategy("custom", "broken")) }),
        );

        let err = strategy
            .recover(&io::Error::other("x"), &RecoveryContext::new("c"))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "broken");
    }

    #[test]
    fn test_outcome_constructors() {
        assert_eq!(RecoveryOutcome::degraded("x").fallback, Some(true));
        assert!(RecoveryOutcome::degraded("x").success);
        assert!(!RecoveryOutcome::failed("x").success);
        assert_eq!(RecoveryOutcome::recovered("x").fallback, None);
    }
}
