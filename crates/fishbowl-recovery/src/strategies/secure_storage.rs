use crate::context::RecoveryContext;
use crate::error::{OperationError, Result};
use crate::services::CredentialStore;
use crate::strategy::{RecoveryOutcome, RecoveryStrategy, error_mentions};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

const KEYWORDS: &[&str] = &["keytar", "keychain", "secure storage", "secure-storage"];

/// Moves credential access to the fallback backend when the OS keychain is
/// unusable. Success is always degraded (`fallback: Some(true)`).
pub struct SecureStorageStrategy {
    credentials: Arc<dyn CredentialStore>,
}

impl SecureStorageStrategy {
    /// Strategy falling back through `credentials`.
    pub fn new(credentials: Arc<dyn CredentialStore>) -> Self {
        Self { credentials }
    }
}

#[async_trait]
impl RecoveryStrategy for SecureStorageStrategy {
    fn can_recover(&self, error: &OperationError) -> bool {
        error_mentions(error, KEYWORDS)
    }

    async fn recover(
        &self,
        error: &OperationError,
        context: &RecoveryContext,
    ) -> Result<RecoveryOutcome> {
        self.credentials.enable_fallback().await?;
        warn!(
            channel = %context.channel,
            error = %error,
            "Secure storage unavailable, using fallback credential store"
        );
        Ok(RecoveryOutcome::degraded(
            "Secure storage unavailable, using fallback credential store",
        ))
    }

    fn max_retries(&self) -> Option<u32> {
        Some(2)
    }

    fn retry_delay(&self) -> Option<Duration> {
        Some(Duration::from_millis(500))
    }
}
