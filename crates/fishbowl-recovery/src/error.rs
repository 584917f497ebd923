//! Error types for the recovery manager
//!
//! Expected failure paths (no matching strategy, open circuit, exhausted
//! retries, a strategy reporting failure) are not errors: they come back as a
//! [`RecoveryResult`](crate::RecoveryResult). [`RecoveryError`] is reserved for
//! strategies that fail outright and for configuration problems.

use thiserror::Error;

/// Result type alias for recovery operations.
pub type Result<T> = std::result::Result<T, RecoveryError>;

/// The error a failed operation hands to the manager.
///
/// Strategies inspect it (message, source chain, or downcast) to decide
/// whether they apply.
pub type OperationError = dyn std::error::Error + Send + Sync + 'static;

/// Errors raised while recovering.
///
/// Collaborator and strategy variants display the underlying message
/// unchanged so it reaches the IPC caller as-is.
#[derive(Debug, Error)]
pub enum RecoveryError {
    /// The database connection could not be re-established.
    #[error("{0}")]
    Database(String),

    /// The credential store (or its fallback) is unusable.
    #[error("{0}")]
    CredentialStore(String),

    /// Filesystem repair failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A strategy failed in a way it could not report as an outcome.
    #[error("{message}")]
    Strategy {
        /// Name of the strategy that failed
        strategy: String,
        /// Underlying failure message
        message: String,
    },

    /// Invalid configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Configuration or report (de)serialization failed.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl RecoveryError {
    /// Create a strategy error.
    pub fn strategy(strategy: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Strategy {
            strategy: strategy.into(),
            message: message.into(),
        }
    }
}
