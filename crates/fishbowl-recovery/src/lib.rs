#![deny(unsafe_code)]
#![warn(missing_docs)]

//! Error recovery for Fishbowl IPC operations.
//!
//! When an IPC handler fails it hands the error and a [`RecoveryContext`] to
//! the [`ErrorRecoveryManager`], which:
//!
//! - Rejects calls on channels whose **circuit breaker** is open
//! - Dispatches to the first **strategy** that recognizes the error
//! - Enforces a **retry ceiling** per strategy and channel
//! - Reports a [`RecoveryResult`] the handler can return to the renderer
//!
//! Five strategies are built in (see [`strategies`]); applications register
//! their own with [`ErrorRecoveryManager::add_strategy`], for example a
//! [`ClosureStrategy`].
//!
//! # Examples
//!
//! ```rust,no_run
//! use fishbowl_recovery::prelude::*;
//! use std::sync::Arc;
//!
//! # async fn example(services: RecoveryServices) -> fishbowl_recovery::Result<()> {
//! let manager = ErrorRecoveryManager::new(ErrorRecoveryConfig::from_env(), services);
//!
//! manager
//!     .add_strategy(
//!         "rate-limit",
//!         Arc::new(ClosureStrategy::matching_keywords(&["rate limit"], |_, _| {
//!             Box::pin(async { Ok(RecoveryOutcome::failed("Rate limited, retry later")) })
//!         })),
//!     )
//!     .await;
//!
//! let err = std::io::Error::other("keytar operation failed");
//! let result = manager
//!     .recover_from_error(&err, &RecoveryContext::new("secure:credentials:set"))
//!     .await?;
//! assert!(result.is_degraded());
//! # Ok(())
//! # }
//! ```

mod health;

pub mod config;
pub mod context;
pub mod error;
pub mod manager;
pub mod registry;
pub mod result;
pub mod services;
pub mod stats;
pub mod strategies;
pub mod strategy;

pub use config::ErrorRecoveryConfig;
pub use context::RecoveryContext;
pub use error::{OperationError, RecoveryError, Result};
pub use manager::ErrorRecoveryManager;
pub use registry::StrategyRegistry;
pub use result::RecoveryResult;
pub use services::{
    CacheCleaner, CredentialStore, DatabaseConnector, MemoryMonitor, MemoryUsage,
    RecoveryServices, RecoveryServicesBuilder, SystemMemoryMonitor,
};
pub use stats::{HealthReport, RecoveryStats};
pub use strategy::{ClosureStrategy, RecoveryOutcome, RecoveryStrategy};

pub use fishbowl_core::{CircuitBreakerState, CircuitState};

/// Convenient re-exports of commonly used items.
pub mod prelude {
    pub use crate::config::ErrorRecoveryConfig;
    pub use crate::context::RecoveryContext;
    pub use crate::error::{OperationError, RecoveryError, Result};
    pub use crate::manager::ErrorRecoveryManager;
    pub use crate::result::RecoveryResult;
    pub use crate::services::{
        CacheCleaner, CredentialStore, DatabaseConnector, RecoveryServices,
    };
    pub use crate::stats::{HealthReport, RecoveryStats};
    pub use crate::strategy::{ClosureStrategy, RecoveryOutcome, RecoveryStrategy};
}
