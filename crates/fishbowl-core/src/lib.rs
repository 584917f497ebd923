#![deny(unsafe_code)]
#![warn(missing_docs)]

//! Resilience primitives for the Fishbowl application.
//!
//! This crate holds the domain-free building blocks used by the IPC error
//! recovery layer:
//!
//! - **Circuit breaking** via [`CircuitBreakerTracker`]
//!   - Per-channel consecutive failure counting
//!   - Timeout-based half-open probing
//! - **Retry ceilings** via [`RetryAttemptTracker`]
//! - **Advisory backoff** via [`RetryDelay`] (computes waits, never sleeps)
//! - **Health probing** via the [`HealthProbe`] trait and [`run_probe`]
//!
//! None of these types perform locking. Owners wrap them in whatever
//! synchronization fits their runtime.
//!
//! # Examples
//!
//! ```rust
//! use fishbowl_core::prelude::*;
//! use std::time::Duration;
//!
//! let mut breaker = CircuitBreakerTracker::new(CircuitBreakerConfig {
//!     enabled: true,
//!     failure_threshold: 2,
//!     reset_timeout: Duration::from_secs(30),
//! });
//!
//! breaker.record_failure("db:agents:create");
//! assert!(!breaker.is_open("db:agents:create"));
//! breaker.record_failure("db:agents:create");
//! assert!(breaker.is_open("db:agents:create"));
//! ```

pub mod circuit;
pub mod health;
pub mod retry;

pub use circuit::{CircuitBreakerConfig, CircuitBreakerState, CircuitBreakerTracker, CircuitState};
pub use health::{HealthProbe, ProbeError, run_probe};
pub use retry::{RetryAttemptTracker, RetryDelay};

/// Convenient re-exports of commonly used items.
///
/// ```rust
/// use fishbowl_core::prelude::*;
/// ```
pub mod prelude {
    pub use crate::circuit::{
        CircuitBreakerConfig, CircuitBreakerState, CircuitBreakerTracker, CircuitState,
    };
    pub use crate::health::{HealthProbe, ProbeError, run_probe};
    pub use crate::retry::{RetryAttemptTracker, RetryDelay};
}
