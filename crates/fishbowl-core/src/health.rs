//! Health probes that can never fail their caller.
//!
//! A [`HealthProbe`] reports whether some subsystem is usable. [`run_probe`]
//! runs one in its own task under a timeout and folds every way it can go
//! wrong (an error, a panic, running too long) into `false`.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

/// Error type probes may return. Any error counts as unhealthy.
pub type ProbeError = Box<dyn std::error::Error + Send + Sync>;

/// A side-effect-free check of one subsystem.
///
/// # Examples
///
/// ```rust
/// use fishbowl_core::health::{HealthProbe, ProbeError, run_probe};
/// use async_trait::async_trait;
/// use std::sync::Arc;
/// use std::time::Duration;
///
/// struct AlwaysUp;
///
/// #[async_trait]
/// impl HealthProbe for AlwaysUp {
///     async fn probe(&self) -> Result<bool, ProbeError> {
///         Ok(true)
///     }
/// }
///
/// # #[tokio::main]
/// # async fn main() {
/// assert!(run_probe("always-up", Arc::new(AlwaysUp), Duration::from_secs(1)).await);
/// # }
/// ```
#[async_trait]
pub trait HealthProbe: Send + Sync {
    /// Check the subsystem.
    ///
    /// Returns `Ok(true)` when healthy. `Ok(false)` and `Err(_)` both mean
    /// unhealthy; the error only adds detail for logs.
    async fn probe(&self) -> Result<bool, ProbeError>;
}

/// Run `probe` with a deadline, converting every failure mode to `false`.
///
/// The probe runs on a spawned task so a panic inside it is contained. A
/// probe that outlives `timeout` is aborted.
#[cfg_attr(not(feature = "tracing"), allow(unused_variables))]
pub async fn run_probe(name: &str, probe: Arc<dyn HealthProbe>, timeout: Duration) -> bool {
    let mut task = tokio::spawn(async move { probe.probe().await });

    match tokio::time::timeout(timeout, &mut task).await {
        Ok(Ok(Ok(healthy))) => {
            #[cfg(feature = "tracing")]
            tracing::debug!(probe = name, healthy, "Health probe completed");
            healthy
        }
        Ok(Ok(Err(err))) => {
            #[cfg(feature = "tracing")]
            tracing::warn!(probe = name, error = %err, "Health probe failed");
            false
        }
        Ok(Err(join_err)) => {
            #[cfg(feature = "tracing")]
            tracing::warn!(probe = name, error = %join_err, "Health probe panicked");
            false
        }
        Err(_) => {
            task.abort();
            #[cfg(feature = "tracing")]
            tracing::warn!(
                probe = name,
                timeout_ms = timeout.as_millis() as u64,
                "Health probe timed out"
            );
            false
        }
    }
}
