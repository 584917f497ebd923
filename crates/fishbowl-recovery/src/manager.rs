//! The error recovery orchestrator

use crate::config::ErrorRecoveryConfig;
use crate::context::RecoveryContext;
use crate::error::{OperationError, Result};
use crate::health::HealthProbes;
use crate::registry::StrategyRegistry;
use crate::result::RecoveryResult;
use crate::services::RecoveryServices;
use crate::stats::{HealthReport, RecoveryStats};
use crate::strategies;
use crate::strategy::{RecoveryOutcome, RecoveryStrategy};
use fishbowl_core::circuit::CircuitBreakerTracker;
use fishbowl_core::retry::{RetryAttemptTracker, RetryDelay};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, error, info, warn};

/// Decides how to respond when an IPC operation fails.
///
/// For each failure the manager:
///
/// 1. rejects the call if the channel's circuit breaker is open, or is
///    half-open with its single probe already in flight,
/// 2. picks the first registered strategy that can handle the error,
/// 3. refuses if that strategy has used up its attempts on this channel,
/// 4. runs the strategy and feeds the outcome back into both trackers.
///
/// Expected failures come back as `Ok(RecoveryResult)` with
/// `success: false`. Only a strategy that errors outright produces `Err`.
///
/// The manager is `Send + Sync`; share one instance per process behind an
/// `Arc`. No lock is held while a strategy runs.
///
/// # Examples
///
/// ```rust,no_run
/// use fishbowl_recovery::{ErrorRecoveryConfig, ErrorRecoveryManager, RecoveryContext, RecoveryServices};
/// # async fn example(services: RecoveryServices) -> fishbowl_recovery::Result<()> {
/// let manager = ErrorRecoveryManager::new(ErrorRecoveryConfig::default(), services);
///
/// let failure = std::io::Error::other("database connection failed");
/// let result = manager
///     .recover_from_error(&failure, &RecoveryContext::new("db:agents:create"))
///     .await?;
///
/// if result.success {
///     // re-issue the IPC call
/// }
/// # Ok(())
/// # }
/// ```
pub struct ErrorRecoveryManager {
    config: ErrorRecoveryConfig,
    registry: RwLock<StrategyRegistry>,
    circuits: Mutex<CircuitBreakerTracker>,
    retries: Mutex<RetryAttemptTracker>,
    probes: HealthProbes,
}

impl ErrorRecoveryManager {
    /// Create a manager with the built-in strategies registered.
    ///
    /// An invalid configuration is logged and used as given; use
    /// [`try_new`](Self::try_new) to reject it instead.
    pub fn new(config: ErrorRecoveryConfig, services: RecoveryServices) -> Self {
        if let Err(err) = config.validate() {
            warn!(error = %err, "Error recovery manager created with invalid configuration");
        }

        let mut registry = StrategyRegistry::new();
        for (name, strategy) in strategies::builtin(&services) {
            registry.add(name, strategy);
        }

        info!(
            strategies = registry.len(),
            circuit_breaker = config.circuit_breaker_enabled,
            retry = config.retry_enabled,
            "Error recovery manager initialized"
        );

        Self {
            circuits: Mutex::new(CircuitBreakerTracker::new(config.circuit_breaker())),
            retries: Mutex::new(RetryAttemptTracker::new()),
            probes: HealthProbes::new(&services, config.memory_usage_threshold),
            registry: RwLock::new(registry),
            config,
        }
    }

    /// Create a manager, rejecting an invalid configuration.
    pub fn try_new(config: ErrorRecoveryConfig, services: RecoveryServices) -> Result<Self> {
        config.validate()?;
        Ok(Self::new(config, services))
    }

    /// The configuration this manager runs with.
    pub fn config(&self) -> &ErrorRecoveryConfig {
        &self.config
    }

    /// Try to recover from `error`, raised by the operation described by
    /// `context`.
    ///
    /// Retry ceilings are checked after the circuit breaker. A strategy that
    /// had used up its attempts on `channel` by the time the breaker tripped
    /// keeps answering "Max retry attempts exceeded" once the breaker turns
    /// half-open, so the breaker cannot close through it. Clear the counter
    /// with [`reset_retry_attempts`](Self::reset_retry_attempts), or enable
    /// [`reset_retries_on_success`](ErrorRecoveryConfig::reset_retries_on_success)
    /// so successful channels never accumulate attempts.
    ///
    /// # Errors
    ///
    /// Returns the strategy's own error when it fails outright rather than
    /// reporting an unsuccessful outcome. The channel's circuit breaker has
    /// already counted the failure by then.
    #[tracing::instrument(skip(self, error, context), fields(channel = %context.channel))]
    pub async fn recover_from_error(
        &self,
        error: &OperationError,
        context: &RecoveryContext,
    ) -> Result<RecoveryResult> {
        let channel = context.channel.as_str();

        if !self.circuits.lock().await.try_acquire(channel) {
            warn!("Circuit breaker open, skipping recovery");
            return Ok(RecoveryResult::circuit_open(channel));
        }

        let matched = self.registry.read().await.find_matching(error);
        let Some((name, strategy)) = matched else {
            self.circuits.lock().await.release_probe(channel);
            debug!(error = %error, "No recovery strategy matched");
            return Ok(RecoveryResult::no_strategy());
        };

        let max_retries = strategy
            .max_retries()
            .unwrap_or(self.config.default_max_retries);

        let attempt = {
            let mut retries = self.retries.lock().await;
            if self.config.retry_enabled && retries.is_exhausted(&name, channel, max_retries) {
                let attempts = retries.current_attempts(&name, channel);
                drop(retries);
                self.circuits.lock().await.release_probe(channel);
                warn!(strategy = %name, attempts, max_retries, "Max retry attempts exceeded");
                return Ok(RecoveryResult::retries_exhausted(&name, attempts));
            }
            retries.next_attempt(&name, channel)
        };

        info!(strategy = %name, attempt, max_retries, error = %error, "Attempting recovery");

        let outcome = match strategy.recover(error, context).await {
            Ok(outcome) => self.apply_degradation_policy(&name, outcome),
            Err(err) => {
                self.circuits.lock().await.record_failure(channel);
                error!(strategy = %name, attempt, error = %err, "Recovery strategy failed");
                return Err(err);
            }
        };

        if outcome.success {
            self.circuits.lock().await.record_success(channel);
            if self.config.reset_retries_on_success {
                self.retries.lock().await.reset(&name, channel);
            }
            info!(strategy = %name, attempt, fallback = ?outcome.fallback, "Recovery succeeded");

            Ok(RecoveryResult {
                success: true,
                message: outcome
                    .message
                    .unwrap_or_else(|| format!("Recovered using {name}")),
                strategy: name,
                retry_attempts: attempt,
                fallback: outcome.fallback,
                retry_after: None,
            })
        } else {
            let state = self.circuits.lock().await.record_failure(channel);
            let retry_after = RetryDelay::new(self.retry_delay_for(&*strategy))
                .delay_for_attempt(attempt);
            warn!(
                strategy = %name,
                attempt,
                circuit = %state,
                retry_after_ms = retry_after.as_millis() as u64,
                "Recovery unsuccessful"
            );

            Ok(RecoveryResult {
                success: false,
                message: outcome
                    .message
                    .unwrap_or_else(|| format!("Recovery failed for {name}")),
                strategy: name,
                retry_attempts: attempt,
                fallback: outcome.fallback,
                retry_after: Some(retry_after),
            })
        }
    }

    /// Register `strategy` under `name`, replacing any previous entry.
    ///
    /// New names are consulted after every existing strategy.
    pub async fn add_strategy(&self, name: impl Into<String>, strategy: Arc<dyn RecoveryStrategy>) {
        let name = name.into();
        debug!(strategy = %name, "Registering recovery strategy");
        self.registry.write().await.add(name, strategy);
    }

    /// Unregister the strategy named `name`, if present.
    pub async fn remove_strategy(&self, name: &str) {
        if self.registry.write().await.remove(name) {
            debug!(strategy = name, "Removed recovery strategy");
        }
    }

    /// Clear the attempt counter for `strategy` on `channel`.
    pub async fn reset_retry_attempts(&self, strategy: &str, channel: &str) {
        self.retries.lock().await.reset(strategy, channel);
        debug!(strategy, channel, "Retry attempts reset");
    }

    /// Close and forget the circuit breaker for `channel`.
    pub async fn reset_circuit_breaker(&self, channel: &str) {
        self.circuits.lock().await.reset(channel);
    }

    /// Snapshot of registered strategies, attempt counters, and breakers.
    pub async fn get_recovery_stats(&self) -> RecoveryStats {
        let strategies = self.registry.read().await.names();
        let active_retries = self.retries.lock().await.snapshot();
        let circuit_breakers = self.circuits.lock().await.snapshot();

        RecoveryStats {
            strategies,
            active_retries,
            circuit_breakers,
        }
    }

    /// Probe every subsystem. Never fails; broken probes report `false`.
    pub async fn perform_health_check(&self) -> HealthReport {
        let report = self.probes.run(self.config.health_check_timeout).await;
        if report.all_healthy() {
            debug!(?report, "Health check passed");
        } else {
            warn!(?report, "Health check found unhealthy subsystems");
        }
        report
    }

    fn apply_degradation_policy(&self, name: &str, outcome: RecoveryOutcome) -> RecoveryOutcome {
        if outcome.success && outcome.fallback == Some(true) && !self.config.graceful_degradation {
            warn!(strategy = name, "Fallback recovery rejected, graceful degradation disabled");
            return RecoveryOutcome {
                success: false,
                message: Some(format!("Fallback recovery disabled for {name}")),
                fallback: Some(true),
            };
        }
        outcome
    }

    fn retry_delay_for(&self, strategy: &dyn RecoveryStrategy) -> std::time::Duration {
        strategy
            .retry_delay()
            .unwrap_or(self.config.default_retry_delay)
    }
}

impl std::fmt::Debug for ErrorRecoveryManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ErrorRecoveryManager")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
