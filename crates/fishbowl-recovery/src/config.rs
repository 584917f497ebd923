//! Recovery manager configuration

use crate::error::{RecoveryError, Result};
use fishbowl_core::circuit::CircuitBreakerConfig;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for [`ErrorRecoveryManager`](crate::ErrorRecoveryManager).
///
/// Serialized form uses camelCase keys with durations in milliseconds, so the
/// same JSON the settings layer already stores can be loaded directly:
///
/// ```rust
/// use fishbowl_recovery::ErrorRecoveryConfig;
/// use std::time::Duration;
///
/// let config = ErrorRecoveryConfig::from_json(r#"{
///     "circuitBreakerFailureThreshold": 3,
///     "circuitBreakerTimeout": 30000
/// }"#).unwrap();
///
/// assert_eq!(config.circuit_breaker_failure_threshold, 3);
/// assert_eq!(config.circuit_breaker_timeout, Duration::from_secs(30));
/// assert!(config.retry_enabled); // unspecified keys keep their defaults
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ErrorRecoveryConfig {
    /// Enable per-channel circuit breaking
    pub circuit_breaker_enabled: bool,

    /// Consecutive failures that open a channel's breaker
    pub circuit_breaker_failure_threshold: u32,

    /// How long an open breaker rejects attempts
    #[serde(with = "duration_ms")]
    pub circuit_breaker_timeout: Duration,

    /// Enforce per-strategy retry ceilings
    pub retry_enabled: bool,

    /// Ceiling for strategies that do not declare their own
    pub default_max_retries: u32,

    /// Advisory delay for strategies that do not declare their own
    #[serde(with = "duration_ms")]
    pub default_retry_delay: Duration,

    /// Suggested health check cadence. The manager never schedules checks.
    #[serde(with = "duration_ms")]
    pub health_check_interval: Duration,

    /// Allow fallback (degraded) recoveries to count as success
    pub graceful_degradation: bool,

    /// Clear a strategy's attempt counter after it recovers a channel.
    ///
    /// When off, a strategy that reaches its ceiling on a channel stays
    /// exhausted there until the counter is reset, even after the channel's
    /// circuit breaker turns half-open.
    pub reset_retries_on_success: bool,

    /// Deadline for each individual health probe
    #[serde(with = "duration_ms")]
    pub health_check_timeout: Duration,

    /// Fraction of system memory in use above which memory is unhealthy
    pub memory_usage_threshold: f64,
}

impl Default for ErrorRecoveryConfig {
    fn default() -> Self {
        Self {
            circuit_breaker_enabled: true,
            circuit_breaker_failure_threshold: 5,
            circuit_breaker_timeout: Duration::from_secs(60),
            retry_enabled: true,
            default_max_retries: 3,
            default_retry_delay: Duration::from_secs(1),
            health_check_interval: Duration::from_secs(30),
            graceful_degradation: true,
            reset_retries_on_success: false,
            health_check_timeout: Duration::from_secs(5),
            memory_usage_threshold: 0.9,
        }
    }
}

impl ErrorRecoveryConfig {
    /// Create a configuration with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a JSON configuration. Missing keys take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from environment variables.
    ///
    /// This will look for:
    /// - `FISHBOWL_RECOVERY_CIRCUIT_BREAKER_ENABLED` (`true`/`false`)
    /// - `FISHBOWL_RECOVERY_FAILURE_THRESHOLD`
    /// - `FISHBOWL_RECOVERY_CIRCUIT_TIMEOUT_MS`
    /// - `FISHBOWL_RECOVERY_RETRY_ENABLED` (`true`/`false`)
    /// - `FISHBOWL_RECOVERY_MAX_RETRIES`
    /// - `FISHBOWL_RECOVERY_RETRY_DELAY_MS`
    /// - `FISHBOWL_RECOVERY_GRACEFUL_DEGRADATION` (`true`/`false`)
    ///
    /// Unset or unparsable variables leave the default in place.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(enabled) = env_parse::<bool>("FISHBOWL_RECOVERY_CIRCUIT_BREAKER_ENABLED") {
            config.circuit_breaker_enabled = enabled;
        }
        if let Some(threshold) = env_parse::<u32>("FISHBOWL_RECOVERY_FAILURE_THRESHOLD") {
            config.circuit_breaker_failure_threshold = threshold;
        }
        if let Some(ms) = env_parse::<u64>("FISHBOWL_RECOVERY_CIRCUIT_TIMEOUT_MS") {
            config.circuit_breaker_timeout = Duration::from_millis(ms);
        }
        if let Some(enabled) = env_parse::<bool>("FISHBOWL_RECOVERY_RETRY_ENABLED") {
            config.retry_enabled = enabled;
        }
        if let Some(max_retries) = env_parse::<u32>("FISHBOWL_RECOVERY_MAX_RETRIES") {
            config.default_max_retries = max_retries;
        }
        if let Some(ms) = env_parse::<u64>("FISHBOWL_RECOVERY_RETRY_DELAY_MS") {
            config.default_retry_delay = Duration::from_millis(ms);
        }
        if let Some(enabled) = env_parse::<bool>("FISHBOWL_RECOVERY_GRACEFUL_DEGRADATION") {
            config.graceful_degradation = enabled;
        }

        config
    }

    /// Check the configuration for values the manager cannot work with.
    pub fn validate(&self) -> Result<()> {
        if self.circuit_breaker_failure_threshold == 0 {
            return Err(RecoveryError::Config(
                "circuitBreakerFailureThreshold must be at least 1".to_string(),
            ));
        }
        if !(self.memory_usage_threshold > 0.0 && self.memory_usage_threshold <= 1.0) {
            return Err(RecoveryError::Config(format!(
                "memoryUsageThreshold must be in (0, 1], got {}",
                self.memory_usage_threshold
            )));
        }
        Ok(())
    }

    /// Circuit breaker settings derived from this configuration.
    pub fn circuit_breaker(&self) -> CircuitBreakerConfig {
        CircuitBreakerConfig {
            enabled: self.circuit_breaker_enabled,
            failure_threshold: self.circuit_breaker_failure_threshold,
            reset_timeout: self.circuit_breaker_timeout,
        }
    }

    /// Enable or disable circuit breaking
    pub fn with_circuit_breaker(mut self, enabled: bool) -> Self {
        self.circuit_breaker_enabled = enabled;
        self
    }

    /// Set the failure threshold that opens a breaker
    pub fn with_failure_threshold(mut self, threshold: u32) -> Self {
        self.circuit_breaker_failure_threshold = threshold;
        self
    }

    /// Set how long an open breaker rejects attempts
    pub fn with_circuit_breaker_timeout(mut self, timeout: Duration) -> Self {
        self.circuit_breaker_timeout = timeout;
        self
    }

    /// Enable or disable retry ceilings
    pub fn with_retry(mut self, enabled: bool) -> Self {
        self.retry_enabled = enabled;
        self
    }

    /// Set the default retry ceiling
    pub fn with_default_max_retries(mut self, max_retries: u32) -> Self {
        self.default_max_retries = max_retries;
        self
    }

    /// Set the default advisory retry delay
    pub fn with_default_retry_delay(mut self, delay: Duration) -> Self {
        self.default_retry_delay = delay;
        self
    }

    /// Allow or forbid fallback recoveries
    pub fn with_graceful_degradation(mut self, enabled: bool) -> Self {
        self.graceful_degradation = enabled;
        self
    }

    /// Clear attempt counters after a successful recovery
    pub fn with_reset_retries_on_success(mut self, enabled: bool) -> Self {
        self.reset_retries_on_success = enabled;
        self
    }

    /// Set the per-probe health check deadline
    pub fn with_health_check_timeout(mut self, timeout: Duration) -> Self {
        self.health_check_timeout = timeout;
        self
    }

    /// Set the memory usage fraction treated as unhealthy
    pub fn with_memory_usage_threshold(mut self, threshold: f64) -> Self {
        self.memory_usage_threshold = threshold;
        self
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok()?.trim().parse().ok()
}

/// Serialize a `Duration` as integer milliseconds.
pub(crate) mod duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(duration.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }

    /// Same encoding for `Option<Duration>`.
    pub mod option {
        use serde::{Deserialize, Deserializer, Serializer};
        use std::time::Duration;

        pub fn serialize<S: Serializer>(
            duration: &Option<Duration>,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            match duration {
                Some(duration) => serializer.serialize_some(&(duration.as_millis() as u64)),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Option<Duration>, D::Error> {
            Option::<u64>::deserialize(deserializer).map(|ms| ms.map(Duration::from_millis))
        }
    }
}
