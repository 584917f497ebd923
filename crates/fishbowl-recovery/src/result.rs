//! Recovery results returned to IPC callers

use crate::config::duration_ms;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Strategy name reported when no strategy matched.
pub const STRATEGY_NONE: &str = "none";

/// Strategy name reported when the channel's circuit breaker rejected the call.
pub const STRATEGY_CIRCUIT_BREAKER: &str = "circuit-breaker";

/// Outcome of [`ErrorRecoveryManager::recover_from_error`](crate::ErrorRecoveryManager::recover_from_error).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecoveryResult {
    /// Whether the failure was recovered
    pub success: bool,

    /// Strategy used, [`STRATEGY_NONE`], or [`STRATEGY_CIRCUIT_BREAKER`]
    pub strategy: String,

    /// Human-readable explanation
    pub message: String,

    /// Attempts recorded for the strategy on this channel
    pub retry_attempts: u32,

    /// Set when recovery succeeded only through a degraded path
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback: Option<bool>,

    /// Suggested wait before the caller re-issues the operation
    #[serde(
        default,
        rename = "retryAfterMs",
        with = "duration_ms::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub retry_after: Option<Duration>,
}

impl RecoveryResult {
    pub(crate) fn circuit_open(channel: &str) -> Self {
        Self::failure(
            STRATEGY_CIRCUIT_BREAKER,
            format!("Circuit breaker is open for channel {channel}"),
            0,
        )
    }

    pub(crate) fn no_strategy() -> Self {
        Self::failure(STRATEGY_NONE, "No recovery strategy available", 0)
    }

    pub(crate) fn retries_exhausted(strategy: &str, attempts: u32) -> Self {
        Self::failure(
            strategy,
            format!("Max retry attempts exceeded for {strategy}"),
            attempts,
        )
    }

    pub(crate) fn failure(
        strategy: impl Into<String>,
        message: impl Into<String>,
        retry_attempts: u32,
    ) -> Self {
        Self {
            success: false,
            strategy: strategy.into(),
            message: message.into(),
            retry_attempts,
            fallback: None,
            retry_after: None,
        }
    }

    /// Whether the circuit breaker rejected the call.
    pub fn is_circuit_open(&self) -> bool {
        !self.success && self.strategy == STRATEGY_CIRCUIT_BREAKER
    }

    /// Whether recovery used a degraded path.
    pub fn is_degraded(&self) -> bool {
        self.fallback == Some(true)
    }
}
