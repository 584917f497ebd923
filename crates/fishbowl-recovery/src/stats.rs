//! Diagnostic snapshots

use fishbowl_core::circuit::CircuitBreakerState;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Live view of the manager's state at the moment it was taken.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecoveryStats {
    /// Registered strategy names in lookup order
    pub strategies: Vec<String>,

    /// Attempt counters keyed `strategy:channel`
    pub active_retries: BTreeMap<String, u32>,

    /// Breaker state per channel
    pub circuit_breakers: BTreeMap<String, CircuitBreakerState>,
}

/// Result of [`ErrorRecoveryManager::perform_health_check`](crate::ErrorRecoveryManager::perform_health_check).
///
/// Every field is always present; a probe that errors, panics, or times out
/// reports `false`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthReport {
    /// Database answers a ping
    pub database: bool,
    /// Primary secure credential backend is usable
    pub secure_storage: bool,
    /// Data directory exists and a file can be created in it
    pub filesystem: bool,
    /// Memory usage is below the configured threshold
    pub memory: bool,
}

impl HealthReport {
    /// Whether every subsystem is healthy.
    pub fn all_healthy(&self) -> bool {
        self.database && self.secure_storage && self.filesystem && self.memory
    }
}
