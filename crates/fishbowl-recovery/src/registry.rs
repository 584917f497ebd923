//! Ordered strategy registry

use crate::error::OperationError;
use crate::strategy::RecoveryStrategy;
use std::sync::Arc;

/// Name → strategy map that remembers insertion order.
///
/// Lookup walks entries in order and returns the first strategy whose
/// predicate accepts the error. Replacing an existing name keeps its
/// position.
#[derive(Clone, Default)]
pub struct StrategyRegistry {
    entries: Vec<(String, Arc<dyn RecoveryStrategy>)>,
}

impl StrategyRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `strategy` under `name`, replacing any previous entry.
    pub fn add(&mut self, name: impl Into<String>, strategy: Arc<dyn RecoveryStrategy>) {
        let name = name.into();
        match self.entries.iter_mut().find(|(existing, _)| *existing == name) {
            Some(entry) => entry.1 = strategy,
            None => self.entries.push((name, strategy)),
        }
    }

    /// Remove the entry for `name`. Returns whether one existed.
    pub fn remove(&mut self, name: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(existing, _)| existing != name);
        self.entries.len() != before
    }

    /// First strategy, in insertion order, that can recover from `error`.
    pub fn find_matching(
        &self,
        error: &OperationError,
    ) -> Option<(String, Arc<dyn RecoveryStrategy>)> {
        self.entries
            .iter()
            .find(|(_, strategy)| strategy.can_recover(error))
            .map(|(name, strategy)| (name.clone(), Arc::clone(strategy)))
    }

    /// Strategy registered under `name`.
    pub fn get(&self, name: &str) -> Option<Arc<dyn RecoveryStrategy>> {
        self.entries
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, strategy)| Arc::clone(strategy))
    }

    /// Registered names in insertion order.
    pub fn names(&self) -> Vec<String> {
        self.entries.iter().map(|(name, _)| name.clone()).collect()
    }

    /// Number of registered strategies.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no strategies are registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl std::fmt::Debug for StrategyRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StrategyRegistry")
            .field("strategies", &self.names())
            .finish()
    }
}
