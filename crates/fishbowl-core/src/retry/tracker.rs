//! Attempt counters keyed by `strategy:channel`.

use std::collections::{BTreeMap, HashMap};

/// Counts recovery attempts for each (strategy, channel) pair.
///
/// Counters are independent of circuit breaker state: a breaker is per
/// channel across all strategies, while a ceiling applies to one strategy on
/// one channel.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RetryAttemptTracker {
    attempts: HashMap<String, u32>,
}

impl RetryAttemptTracker {
    /// Create an empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Composite key used for storage and in snapshots.
    pub fn key(strategy: &str, channel: &str) -> String {
        format!("{strategy}:{channel}")
    }

    /// Increment the counter for the pair and return the new count.
    pub fn next_attempt(&mut self, strategy: &str, channel: &str) -> u32 {
        let count = self
            .attempts
            .entry(Self::key(strategy, channel))
            .or_insert(0);
        *count = count.saturating_add(1);
        *count
    }

    /// Attempts made so far for the pair, 0 if none.
    pub fn current_attempts(&self, strategy: &str, channel: &str) -> u32 {
        self.attempts
            .get(&Self::key(strategy, channel))
            .copied()
            .unwrap_or(0)
    }

    /// Whether the pair has used up `max_retries` attempts.
    pub fn is_exhausted(&self, strategy: &str, channel: &str, max_retries: u32) -> bool {
        self.current_attempts(strategy, channel) >= max_retries
    }

    /// Clear the counter for the pair.
    pub fn reset(&mut self, strategy: &str, channel: &str) {
        self.attempts.remove(&Self::key(strategy, channel));
    }

    /// All live counters, ordered by key.
    pub fn snapshot(&self) -> BTreeMap<String, u32> {
        self.attempts
            .iter()
            .map(|(key, count)| (key.clone(), *count))
            .collect()
    }
}
