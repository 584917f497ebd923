//! Per-channel circuit breaking.
//!
//! A circuit breaker stops repeated, fruitless work against a channel that
//! keeps failing. Each channel moves through three states:
//!
//! ```text
//! Closed    → Open:      failure_count >= failure_threshold
//! Open      → Half-Open: reset_timeout elapsed since opened_at
//! Half-Open → Closed:    probe succeeds (failure_count reset to 0)
//! Half-Open → Open:      probe fails (opened_at refreshed)
//! ```
//!
//! Half-open is not stored. It is derived from an open breaker whose timeout
//! has elapsed, so no timer is needed to drive transitions. A half-open
//! breaker admits a single probe through
//! [`CircuitBreakerTracker::try_acquire`] and rejects other callers until
//! that probe's outcome is recorded.
//!
//! # Key Types
//!
//! - [`CircuitBreakerTracker`] - Owns the state for every channel
//! - [`CircuitBreakerState`] - Serializable snapshot of one channel
//! - [`CircuitState`] - Closed, open, or half-open

mod breaker;

pub use breaker::{CircuitBreakerConfig, CircuitBreakerState, CircuitBreakerTracker, CircuitState};
