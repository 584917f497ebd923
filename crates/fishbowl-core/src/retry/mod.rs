//! Retry ceilings and advisory backoff.
//!
//! Nothing in this module sleeps. [`RetryAttemptTracker`] counts attempts per
//! strategy and channel so a caller can refuse work past a ceiling, and
//! [`RetryDelay`] computes how long the caller *should* wait before trying
//! again.
//!
//! # Examples
//!
//! ```rust
//! use fishbowl_core::retry::{RetryAttemptTracker, RetryDelay};
//! use std::time::Duration;
//!
//! let mut tracker = RetryAttemptTracker::new();
//! assert_eq!(tracker.next_attempt("network", "api:chat:send"), 1);
//! assert_eq!(tracker.next_attempt("network", "api:chat:send"), 2);
//! assert!(tracker.is_exhausted("network", "api:chat:send", 2));
//!
//! let delay = RetryDelay::new(Duration::from_millis(100)).with_jitter(0.0);
//! assert_eq!(delay.delay_for_attempt(3), Duration::from_millis(400));
//! ```

mod delay;
mod tracker;

pub use delay::RetryDelay;
pub use tracker::RetryAttemptTracker;
