//! Circuit breaker tracker keyed by channel.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::time::Duration;
use tokio::time::Instant;

/// Observable state of a channel's breaker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CircuitState {
    /// Normal operation, attempts pass through
    Closed,
    /// Tripped, attempts are rejected until the timeout elapses
    Open,
    /// Timeout elapsed, the next attempt is let through as a probe
    HalfOpen,
}

impl fmt::Display for CircuitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Closed => write!(f, "closed"),
            Self::Open => write!(f, "open"),
            Self::HalfOpen => write!(f, "half-open"),
        }
    }
}

/// Settings for a [`CircuitBreakerTracker`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CircuitBreakerConfig {
    /// When false the tracker never blocks and never records anything
    pub enabled: bool,

    /// Consecutive failures that trip the breaker
    pub failure_threshold: u32,

    /// How long an open breaker rejects attempts before allowing a probe
    pub reset_timeout: Duration,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            failure_threshold: 5,
            reset_timeout: Duration::from_secs(60),
        }
    }
}

/// Snapshot of one channel's breaker, suitable for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CircuitBreakerState {
    /// Consecutive failures since the last success or reset
    pub failure_count: u32,

    /// Current state, with half-open derived from the timeout
    pub state: CircuitState,

    /// Wall-clock time the breaker last tripped
    pub opened_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
struct ChannelCircuit {
    failure_count: u32,
    tripped: bool,
    // Monotonic instant drives transitions; wall clock is only reported.
    opened_at: Option<Instant>,
    opened_at_wall: Option<DateTime<Utc>>,
    // Set while the single half-open probe is in flight.
    probe_started_at: Option<Instant>,
}

impl ChannelCircuit {
    fn closed() -> Self {
        Self {
            failure_count: 0,
            tripped: false,
            opened_at: None,
            opened_at_wall: None,
            probe_started_at: None,
        }
    }

    /// A claimed probe expires after `reset_timeout` so an abandoned caller
    /// cannot hold the channel shut forever.
    fn probe_in_flight(&self, reset_timeout: Duration) -> bool {
        self.probe_started_at
            .is_some_and(|started| started.elapsed() < reset_timeout)
    }

    fn state(&self, reset_timeout: Duration) -> CircuitState {
        match (self.tripped, self.opened_at) {
            (true, Some(opened_at)) if opened_at.elapsed() >= reset_timeout => {
                CircuitState::HalfOpen
            }
            (true, _) => CircuitState::Open,
            (false, _) => CircuitState::Closed,
        }
    }
}

/// Tracks circuit breaker state for every channel that has seen a failure.
///
/// The tracker performs no locking; owners are expected to guard it.
///
/// # Examples
///
/// ```rust
/// use fishbowl_core::circuit::{CircuitBreakerConfig, CircuitBreakerTracker, CircuitState};
/// use std::time::Duration;
///
/// let mut breaker = CircuitBreakerTracker::new(CircuitBreakerConfig {
///     enabled: true,
///     failure_threshold: 3,
///     reset_timeout: Duration::from_secs(60),
/// });
///
/// for _ in 0..3 {
///     breaker.record_failure("secure:credentials:set");
/// }
/// assert_eq!(breaker.state("secure:credentials:set"), CircuitState::Open);
///
/// breaker.reset("secure:credentials:set");
/// assert_eq!(breaker.state("secure:credentials:set"), CircuitState::Closed);
/// ```
#[derive(Debug, Clone, Default)]
pub struct CircuitBreakerTracker {
    config: CircuitBreakerConfig,
    circuits: HashMap<String, ChannelCircuit>,
}

impl CircuitBreakerTracker {
    /// Create a tracker with no channels recorded.
    pub fn new(config: CircuitBreakerConfig) -> Self {
        Self {
            config,
            circuits: HashMap::new(),
        }
    }

    /// The settings this tracker was built with.
    pub fn config(&self) -> &CircuitBreakerConfig {
        &self.config
    }

    /// Whether attempts on `channel` must be rejected right now.
    ///
    /// True for an open breaker and for a half-open breaker whose probe is
    /// already in flight. Always false when the tracker is disabled.
    pub fn is_open(&self, channel: &str) -> bool {
        if !self.enabled() {
            return false;
        }
        let reset_timeout = self.config.reset_timeout;
        self.circuits
            .get(channel)
            .is_some_and(|circuit| match circuit.state(reset_timeout) {
                CircuitState::Open => true,
                CircuitState::HalfOpen => circuit.probe_in_flight(reset_timeout),
                CircuitState::Closed => false,
            })
    }

    /// Admit an attempt on `channel`, or return `false` to reject it.
    ///
    /// Closed breakers admit everything. A half-open breaker admits exactly
    /// one caller and marks its probe in flight; the mark is cleared by
    /// [`record_success`](Self::record_success),
    /// [`record_failure`](Self::record_failure), or
    /// [`release_probe`](Self::release_probe).
    pub fn try_acquire(&mut self, channel: &str) -> bool {
        if self.is_open(channel) {
            return false;
        }

        let reset_timeout = self.config.reset_timeout;
        if let Some(circuit) = self.circuits.get_mut(channel)
            && circuit.state(reset_timeout) == CircuitState::HalfOpen
        {
            circuit.probe_started_at = Some(Instant::now());

            #[cfg(feature = "tracing")]
            tracing::debug!(channel, "Circuit breaker half-open, admitting probe");
        }
        true
    }

    /// Give back a claimed probe without recording an outcome.
    ///
    /// Used when an admitted attempt ends before anything was tried, so the
    /// next caller may probe instead.
    pub fn release_probe(&mut self, channel: &str) {
        if let Some(circuit) = self.circuits.get_mut(channel) {
            circuit.probe_started_at = None;
        }
    }

    /// Current state of `channel`. Unknown channels are closed.
    pub fn state(&self, channel: &str) -> CircuitState {
        self.circuits
            .get(channel)
            .map(|circuit| circuit.state(self.config.reset_timeout))
            .unwrap_or(CircuitState::Closed)
    }

    /// Record a failed recovery on `channel` and return the resulting state.
    ///
    /// Reaching the threshold (or failing again past it, as a half-open probe
    /// does) trips the breaker with a fresh `opened_at`.
    pub fn record_failure(&mut self, channel: &str) -> CircuitState {
        if !self.enabled() {
            return CircuitState::Closed;
        }

        let threshold = self.config.failure_threshold;
        let reset_timeout = self.config.reset_timeout;
        let circuit = self
            .circuits
            .entry(channel.to_string())
            .or_insert_with(ChannelCircuit::closed);

        circuit.failure_count = circuit.failure_count.saturating_add(1);
        circuit.probe_started_at = None;
        if circuit.failure_count >= threshold {
            circuit.tripped = true;
            circuit.opened_at = Some(Instant::now());
            circuit.opened_at_wall = Some(Utc::now());

            #[cfg(feature = "tracing")]
            tracing::warn!(
                channel,
                failure_count = circuit.failure_count,
                threshold,
                "Circuit breaker opened"
            );
        }

        circuit.state(reset_timeout)
    }

    /// Record a successful recovery, closing the breaker for `channel`.
    pub fn record_success(&mut self, channel: &str) {
        if !self.enabled() {
            return;
        }

        if let Some(circuit) = self.circuits.get_mut(channel) {
            #[cfg(feature = "tracing")]
            {
                if circuit.tripped {
                    tracing::info!(channel, "Circuit breaker closed after successful probe");
                }
            }

            *circuit = ChannelCircuit::closed();
        }
    }

    /// Forget everything recorded for `channel`.
    pub fn reset(&mut self, channel: &str) {
        if self.circuits.remove(channel).is_some() {
            #[cfg(feature = "tracing")]
            tracing::debug!(channel, "Circuit breaker reset");
        }
    }

    /// Snapshot of every tracked channel, ordered by channel name.
    pub fn snapshot(&self) -> BTreeMap<String, CircuitBreakerState> {
        self.circuits
            .iter()
            .map(|(channel, circuit)| {
                (
                    channel.clone(),
                    CircuitBreakerState {
                        failure_count: circuit.failure_count,
                        state: circuit.state(self.config.reset_timeout),
                        opened_at: circuit.opened_at_wall,
                    },
                )
            })
            .collect()
    }

    fn enabled(&self) -> bool {
        self.config.enabled
    }
}
