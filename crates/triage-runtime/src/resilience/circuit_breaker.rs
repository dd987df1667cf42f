//! Circuit breaker to prevent cascade failures.
//!
//! When model calls fail repeatedly, the circuit opens and subsequent
//! tickets go straight to the fallback record without touching the model.
//! After the cool-down the next check moves the circuit to half-open and
//! lets a single trial call through.

use parking_lot::Mutex;
use std::time::Duration;
use tokio::time::Instant;

/// Circuit breaker configuration.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct CircuitBreakerConfig {
    /// Consecutive failures before opening circuit
    pub failure_threshold: u32,

    /// Cool-down before a trial call is allowed (in seconds)
    #[serde(with = "duration_secs")]
    pub recovery_timeout: Duration,
}

mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            recovery_timeout: Duration::from_secs(60),
        }
    }
}

/// State of the circuit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    /// Normal operation
    Closed,

    /// All calls short-circuit
    Open,

    /// Cool-down elapsed, trial calls allowed
    HalfOpen,
}

impl CircuitState {
    pub fn as_str(&self) -> &'static str {
        match self {
            CircuitState::Closed => "closed",
            CircuitState::Open => "open",
            CircuitState::HalfOpen => "half_open",
        }
    }
}

impl std::fmt::Display for CircuitState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Point-in-time view of the breaker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BreakerSnapshot {
    pub state: CircuitState,
    pub failure_count: u32,
}

#[derive(Debug)]
struct Inner {
    state: CircuitState,
    failure_count: u32,
    last_failure: Option<Instant>,
}

/// Shared governor over outbound model calls.
///
/// One breaker is shared by every request of a pipeline; all transitions
/// happen under a single lock so concurrent callers see a consistent
/// state.
#[derive(Debug)]
pub struct CircuitBreaker {
    inner: Mutex<Inner>,
    config: CircuitBreakerConfig,
}

impl CircuitBreaker {
    /// Create a new circuit breaker.
    pub fn new(config: CircuitBreakerConfig) -> Self {
        Self {
            inner: Mutex::new(Inner {
                state: CircuitState::Closed,
                failure_count: 0,
                last_failure: None,
            }),
            config,
        }
    }

    pub fn config(&self) -> &CircuitBreakerConfig {
        &self.config
    }

    /// Check whether a call must be short-circuited.
    ///
    /// An open circuit whose cool-down has elapsed moves to half-open with
    /// the failure count reset and lets the call through.
    pub fn should_block(&self) -> bool {
        let mut inner = self.inner.lock();
        if inner.state != CircuitState::Open {
            return false;
        }

        let cooled_down = inner
            .last_failure
            .is_some_and(|at| at.elapsed() >= self.config.recovery_timeout);
        if cooled_down {
            inner.state = CircuitState::HalfOpen;
            inner.failure_count = 0;
            tracing::info!("Circuit half-open, allowing trial call");
            false
        } else {
            true
        }
    }

    /// Record a failed call (after retries were exhausted).
    pub fn record_failure(&self) {
        let mut inner = self.inner.lock();
        inner.last_failure = Some(Instant::now());

        match inner.state {
            CircuitState::HalfOpen => {
                inner.state = CircuitState::Open;
                inner.failure_count = inner.failure_count.saturating_add(1);
                tracing::warn!("Circuit reopened after failed trial call");
            }
            _ => {
                inner.failure_count = inner.failure_count.saturating_add(1);
                if inner.state == CircuitState::Closed
                    && inner.failure_count >= self.config.failure_threshold
                {
                    inner.state = CircuitState::Open;
                    tracing::warn!(
                        failures = inner.failure_count,
                        "Circuit opened after repeated failures"
                    );
                }
            }
        }
    }

    /// Record a successful call.
    pub fn record_success(&self) {
        let mut inner = self.inner.lock();
        if inner.state == CircuitState::HalfOpen {
            tracing::info!("Circuit closed after successful trial call");
        }
        inner.state = CircuitState::Closed;
        inner.failure_count = 0;
    }

    pub fn state(&self) -> CircuitState {
        self.inner.lock().state
    }

    pub fn failure_count(&self) -> u32 {
        self.inner.lock().failure_count
    }

    pub fn snapshot(&self) -> BreakerSnapshot {
        let inner = self.inner.lock();
        BreakerSnapshot {
            state: inner.state,
            failure_count: inner.failure_count,
        }
    }
}

impl Default for CircuitBreaker {
    fn default() -> Self {
        Self::new(CircuitBreakerConfig::default())
    }
}
