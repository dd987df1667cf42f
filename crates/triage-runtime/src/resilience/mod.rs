//! Resilience patterns for triage-runtime.
//!
//! This module provides:
//! - Circuit breaker shared across requests
//! - Exponential retry schedule for timed-out attempts

mod circuit_breaker;
mod retry;

pub use circuit_breaker::{BreakerSnapshot, CircuitBreaker, CircuitBreakerConfig, CircuitState};
pub use retry::{RetryPolicy, BASE_DELAY};
