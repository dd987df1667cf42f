//! Resilient wrapper around a [`ModelCaller`].
//!
//! The client owns the policy for a single model invocation: circuit
//! breaker check, per-attempt timeout, retry with exponential backoff on
//! timeouts, and latency/token accounting. It never returns an error; every
//! path produces a [`CallOutcome`].

use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::time::Instant;

use triage_core::TriageError;

use crate::providers::{CallError, ModelCaller};
use crate::resilience::{CircuitBreaker, RetryPolicy};

/// Why a model invocation failed.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CallFailure {
    #[error("service unavailable (circuit open)")]
    ServiceUnavailable,

    #[error("timeout after {attempts} attempts")]
    Timeout { attempts: u32 },

    #[error("{0}")]
    Transport(String),
}

impl From<CallFailure> for TriageError {
    fn from(failure: CallFailure) -> Self {
        match failure {
            CallFailure::ServiceUnavailable => TriageError::ServiceUnavailable,
            CallFailure::Timeout { attempts } => TriageError::Timeout { attempts },
            CallFailure::Transport(message) => TriageError::Transport(message),
        }
    }
}

/// Result of one [`ResilientClient::call`].
#[derive(Debug, Clone, PartialEq)]
pub struct CallOutcome {
    pub latency_ms: u64,
    pub tokens_estimate: u64,
    pub result: Result<String, CallFailure>,
}

impl CallOutcome {
    fn failed(latency_ms: u64, failure: CallFailure) -> Self {
        Self {
            latency_ms,
            tokens_estimate: 0,
            result: Err(failure),
        }
    }

    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

/// Model caller wrapped with breaker, timeout and retry.
pub struct ResilientClient {
    caller: Arc<dyn ModelCaller>,
    breaker: Arc<CircuitBreaker>,
    retry: RetryPolicy,
    timeout: Duration,
}

impl ResilientClient {
    pub fn new(
        caller: Arc<dyn ModelCaller>,
        breaker: Arc<CircuitBreaker>,
        retry: RetryPolicy,
        timeout: Duration,
    ) -> Self {
        Self {
            caller,
            breaker,
            retry,
            timeout,
        }
    }

    pub fn caller_name(&self) -> &str {
        self.caller.name()
    }

    pub fn breaker(&self) -> &Arc<CircuitBreaker> {
        &self.breaker
    }

    /// Invoke the model once, retrying timeouts.
    ///
    /// The prompt text is never logged.
    pub async fn call(&self, prompt: &str, system_prompt: &str, correlation_id: &str) -> CallOutcome {
        if self.breaker.should_block() {
            tracing::warn!(
                correlation_id,
                caller = self.caller.name(),
                "Circuit open, skipping model call"
            );
            return CallOutcome::failed(0, CallFailure::ServiceUnavailable);
        }

        let start = Instant::now();
        let max_attempts = self.retry.max_attempts();
        let mut delays = self.retry.delays();
        let mut attempt: u32 = 0;

        loop {
            attempt += 1;
            let attempt_start = Instant::now();
            let result = tokio::time::timeout(
                self.timeout,
                self.caller.invoke(prompt, system_prompt, self.timeout),
            )
            .await
            .unwrap_or(Err(CallError::Timeout(self.timeout)));
            let attempt_ms = elapsed_ms(attempt_start);

            match result {
                Ok(text) => {
                    self.breaker.record_success();
                    let latency_ms = match self.caller.simulated_latency() {
                        Some(simulated) => simulated.as_millis() as u64,
                        None => elapsed_ms(start),
                    };
                    let tokens_estimate = self.caller.estimate_tokens(prompt, &text);

                    tracing::debug!(
                        correlation_id,
                        attempt,
                        latency_ms = attempt_ms,
                        "Model attempt succeeded"
                    );
                    tracing::info!(
                        correlation_id,
                        caller = self.caller.name(),
                        attempts = attempt,
                        latency_ms,
                        tokens_estimate,
                        "Model call succeeded"
                    );

                    return CallOutcome {
                        latency_ms,
                        tokens_estimate,
                        result: Ok(text),
                    };
                }
                Err(error) if error.is_retryable() => {
                    tracing::warn!(
                        correlation_id,
                        attempt,
                        max_attempts,
                        latency_ms = attempt_ms,
                        "Model attempt timed out"
                    );

                    match delays.next() {
                        Some(delay) => tokio::time::sleep(delay).await,
                        None => {
                            self.breaker.record_failure();
                            let latency_ms = elapsed_ms(start);
                            tracing::error!(
                                correlation_id,
                                caller = self.caller.name(),
                                attempts = attempt,
                                latency_ms,
                                "Model call failed: retries exhausted"
                            );
                            return CallOutcome::failed(
                                latency_ms,
                                CallFailure::Timeout { attempts: attempt },
                            );
                        }
                    }
                }
                Err(error) => {
                    self.breaker.record_failure();
                    let latency_ms = elapsed_ms(start);
                    tracing::error!(
                        correlation_id,
                        caller = self.caller.name(),
                        attempt,
                        latency_ms,
                        error = %error,
                        "Model call failed"
                    );
                    return CallOutcome::failed(latency_ms, CallFailure::Transport(error.to_string()));
                }
            }
        }
    }
}

fn elapsed_ms(since: Instant) -> u64 {
    since.elapsed().as_millis() as u64
}
