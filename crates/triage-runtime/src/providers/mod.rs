//! Model caller abstraction.
//!
//! A [`ModelCaller`] makes exactly one attempt to get text out of a model.
//! Timeouts, retries and the circuit breaker are layered on top by
//! [`ResilientClient`](crate::client::ResilientClient), so implementations
//! stay small.
//!
//! Two callers ship with the runtime:
//! - [`StubCaller`]: deterministic, offline, used when no credential is set
//! - [`RemoteCaller`]: OpenAI-compatible chat completions over HTTP
//!
//! ## Security
//!
//! The remote caller holds its key as an [`ApiCredential`]; see [`secrets`].

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

mod remote;
pub mod secrets;
mod stub;

pub use remote::{RemoteCaller, DEFAULT_ENDPOINT, DEFAULT_MODEL};
pub use secrets::{ApiCredential, CredentialSource};
pub use stub::{StubCaller, STUB_LATENCY};

use crate::config::Settings;

/// Failure of a single model call attempt.
///
/// The tag alone decides retry policy: timeouts are transient, everything
/// else is not.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CallError {
    #[error("Timeout after {0:?}")]
    Timeout(Duration),

    #[error("{0}")]
    Transport(String),
}

impl CallError {
    /// Whether another attempt may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, CallError::Timeout(_))
    }
}

/// One attempt at invoking the model.
#[async_trait]
pub trait ModelCaller: Send + Sync {
    /// Send the prompt pair and return the model's raw text.
    ///
    /// `timeout` is advisory for the implementation; the client enforces it
    /// independently.
    async fn invoke(
        &self,
        prompt: &str,
        system_prompt: &str,
        timeout: Duration,
    ) -> Result<String, CallError>;

    /// Caller name for logs and metadata.
    fn name(&self) -> &str;

    /// Fixed latency to report instead of the measured one.
    fn simulated_latency(&self) -> Option<Duration> {
        None
    }

    /// Estimate tokens for a prompt/response pair (~4 chars per token).
    fn estimate_tokens(&self, prompt: &str, response: &str) -> u64 {
        ((prompt.chars().count() + response.chars().count()) / 4) as u64
    }
}

/// Pick the caller for these settings.
///
/// A usable credential selects the remote caller; anything else selects the
/// stub. The choice is made once, at construction.
pub fn caller_for(settings: &Settings) -> Arc<dyn ModelCaller> {
    match settings.credential.as_ref().filter(|c| c.is_usable()) {
        Some(credential) => {
            tracing::info!(
                endpoint = %settings.endpoint,
                model = %settings.model,
                credential = %credential,
                "Using remote model caller"
            );
            Arc::new(RemoteCaller::new(
                Arc::clone(credential),
                settings.endpoint.clone(),
                settings.model.clone(),
            ))
        }
        None => {
            tracing::info!("No usable credential configured, using stub model caller");
            Arc::new(StubCaller::new())
        }
    }
}
