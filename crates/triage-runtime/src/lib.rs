//! # triage-runtime
//!
//! Model-backed ticket triage built on `triage-core`.
//!
//! This crate owns everything that talks to a model:
//! - Settings and credential loading
//! - The [`ModelCaller`] seam with a deterministic stub and an HTTP caller
//! - Circuit breaker, per-attempt timeout and retry ([`ResilientClient`])
//! - The [`TriagePipeline`] that turns a ticket into a [`TriageResult`]
//!
//! ## Stub mode
//!
//! Without a usable credential (unset, empty or `mock`) the pipeline uses
//! [`StubCaller`] and never performs network I/O.
//!
//! ## Example
//!
//! ```rust,no_run
//! use triage_runtime::{Settings, TriagePipeline};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let settings = Settings::from_env()?;
//! let pipeline = TriagePipeline::new(&settings)?;
//!
//! let outcome = pipeline.process("I was charged twice", "a1b2c3d4").await;
//! println!("{}", serde_json::to_string_pretty(outcome.result())?);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod pipeline;
pub mod prompts;
pub mod providers;
pub mod redact;
pub mod resilience;

pub use client::{CallFailure, CallOutcome, ResilientClient};
pub use config::{ConfigError, Environment, Settings};
pub use pipeline::{TriageOutcome, TriagePipeline, TriagePipelineBuilder};
pub use providers::{
    caller_for, ApiCredential, CallError, CredentialSource, ModelCaller, RemoteCaller, StubCaller,
};
pub use redact::Redacted;
pub use resilience::{CircuitBreaker, CircuitBreakerConfig, CircuitState, RetryPolicy};

pub use triage_core::{ReviewPolicy, TriageError, TriageResult};
