//! Ticket triage pipeline.
//!
//! The pipeline is the single entry point for triaging a ticket:
//! - Input checks (empty, oversized)
//! - Prompt construction with the ticket fenced as data
//! - One resilient model call
//! - Output validation and repair
//! - Schema guard on the final record
//!
//! Every stage that fails short-circuits to the fallback record. Nothing
//! escapes [`TriagePipeline::process`] as an error.

use std::sync::Arc;

use triage_core::{
    check_result, validate_ticket, OutputValidator, ReviewPolicy, TriageError, TriageResult,
};

use crate::client::ResilientClient;
use crate::config::{ConfigError, Settings};
use crate::prompts::{build_user_prompt, SYSTEM_PROMPT};
use crate::providers::{caller_for, ModelCaller};
use crate::redact::Redacted;
use crate::resilience::{CircuitBreaker, RetryPolicy};

/// Result of processing one ticket.
#[derive(Debug, Clone, PartialEq)]
pub enum TriageOutcome {
    /// The model's classification, validated
    Accepted(TriageResult),

    /// Safe default record, with the reason it was produced
    Fallback {
        result: TriageResult,
        reason: TriageError,
    },
}

impl TriageOutcome {
    pub fn result(&self) -> &TriageResult {
        match self {
            TriageOutcome::Accepted(result) => result,
            TriageOutcome::Fallback { result, .. } => result,
        }
    }

    pub fn into_result(self) -> TriageResult {
        match self {
            TriageOutcome::Accepted(result) => result,
            TriageOutcome::Fallback { result, .. } => result,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, TriageOutcome::Accepted(_))
    }

    pub fn reason(&self) -> Option<&TriageError> {
        match self {
            TriageOutcome::Accepted(_) => None,
            TriageOutcome::Fallback { reason, .. } => Some(reason),
        }
    }
}

/// Triages tickets against one model caller.
///
/// # Architecture
/// - Stateless per ticket; the only shared state is the circuit breaker
/// - Safe to share across tasks behind an `Arc`
pub struct TriagePipeline {
    client: ResilientClient,
    validator: OutputValidator,
    max_input_length: usize,
}

impl TriagePipeline {
    /// Build a pipeline from settings with the default caller selection.
    pub fn new(settings: &Settings) -> Result<Self, ConfigError> {
        TriagePipelineBuilder::new().settings(settings.clone()).build()
    }

    pub fn builder() -> TriagePipelineBuilder {
        TriagePipelineBuilder::new()
    }

    /// Name of the model caller in use.
    pub fn caller_name(&self) -> &str {
        self.client.caller_name()
    }

    pub fn breaker(&self) -> &Arc<CircuitBreaker> {
        self.client.breaker()
    }

    /// Triage one ticket.
    ///
    /// Never fails: any stage that cannot produce a trustworthy record
    /// yields [`TriageOutcome::Fallback`].
    pub async fn process(&self, ticket: &str, correlation_id: &str) -> TriageOutcome {
        let input_length = ticket.chars().count();

        if let Err(reason) = validate_ticket(ticket, self.max_input_length) {
            return fallback(reason, correlation_id, input_length);
        }

        // Metadata only, never the ticket text
        tracing::info!(
            correlation_id,
            input_length,
            ticket = %Redacted(ticket),
            "Processing ticket"
        );

        let prompt = build_user_prompt(ticket, self.max_input_length);
        let outcome = self.client.call(&prompt, SYSTEM_PROMPT, correlation_id).await;

        let text = match outcome.result {
            Ok(text) => text,
            Err(failure) => return fallback(failure.into(), correlation_id, input_length),
        };

        let raw: serde_json::Value = match serde_json::from_str(&text) {
            Ok(value) => value,
            Err(e) => {
                return fallback(TriageError::Parse(e.to_string()), correlation_id, input_length)
            }
        };

        let validated = match self.validator.validate(&raw, correlation_id) {
            Ok(validated) => validated,
            Err(e) => return fallback(e.into(), correlation_id, input_length),
        };
        let corrections = validated.corrections.len();

        let result = validated.into_result(
            correlation_id,
            input_length,
            outcome.latency_ms,
            outcome.tokens_estimate,
        );

        if let Err(e) = check_result(&result) {
            return fallback(TriageError::Schema(e.to_string()), correlation_id, input_length);
        }

        tracing::info!(
            correlation_id,
            category = %result.category,
            priority = %result.priority,
            queue = %result.queue,
            confidence = result.confidence,
            needs_review = result.needs_human_review,
            corrections,
            latency_ms = result.latency_ms,
            "Triage complete"
        );

        TriageOutcome::Accepted(result)
    }
}

fn fallback(reason: TriageError, correlation_id: &str, input_length: usize) -> TriageOutcome {
    tracing::warn!(
        correlation_id,
        kind = reason.kind(),
        reason = %reason,
        "Triage fell back to safe default"
    );
    TriageOutcome::Fallback {
        result: TriageResult::fallback(&reason, correlation_id, input_length),
        reason,
    }
}

/// Builder for TriagePipeline.
pub struct TriagePipelineBuilder {
    settings: Settings,
    caller: Option<Arc<dyn ModelCaller>>,
    breaker: Option<Arc<CircuitBreaker>>,
    review_policy: ReviewPolicy,
    retry: Option<RetryPolicy>,
}

impl TriagePipelineBuilder {
    /// Create a new builder.
    pub fn new() -> Self {
        Self {
            settings: Settings::default(),
            caller: None,
            breaker: None,
            review_policy: ReviewPolicy::default(),
            retry: None,
        }
    }

    /// Set the settings.
    pub fn settings(mut self, settings: Settings) -> Self {
        self.settings = settings;
        self
    }

    /// Use this caller instead of selecting one from the settings.
    pub fn caller(mut self, caller: Arc<dyn ModelCaller>) -> Self {
        self.caller = Some(caller);
        self
    }

    /// Share an existing circuit breaker.
    pub fn breaker(mut self, breaker: Arc<CircuitBreaker>) -> Self {
        self.breaker = Some(breaker);
        self
    }

    pub fn review_policy(mut self, policy: ReviewPolicy) -> Self {
        self.review_policy = policy;
        self
    }

    /// Override the retry schedule derived from `max_retries`.
    pub fn retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = Some(retry);
        self
    }

    /// Build the pipeline.
    pub fn build(self) -> Result<TriagePipeline, ConfigError> {
        self.settings.validate()?;

        let caller = self
            .caller
            .unwrap_or_else(|| caller_for(&self.settings));
        let breaker = self.breaker.unwrap_or_else(|| {
            Arc::new(CircuitBreaker::new(self.settings.circuit_breaker.clone()))
        });
        let retry = self
            .retry
            .unwrap_or_else(|| RetryPolicy::new(self.settings.max_retries));

        Ok(TriagePipeline {
            client: ResilientClient::new(caller, breaker, retry, self.settings.timeout()),
            validator: OutputValidator::with_policy(self.review_policy),
            max_input_length: self.settings.max_input_length,
        })
    }
}

impl Default for TriagePipelineBuilder {
    fn default() -> Self {
        Self::new()
    }
}
