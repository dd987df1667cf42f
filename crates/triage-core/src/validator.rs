//! Validation of model output.
//!
//! # Core Principle
//! The model's response is untrusted data. It stays an untyped
//! `serde_json::Value` until every required key is confirmed and every
//! value has been coerced into its typed, clamped form.
//!
//! Structural defects (missing keys, not an object) are errors. Field-level
//! defects (unknown enum value, non-numeric confidence) are repaired in
//! place and reported as [`Correction`]s.

use serde_json::{Map, Value};
use std::fmt;
use thiserror::Error;

use crate::error::TriageError;
use crate::types::{
    truncate_chars, Category, Priority, Queue, TriageResult, REVIEW_THRESHOLD, SUMMARY_MAX_CHARS,
};

/// Keys that must be present in every model response, in report order.
pub const REQUIRED_FIELDS: [&str; 5] = ["summary", "category", "priority", "queue", "confidence"];

/// Confidence substituted when the model's value cannot be read as a number.
pub const DEFAULT_CONFIDENCE: f64 = 0.5;

/// Longest rendering of an offending value kept in a correction.
const MAX_ORIGINAL_CHARS: usize = 32;

/// Errors from output validation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("response is not a JSON object")]
    NotAnObject,

    #[error("Missing fields: {}", .0.join(", "))]
    MissingFields(Vec<String>),
}

impl From<ValidationError> for TriageError {
    fn from(error: ValidationError) -> Self {
        match error {
            ValidationError::NotAnObject => TriageError::Parse(error.to_string()),
            ValidationError::MissingFields(_) => TriageError::Schema(error.to_string()),
        }
    }
}

/// How to treat an explicit `needs_human_review` from the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReviewPolicy {
    /// Honour the model's flag, but never let it clear review below the
    /// confidence threshold.
    #[default]
    EscalateLowConfidence,

    /// Honour the model's flag as given.
    TrustModel,
}

/// One field repaired by the validator.
#[derive(Debug, Clone, PartialEq)]
pub struct Correction {
    pub field: &'static str,

    /// Offending value, rendered and shortened
    pub original: String,

    pub replacement: String,
}

impl fmt::Display for Correction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: '{}' -> '{}'",
            self.field, self.original, self.replacement
        )
    }
}

/// Typed triage fields produced from a validated response.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedTriage {
    pub summary: String,
    pub category: Category,
    pub priority: Priority,
    pub queue: Queue,
    pub confidence: f64,
    pub needs_human_review: bool,

    /// Repairs applied, in field order
    pub corrections: Vec<Correction>,
}

impl ValidatedTriage {
    /// Attach request metadata to produce the final record.
    pub fn into_result(
        self,
        correlation_id: impl Into<String>,
        input_length: usize,
        latency_ms: u64,
        tokens_estimate: u64,
    ) -> TriageResult {
        TriageResult {
            summary: self.summary,
            category: self.category,
            priority: self.priority,
            queue: self.queue,
            confidence: self.confidence,
            needs_human_review: self.needs_human_review,
            correlation_id: correlation_id.into(),
            input_length,
            latency_ms,
            tokens_estimate,
        }
    }
}

/// Validates and sanitises a parsed model response.
#[derive(Debug, Clone, Default)]
pub struct OutputValidator {
    policy: ReviewPolicy,
}

impl OutputValidator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_policy(policy: ReviewPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> ReviewPolicy {
        self.policy
    }

    /// Validate a parsed response.
    ///
    /// # Validation Steps
    /// 1. Every key in [`REQUIRED_FIELDS`] is present
    /// 2. `category`, `priority`, `queue` are trimmed and mapped onto their
    ///    closed sets, defaulting when unknown
    /// 3. `confidence` is coerced to a number and clamped to `[0, 1]`
    /// 4. `needs_human_review` is taken from the response or derived
    /// 5. `summary` is rendered as text and truncated
    pub fn validate(
        &self,
        raw: &Value,
        correlation_id: &str,
    ) -> Result<ValidatedTriage, ValidationError> {
        let obj = raw.as_object().ok_or(ValidationError::NotAnObject)?;

        let missing: Vec<String> = REQUIRED_FIELDS
            .iter()
            .filter(|field| !obj.contains_key(**field))
            .map(|field| field.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(ValidationError::MissingFields(missing));
        }

        let mut corrections = Vec::new();

        let category = closed_set_field(obj, "category", Category::parse, &mut corrections);
        let priority = closed_set_field(obj, "priority", Priority::parse, &mut corrections);
        let queue = closed_set_field(obj, "queue", Queue::parse, &mut corrections);
        let confidence = confidence_field(&obj["confidence"], &mut corrections);
        let needs_human_review =
            self.review_field(obj.get("needs_human_review"), confidence, &mut corrections);
        let summary = summary_field(&obj["summary"]);

        for correction in &corrections {
            tracing::warn!(
                correlation_id = %correlation_id,
                field = correction.field,
                original = %correction.original,
                replacement = %correction.replacement,
                "Corrected model output field"
            );
        }

        Ok(ValidatedTriage {
            summary,
            category,
            priority,
            queue,
            confidence,
            needs_human_review,
            corrections,
        })
    }

    fn review_field(
        &self,
        value: Option<&Value>,
        confidence: f64,
        corrections: &mut Vec<Correction>,
    ) -> bool {
        let low_confidence = confidence < REVIEW_THRESHOLD;

        match value {
            None => low_confidence,
            Some(Value::Bool(flag)) => {
                if !flag && low_confidence && self.policy == ReviewPolicy::EscalateLowConfidence {
                    corrections.push(Correction {
                        field: "needs_human_review",
                        original: "false".to_string(),
                        replacement: "true".to_string(),
                    });
                    true
                } else {
                    *flag
                }
            }
            Some(other) => {
                corrections.push(Correction {
                    field: "needs_human_review",
                    original: render(other),
                    replacement: low_confidence.to_string(),
                });
                low_confidence
            }
        }
    }
}

fn closed_set_field<T: Copy + Default + fmt::Display>(
    obj: &Map<String, Value>,
    field: &'static str,
    parse: fn(&str) -> Option<T>,
    corrections: &mut Vec<Correction>,
) -> T {
    let value = &obj[field];
    if let Some(parsed) = value.as_str().and_then(|s| parse(s.trim())) {
        return parsed;
    }

    let fallback = T::default();
    corrections.push(Correction {
        field,
        original: render(value),
        replacement: fallback.to_string(),
    });
    fallback
}

fn confidence_field(value: &Value, corrections: &mut Vec<Correction>) -> f64 {
    match coerce_number(value) {
        Some(n) => {
            let clamped = n.clamp(0.0, 1.0);
            if clamped != n {
                corrections.push(Correction {
                    field: "confidence",
                    original: render(value),
                    replacement: clamped.to_string(),
                });
            }
            clamped
        }
        None => {
            corrections.push(Correction {
                field: "confidence",
                original: render(value),
                replacement: DEFAULT_CONFIDENCE.to_string(),
            });
            DEFAULT_CONFIDENCE
        }
    }
}

/// Numbers, numeric strings and booleans coerce; everything else does not.
fn coerce_number(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        _ => None,
    }?;

    if n.is_nan() {
        None
    } else {
        Some(n)
    }
}

fn summary_field(value: &Value) -> String {
    let text = match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    truncate_chars(&text, SUMMARY_MAX_CHARS)
}

fn render(value: &Value) -> String {
    let text = match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    truncate_chars(&text, MAX_ORIGINAL_CHARS)
}
