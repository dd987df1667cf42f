//! Domain types for ticket triage.
//!
//! The three routing enumerations are closed sets. Anything the model
//! returns outside them is mapped back onto the set by the validator.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Maximum length of a summary, in characters.
pub const SUMMARY_MAX_CHARS: usize = 500;

/// Confidence below which a ticket is routed to a human.
pub const REVIEW_THRESHOLD: f64 = 0.75;

/// Prefix of every fallback summary.
pub const FALLBACK_SUMMARY_PREFIX: &str = "Error processing ticket: ";

/// Ticket category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Category {
    Billing,
    Bug,
    Access,
    #[serde(rename = "Feature Request")]
    FeatureRequest,
    #[default]
    General,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::Billing,
        Category::Bug,
        Category::Access,
        Category::FeatureRequest,
        Category::General,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Billing => "Billing",
            Category::Bug => "Bug",
            Category::Access => "Access",
            Category::FeatureRequest => "Feature Request",
            Category::General => "General",
        }
    }

    /// Exact match against the closed set.
    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.as_str() == value)
    }
}

/// Ticket priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    pub const ALL: [Priority; 3] = [Priority::Low, Priority::Medium, Priority::High];

    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "Low",
            Priority::Medium => "Medium",
            Priority::High => "High",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.as_str() == value)
    }
}

/// Destination queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Queue {
    #[default]
    #[serde(rename = "Support L1")]
    SupportL1,
    #[serde(rename = "Support L2")]
    SupportL2,
    #[serde(rename = "Billing Ops")]
    BillingOps,
    Security,
    Engineering,
}

impl Queue {
    pub const ALL: [Queue; 5] = [
        Queue::SupportL1,
        Queue::SupportL2,
        Queue::BillingOps,
        Queue::Security,
        Queue::Engineering,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Queue::SupportL1 => "Support L1",
            Queue::SupportL2 => "Support L2",
            Queue::BillingOps => "Billing Ops",
            Queue::Security => "Security",
            Queue::Engineering => "Engineering",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|q| q.as_str() == value)
    }
}

macro_rules! display_as_str {
    ($($ty:ty),*) => {
        $(
            impl fmt::Display for $ty {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    f.write_str(self.as_str())
                }
            }
        )*
    };
}

display_as_str!(Category, Priority, Queue);

/// The triage record handed to downstream routing.
///
/// Every field is always present and inside its domain. Serialises to the
/// wire format consumed by the CLI and downstream routing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriageResult {
    /// Short summary, at most [`SUMMARY_MAX_CHARS`] characters
    pub summary: String,

    pub category: Category,

    pub priority: Priority,

    pub queue: Queue,

    /// Model confidence in `[0.0, 1.0]`
    pub confidence: f64,

    pub needs_human_review: bool,

    /// Correlation ID of the request
    #[serde(rename = "request_id")]
    pub correlation_id: String,

    /// Length of the original ticket text, in characters
    pub input_length: usize,

    pub latency_ms: u64,

    pub tokens_estimate: u64,
}

impl TriageResult {
    /// Build the safe-default record used whenever a stage fails.
    ///
    /// Total: any reason produces a well-formed record.
    pub fn fallback(
        reason: impl fmt::Display,
        correlation_id: impl Into<String>,
        input_length: usize,
    ) -> Self {
        Self {
            summary: truncate_chars(
                &format!("{}{}", FALLBACK_SUMMARY_PREFIX, reason),
                SUMMARY_MAX_CHARS,
            ),
            category: Category::General,
            priority: Priority::Medium,
            queue: Queue::SupportL1,
            confidence: 0.0,
            needs_human_review: true,
            correlation_id: correlation_id.into(),
            input_length,
            latency_ms: 0,
            tokens_estimate: 0,
        }
    }

    /// Check the domain invariants of the record.
    pub fn is_well_formed(&self) -> bool {
        self.summary.chars().count() <= SUMMARY_MAX_CHARS
            && (0.0..=1.0).contains(&self.confidence)
    }
}

/// Truncate to at most `max` characters, never splitting a code point.
pub fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}
