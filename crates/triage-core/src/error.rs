//! Error taxonomy for a single triage run.
//!
//! None of these escape the pipeline. Each one is rendered into the
//! summary of a fallback record, so the `Display` text is the reason a
//! human reads in the routing queue.

use thiserror::Error;

/// Why a ticket ended in the fallback outcome.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TriageError {
    #[error("Ticket exceeds max length ({length} > {max})")]
    InputTooLong { length: usize, max: usize },

    #[error("Empty ticket")]
    EmptyInput,

    #[error("LLM service unavailable (circuit open)")]
    ServiceUnavailable,

    #[error("LLM timeout after {attempts} attempts")]
    Timeout { attempts: u32 },

    #[error("LLM call failed: {0}")]
    Transport(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Schema error: {0}")]
    Schema(String),
}

impl TriageError {
    /// Stable machine-readable kind, used as a log field.
    pub fn kind(&self) -> &'static str {
        match self {
            TriageError::InputTooLong { .. } => "input_too_long",
            TriageError::EmptyInput => "empty_input",
            TriageError::ServiceUnavailable => "service_unavailable",
            TriageError::Timeout { .. } => "timeout",
            TriageError::Transport(_) => "transport_error",
            TriageError::Parse(_) => "parse_error",
            TriageError::Schema(_) => "schema_error",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_too_long_mentions_lengths() {
        let err = TriageError::InputTooLong { length: 150, max: 100 };
        assert_eq!(err.to_string(), "Ticket exceeds max length (150 > 100)");
        assert_eq!(err.kind(), "input_too_long");
    }

    #[test]
    fn test_timeout_message() {
        let err = TriageError::Timeout { attempts: 3 };
        assert_eq!(err.to_string(), "LLM timeout after 3 attempts");
    }
}
