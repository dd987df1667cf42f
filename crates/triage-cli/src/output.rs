//! Result envelope printed on stdout.

use chrono::{DateTime, SecondsFormat, Utc};
use clap::ValueEnum;
use serde::Serialize;

use triage_core::TriageResult;
use triage_runtime::{Settings, TriageOutcome};

/// Output rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Compact single-line JSON
    #[default]
    Json,
    /// Indented JSON
    Pretty,
}

/// Run metadata attached to every printed record.
#[derive(Debug, Serialize)]
pub struct Metadata {
    pub success: bool,
    pub mode: &'static str,
    pub environment: String,
    pub processed_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// The record plus its metadata.
#[derive(Debug, Serialize)]
pub struct Envelope<'a> {
    #[serde(flatten)]
    pub result: &'a TriageResult,
    pub metadata: Metadata,
}

impl<'a> Envelope<'a> {
    pub fn new(outcome: &'a TriageOutcome, settings: &Settings, now: DateTime<Utc>) -> Self {
        Self {
            result: outcome.result(),
            metadata: Metadata {
                success: outcome.is_success(),
                mode: settings.mode(),
                environment: settings.environment.to_string(),
                processed_at: now.to_rfc3339_opts(SecondsFormat::Millis, true),
                error: outcome.reason().map(|reason| reason.to_string()),
            },
        }
    }

    pub fn render(&self, format: OutputFormat) -> serde_json::Result<String> {
        match format {
            OutputFormat::Json => serde_json::to_string(self),
            OutputFormat::Pretty => serde_json::to_string_pretty(self),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use triage_core::TriageError;

    fn fixed_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 15, 9, 30, 0).unwrap()
    }

    #[test]
    fn test_fallback_envelope() {
        let outcome = TriageOutcome::Fallback {
            result: TriageResult::fallback(&TriageError::EmptyInput, "abcd1234", 0),
            reason: TriageError::EmptyInput,
        };
        let envelope = Envelope::new(&outcome, &Settings::default(), fixed_time());
        let json: serde_json::Value =
            serde_json::from_str(&envelope.render(OutputFormat::Json).unwrap()).unwrap();

        assert_eq!(json["request_id"], "abcd1234");
        assert_eq!(json["category"], "General");
        assert_eq!(json["metadata"]["success"], false);
        assert_eq!(json["metadata"]["mode"], "stub");
        assert_eq!(json["metadata"]["environment"], "development");
        assert_eq!(json["metadata"]["processed_at"], "2026-01-15T09:30:00.000Z");
        assert_eq!(json["metadata"]["error"], "Empty ticket");
    }

    #[test]
    fn test_success_envelope_omits_error() {
        let mut result = TriageResult::fallback("unused", "ok000001", 12);
        result.confidence = 0.9;
        result.needs_human_review = false;
        let outcome = TriageOutcome::Accepted(result);

        let envelope = Envelope::new(&outcome, &Settings::default(), fixed_time());
        let json: serde_json::Value =
            serde_json::from_str(&envelope.render(OutputFormat::Json).unwrap()).unwrap();

        assert_eq!(json["metadata"]["success"], true);
        assert!(json["metadata"].get("error").is_none());
        assert_eq!(json["input_length"], 12);
    }

    #[test]
    fn test_pretty_is_multiline() {
        let outcome = TriageOutcome::Fallback {
            result: TriageResult::fallback(&TriageError::EmptyInput, "abcd1234", 0),
            reason: TriageError::EmptyInput,
        };
        let envelope = Envelope::new(&outcome, &Settings::default(), fixed_time());
        assert!(envelope.render(OutputFormat::Pretty).unwrap().contains('\n'));
        assert!(!envelope.render(OutputFormat::Json).unwrap().contains('\n'));
    }
}
