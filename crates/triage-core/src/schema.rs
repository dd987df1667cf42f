//! JSON Schema validation for triage records.
//!
//! Accepted records are checked against `schema/triage_result.schema.json`
//! before they leave the pipeline.

use std::sync::OnceLock;
use thiserror::Error;

use crate::types::TriageResult;

/// Embedded result schema (loaded at compile time).
const RESULT_SCHEMA_JSON: &str = include_str!("../schema/triage_result.schema.json");

/// Compiled JSON Schema validator (initialized once, reused).
static COMPILED_SCHEMA: OnceLock<Result<jsonschema::Validator, String>> = OnceLock::new();

/// Errors from schema validation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SchemaError {
    #[error("Failed to load schema: {0}")]
    LoadError(String),

    #[error("Failed to serialize record: {0}")]
    Serialize(String),

    #[error("Record violates schema: {}", .0.join("; "))]
    Violations(Vec<String>),
}

/// Get or initialize the compiled schema validator.
fn get_validator() -> Result<&'static jsonschema::Validator, SchemaError> {
    let result = COMPILED_SCHEMA.get_or_init(|| {
        let schema_value: serde_json::Value = match serde_json::from_str(RESULT_SCHEMA_JSON) {
            Ok(v) => v,
            Err(e) => return Err(format!("Invalid schema JSON: {}", e)),
        };

        match jsonschema::options().build(&schema_value) {
            Ok(v) => Ok(v),
            Err(e) => Err(format!("Failed to compile schema: {}", e)),
        }
    });

    match result {
        Ok(v) => Ok(v),
        Err(e) => Err(SchemaError::LoadError(e.clone())),
    }
}

/// Validate a serialized record against the schema.
///
/// Returns every violation, each suffixed with its instance path.
pub fn validate_result_schema(record: &serde_json::Value) -> Result<(), SchemaError> {
    let validator = get_validator()?;

    let errors: Vec<String> = validator
        .iter_errors(record)
        .map(|e| format!("{} at {}", e, e.instance_path))
        .collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(SchemaError::Violations(errors))
    }
}

/// Serialize a record and check it against the schema.
pub fn check_result(result: &TriageResult) -> Result<(), SchemaError> {
    let value =
        serde_json::to_value(result).map_err(|e| SchemaError::Serialize(e.to_string()))?;
    validate_result_schema(&value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn valid_record() -> serde_json::Value {
        json!({
            "summary": "Customer requests billing help for recent charges.",
            "category": "Billing",
            "priority": "Medium",
            "queue": "Billing Ops",
            "confidence": 0.92,
            "needs_human_review": false,
            "request_id": "a1b2c3d4",
            "input_length": 64,
            "latency_ms": 100,
            "tokens_estimate": 40
        })
    }

    #[test]
    fn test_valid_record_passes_schema() {
        assert!(validate_result_schema(&valid_record()).is_ok());
    }

    #[test]
    fn test_fallback_record_passes_schema() {
        let fallback = TriageResult::fallback("Empty ticket", "a1b2c3d4", 0);
        assert!(check_result(&fallback).is_ok());
    }

    #[test]
    fn test_out_of_set_queue_fails() {
        let mut record = valid_record();
        record["queue"] = json!("Sales Ops");
        let err = validate_result_schema(&record).unwrap_err();
        assert!(err.to_string().contains("queue"));
    }

    #[test]
    fn test_confidence_out_of_range_fails() {
        let mut record = valid_record();
        record["confidence"] = json!(1.5);
        assert!(validate_result_schema(&record).is_err());
    }

    #[test]
    fn test_missing_key_fails() {
        let mut record = valid_record();
        record.as_object_mut().unwrap().remove("tokens_estimate");
        assert!(validate_result_schema(&record).is_err());
    }

    #[test]
    fn test_long_summary_fails() {
        let mut record = valid_record();
        record["summary"] = json!("x".repeat(501));
        assert!(validate_result_schema(&record).is_err());
    }
}
