//! # triage-core
//!
//! Deterministic building blocks for support-ticket triage.
//!
//! This crate owns everything about a triage run that does not touch the
//! network:
//! - The closed routing taxonomy (category, priority, queue)
//! - Ticket input checks and prompt-safe sanitisation
//! - Validation and repair of untrusted model output
//! - The fallback record and the wire schema every record must satisfy
//!
//! ## Key Guarantees
//!
//! 1. **In-domain**: every [`TriageResult`] has enum fields inside their
//!    closed sets, confidence in `[0, 1]` and a summary of at most 500 chars
//! 2. **Repair over rejection**: bad field values are corrected, only
//!    structurally incomplete responses are rejected
//! 3. **No I/O**: model calls live in `triage-runtime`
//!
//! ## Example
//!
//! ```rust
//! use triage_core::{Category, OutputValidator};
//!
//! let raw = serde_json::json!({
//!     "summary": "Card was charged twice.",
//!     "category": "Sales",
//!     "priority": "High",
//!     "queue": "Billing Ops",
//!     "confidence": 0.88
//! });
//!
//! let validated = OutputValidator::new().validate(&raw, "a1b2c3d4").unwrap();
//! assert_eq!(validated.category, Category::General);
//! assert!(!validated.needs_human_review);
//! ```

pub mod error;
pub mod input;
pub mod schema;
pub mod types;
pub mod validator;

// Re-export main types at crate root
pub use error::TriageError;
pub use input::{sanitize_ticket, validate_ticket};
pub use schema::{check_result, validate_result_schema, SchemaError};
pub use types::{
    truncate_chars, Category, Priority, Queue, TriageResult, FALLBACK_SUMMARY_PREFIX,
    REVIEW_THRESHOLD, SUMMARY_MAX_CHARS,
};
pub use validator::{
    Correction, OutputValidator, ReviewPolicy, ValidatedTriage, ValidationError,
    DEFAULT_CONFIDENCE, REQUIRED_FIELDS,
};
