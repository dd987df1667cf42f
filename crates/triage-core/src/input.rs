//! Ticket input checks and sanitisation.
//!
//! Lengths are counted in characters, not bytes.

use lazy_static::lazy_static;
use regex::Regex;

use crate::error::TriageError;
use crate::types::truncate_chars;

lazy_static! {
    /// Anything that looks like the prompt's ticket delimiter.
    static ref DELIMITER_RE: Regex = Regex::new(r"(?i)</?\s*ticket\s*>").unwrap();

    /// Non-printing control characters other than tab, newline and carriage return.
    static ref CONTROL_RE: Regex = Regex::new(r"[\x00-\x08\x0B\x0C\x0E-\x1F\x7F]").unwrap();
}

/// Reject empty/whitespace-only tickets and tickets over `max_len` characters.
pub fn validate_ticket(text: &str, max_len: usize) -> Result<(), TriageError> {
    if text.trim().is_empty() {
        return Err(TriageError::EmptyInput);
    }

    let length = text.chars().count();
    if length > max_len {
        return Err(TriageError::InputTooLong {
            length,
            max: max_len,
        });
    }

    Ok(())
}

/// Prepare ticket text for embedding in a prompt.
///
/// Truncates to `max_len` characters, then strips delimiter look-alikes and
/// control characters so the ticket cannot close its own data block.
///
/// Stripping repeats until a pass removes nothing, so nested look-alikes
/// such as `</tic</ticket>ket>` cannot reassemble a delimiter.
pub fn sanitize_ticket(text: &str, max_len: usize) -> String {
    let mut current = truncate_chars(text, max_len);
    loop {
        let without_delimiters = DELIMITER_RE.replace_all(&current, "");
        let next = CONTROL_RE.replace_all(&without_delimiters, "").into_owned();
        if next == current {
            return current;
        }
        current = next;
    }
}
