//! Log-safe rendering of ticket text.

use std::fmt;

/// Displays text as its length only.
///
/// Wrap ticket or model text in `Redacted` before handing it to a log
/// macro, e.g. `tracing::debug!(ticket = %Redacted(text))`.
#[derive(Clone, Copy)]
pub struct Redacted<'a>(pub &'a str);

impl fmt::Display for Redacted<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[REDACTED {} chars]", self.0.chars().count())
    }
}

impl fmt::Debug for Redacted<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redacted_hides_content() {
        let text = "my password is hunter2";
        let shown = format!("{} {:?}", Redacted(text), Redacted(text));
        assert!(!shown.contains("hunter2"));
        assert_eq!(format!("{}", Redacted(text)), "[REDACTED 22 chars]");
    }

    #[test]
    fn test_redacted_counts_characters() {
        assert_eq!(format!("{}", Redacted("héllo")), "[REDACTED 5 chars]");
    }
}
