//! # Validation Rules
//!
//! Pure predicates over caller input. Uniqueness itself needs the store and
//! lives in the service, but the comparison rule it uses is defined here.

use std::fmt;

/// Input failed a pure validation rule
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Invalid;

impl fmt::Display for Invalid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "value is empty or whitespace")
    }
}

impl std::error::Error for Invalid {}

/// Fails when `text` is empty or made only of whitespace.
pub fn validate_non_empty(text: &str) -> Result<(), Invalid> {
    if text.trim().is_empty() {
        Err(Invalid)
    } else {
        Ok(())
    }
}

/// Case-folded key used for uniqueness comparisons.
///
/// Uses the Unicode default lowercase mapping, which does not depend on
/// any locale. The input is not trimmed or normalized.
pub fn fold_case(text: &str) -> String {
    text.to_lowercase()
}

/// Culture-invariant, case-insensitive equality.
pub fn eq_ignore_case(a: &str, b: &str) -> bool {
    if a.is_ascii() && b.is_ascii() {
        return a.eq_ignore_ascii_case(b);
    }
    fold_case(a) == fold_case(b)
}
