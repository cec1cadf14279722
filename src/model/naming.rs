//! Identifier rules for builder-created entities.

use crate::error::ModelError;

/// Checks a class name: an ASCII uppercase letter followed by ASCII letters,
/// digits or `_`.
///
/// # Errors
///
/// Returns [`ModelError::InvalidIdentifier`] otherwise.
pub fn validate_class_name(name: &str) -> Result<(), ModelError> {
    let mut chars = name.chars();
    let valid = chars.next().is_some_and(|c| c.is_ascii_uppercase())
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_');
    if valid {
        Ok(())
    } else {
        Err(ModelError::InvalidIdentifier(name.to_string()))
    }
}

/// Checks a module name: non-empty and free of `.`, which separates path
/// segments in qualified names.
///
/// # Errors
///
/// Returns [`ModelError::InvalidIdentifier`] otherwise.
pub fn validate_module_name(name: &str) -> Result<(), ModelError> {
    if name.is_empty() || name.contains('.') || name.chars().any(char::is_whitespace) {
        Err(ModelError::InvalidIdentifier(name.to_string()))
    } else {
        Ok(())
    }
}

/// First `{prefix}{n}` (n from 1) for which `taken` is false.
pub(crate) fn fresh_name(prefix: &str, taken: impl Fn(&str) -> bool) -> String {
    (1..)
        .map(|n| format!("{prefix}{n}"))
        .find(|candidate| !taken(candidate))
        .unwrap_or_else(|| prefix.to_string())
}
