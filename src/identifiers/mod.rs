//! SQL identifier safety validation.
//!
//! Identifiers cannot be parameterized in generated `PostgreSQL` statements,
//! so this module is the sole injection defense: every externally influenced
//! name (table name, entity-id column, introspected column names) must pass
//! through it before being spliced into SQL text.

use std::fmt;

use serde_json::Value as JsonValue;

use crate::classifier::diagnostics::Diagnostics;

/// `PostgreSQL` caps identifier length at 63 bytes.
pub const MAX_COLUMN_IDENTIFIER_LEN: usize = 63;

/// Which validation policy applies to a name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentifierPolicy {
    /// Letter-or-underscore start, word characters only, any length.
    General,
    /// As `General`, but capped at 63 characters. Required wherever a
    /// validated name is later suffixed (derived table names), since the
    /// store truncates longer identifiers silently.
    Column,
}

impl IdentifierPolicy {
    fn max_len(self) -> Option<usize> {
        match self {
            IdentifierPolicy::General => None,
            IdentifierPolicy::Column => Some(MAX_COLUMN_IDENTIFIER_LEN),
        }
    }
}

/// Why a single name failed validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentifierFault {
    /// The supplied value was not a string.
    NotAString,
    /// The name does not match the safe identifier pattern.
    PatternMismatch,
}

impl fmt::Display for IdentifierFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IdentifierFault::NotAString => write!(f, "not-a-string"),
            IdentifierFault::PatternMismatch => write!(f, "pattern-mismatch"),
        }
    }
}

/// Aggregate validation failure listing every offending name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentifierError {
    failures: Vec<(String, IdentifierFault)>,
}

impl IdentifierError {
    /// Each failing name with its fault, in input order.
    pub fn failures(&self) -> &[(String, IdentifierFault)] {
        &self.failures
    }
}

impl fmt::Display for IdentifierError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Invalid SQL identifiers: ")?;
        for (index, (name, fault)) in self.failures.iter().enumerate() {
            if index > 0 {
                write!(f, ", ")?;
            }
            write!(f, "'{name}' ({fault})")?;
        }
        Ok(())
    }
}

impl std::error::Error for IdentifierError {}

fn matches_pattern(name: &str, policy: IdentifierPolicy) -> bool {
    let mut chars = name.chars();
    let first_ok = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
    let rest_ok = chars.all(|c| c.is_ascii_alphanumeric() || c == '_');
    let len_ok = policy.max_len().map_or(true, |max| name.len() <= max);
    first_ok && rest_ok && len_ok
}

/// Validate a sequence of names as safe SQL identifiers.
///
/// Checks every name before failing: one diagnostic record is emitted per
/// name (pass or fail), and all offenders are collected into a single
/// aggregate error.
pub fn validate_identifiers<'a, I>(
    names: I,
    policy: IdentifierPolicy,
    diagnostics: &mut Diagnostics,
) -> Result<(), IdentifierError>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut failures = Vec::new();

    for name in names {
        if matches_pattern(name, policy) {
            diagnostics.info(format!("Identifier validated as safe: {name}"));
        } else {
            diagnostics.error(format!("Unsafe SQL identifier rejected: '{name}'"));
            failures.push((name.to_string(), IdentifierFault::PatternMismatch));
        }
    }

    if failures.is_empty() {
        Ok(())
    } else {
        Err(IdentifierError { failures })
    }
}

/// Single-name convenience wrapper around [`validate_identifiers`].
pub fn validate_identifier(
    name: &str,
    policy: IdentifierPolicy,
    diagnostics: &mut Diagnostics,
) -> Result<(), IdentifierError> {
    validate_identifiers([name], policy, diagnostics)
}

/// Validate raw JSON values as safe SQL identifiers.
///
/// Run-configuration files carry identifiers as arbitrary JSON, so a value
/// may fail as `not-a-string` before pattern checks apply. Returns the
/// validated names when every value passes.
pub fn validate_json_identifiers(
    values: &[JsonValue],
    policy: IdentifierPolicy,
    diagnostics: &mut Diagnostics,
) -> Result<Vec<String>, IdentifierError> {
    let mut failures = Vec::new();
    let mut validated = Vec::with_capacity(values.len());

    for value in values {
        let Some(name) = value.as_str() else {
            diagnostics.error(format!("Validation failed: identifier is not a string: {value}"));
            failures.push((value.to_string(), IdentifierFault::NotAString));
            continue;
        };

        if matches_pattern(name, policy) {
            diagnostics.info(format!("Identifier validated as safe: {name}"));
            validated.push(name.to_string());
        } else {
            diagnostics.error(format!("Unsafe SQL identifier rejected: '{name}'"));
            failures.push((name.to_string(), IdentifierFault::PatternMismatch));
        }
    }

    if failures.is_empty() {
        Ok(validated)
    } else {
        Err(IdentifierError { failures })
    }
}

/// Clean a raw column header into a safe lowercase identifier.
///
/// Trims whitespace, lowercases, replaces spaces, hyphens, and colons with
/// underscores, and truncates to the 63-character store limit.
pub fn clean_column(name: &str) -> String {
    let cleaned: String = name
        .trim()
        .to_lowercase()
        .chars()
        .map(|c| match c {
            ' ' | '-' | ':' => '_',
            other => other,
        })
        .collect();

    cleaned.chars().take(MAX_COLUMN_IDENTIFIER_LEN).collect()
}
