//! Validation error types and handling

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A rule could not be evaluated at all.
///
/// This is distinct from a value failing a rule: a failing value produces a
/// message in [`ValidationErrors`], while a `RuleError` aborts validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuleError {
    /// The rule's parameters make no sense for the field it was attached to
    #[error("rule '{rule}' is misconfigured for field '{field}': {reason}")]
    Misconfigured {
        rule: String,
        field: String,
        reason: String,
    },
    /// A custom rule failed while running
    #[error("rule '{rule}' failed to run for field '{field}': {reason}")]
    Failed {
        rule: String,
        field: String,
        reason: String,
    },
}

impl RuleError {
    pub fn misconfigured(
        rule: impl Into<String>,
        field: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        RuleError::Misconfigured {
            rule: rule.into(),
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub fn failed(
        rule: impl Into<String>,
        field: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        RuleError::Failed {
            rule: rule.into(),
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// Collection of validation messages keyed by field name.
///
/// Messages for a field keep the order in which the rules produced them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationErrors {
    errors: BTreeMap<String, Vec<String>>,
}

impl ValidationErrors {
    /// Create a new empty validation errors collection
    pub fn new() -> Self {
        Self {
            errors: BTreeMap::new(),
        }
    }

    /// Add a message for a field
    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors
            .entry(field.into())
            .or_default()
            .push(message.into());
    }

    /// Whether any field carries at least one message
    pub fn has_any(&self) -> bool {
        self.errors.values().any(|messages| !messages.is_empty())
    }

    pub fn is_empty(&self) -> bool {
        !self.has_any()
    }

    /// Number of fields with errors
    pub fn len(&self) -> usize {
        self.errors.values().filter(|m| !m.is_empty()).count()
    }

    /// Total number of messages across all fields
    pub fn total_errors(&self) -> usize {
        self.errors.values().map(Vec::len).sum()
    }

    /// Messages for a specific field
    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.errors.get(field).map(Vec::as_slice)
    }

    pub fn has_field_errors(&self, field: &str) -> bool {
        self.get(field).is_some_and(|m| !m.is_empty())
    }

    /// Merge another collection into this one, appending per field
    pub fn merge(&mut self, other: ValidationErrors) {
        for (field, messages) in other.errors {
            self.errors.entry(field).or_default().extend(messages);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.errors
            .iter()
            .map(|(field, messages)| (field.as_str(), messages.as_slice()))
    }

    /// Field to messages as a JSON object
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!(self.errors)
    }
}

impl<F, M> FromIterator<(F, M)> for ValidationErrors
where
    F: Into<String>,
    M: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (F, M)>>(iter: I) -> Self {
        let mut errors = ValidationErrors::new();
        for (field, message) in iter {
            errors.add(field, message);
        }
        errors
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.has_any() {
            return write!(f, "No validation errors");
        }
        write!(f, "Validation failed for {} field(s):", self.len())?;
        for (field, messages) in &self.errors {
            for message in messages {
                write!(f, "\n  {}: {}", field, message)?;
            }
        }
        Ok(())
    }
}
