//! Ordered per-field rule composition

use serde_json::{Map, Value};

use crate::error::{RuleError, ValidationErrors};
use crate::rule::Rule;

#[derive(Debug, Clone)]
struct FieldRules {
    field: String,
    rules: Vec<Rule>,
}

/// Validation rules grouped by field.
///
/// Fields are checked in the order they were first added and each field's
/// rules run left to right. Every failing rule contributes a message; the
/// first [`RuleError`] aborts the whole validation.
#[derive(Debug, Clone, Default)]
pub struct Rules {
    fields: Vec<FieldRules>,
}

impl Rules {
    pub fn new() -> Self {
        Self { fields: Vec::new() }
    }

    /// Append a rule for a field
    pub fn field(self, field: impl Into<String>, rule: Rule) -> Self {
        self.field_rules(field, [rule])
    }

    /// Append several rules for a field, keeping their order
    pub fn field_rules(mut self, field: impl Into<String>, rules: impl IntoIterator<Item = Rule>) -> Self {
        let field = field.into();
        match self.fields.iter_mut().find(|entry| entry.field == field) {
            Some(entry) => entry.rules.extend(rules),
            None => self.fields.push(FieldRules {
                field,
                rules: rules.into_iter().collect(),
            }),
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        self.fields.iter().all(|entry| entry.rules.is_empty())
    }

    /// Names of the fields that carry rules, in evaluation order
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|entry| entry.field.as_str())
    }

    pub fn rules_for(&self, field: &str) -> Option<&[Rule]> {
        self.fields
            .iter()
            .find(|entry| entry.field == field)
            .map(|entry| entry.rules.as_slice())
    }

    /// Validate a record's field values.
    ///
    /// A field missing from `data` is treated as null.
    pub async fn validate(&self, data: &Map<String, Value>) -> Result<ValidationErrors, RuleError> {
        let mut errors = ValidationErrors::new();

        for entry in &self.fields {
            let value = data.get(&entry.field).unwrap_or(&Value::Null);
            for rule in &entry.rules {
                if let Some(message) = rule.check(&entry.field, value).await? {
                    errors.add(entry.field.as_str(), message);
                }
            }
        }

        Ok(errors)
    }
}
