//! Built-in validation rules and the custom rule extension point

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use crate::error::RuleError;

static EMAIL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)+$")
        .expect("email pattern is a valid regex")
});

/// Extension point for rules that are not built in.
///
/// `check` returns `Ok(None)` when the value passes, `Ok(Some(message))` when
/// it fails, and `Err` when the rule itself cannot run.
#[async_trait]
pub trait CustomRule: Send + Sync {
    fn name(&self) -> &str;

    async fn check(&self, field: &str, value: &Value) -> Result<Option<String>, RuleError>;
}

/// A [`CustomRule`] backed by a plain closure
pub struct FnRule<F> {
    name: String,
    check: F,
}

impl<F> FnRule<F>
where
    F: Fn(&Value) -> Option<String> + Send + Sync,
{
    pub fn new(name: impl Into<String>, check: F) -> Self {
        Self {
            name: name.into(),
            check,
        }
    }
}

#[async_trait]
impl<F> CustomRule for FnRule<F>
where
    F: Fn(&Value) -> Option<String> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn check(&self, _field: &str, value: &Value) -> Result<Option<String>, RuleError> {
        Ok((self.check)(value))
    }
}

/// A single validation rule applied to one field value
#[derive(Clone)]
pub enum Rule {
    /// Value must be present: not null, not a blank string, not an empty collection
    Required,
    /// String (in characters) or array length within inclusive bounds
    Length { min: Option<usize>, max: Option<usize> },
    /// String must not contain any whitespace
    NoWhitespace,
    /// String must match the pattern
    Pattern(Regex),
    /// String must look like an email address
    Email,
    Custom(Arc<dyn CustomRule>),
}

impl Rule {
    pub fn length(min: usize, max: usize) -> Self {
        Rule::Length {
            min: Some(min),
            max: Some(max),
        }
    }

    pub fn min_length(min: usize) -> Self {
        Rule::Length {
            min: Some(min),
            max: None,
        }
    }

    pub fn max_length(max: usize) -> Self {
        Rule::Length {
            min: None,
            max: Some(max),
        }
    }

    pub fn custom<R: CustomRule + 'static>(rule: R) -> Self {
        Rule::Custom(Arc::new(rule))
    }

    pub fn custom_fn<F>(name: impl Into<String>, check: F) -> Self
    where
        F: Fn(&Value) -> Option<String> + Send + Sync + 'static,
    {
        Rule::custom(FnRule::new(name, check))
    }

    pub fn name(&self) -> &str {
        match self {
            Rule::Required => "required",
            Rule::Length { .. } => "length",
            Rule::NoWhitespace => "no_whitespace",
            Rule::Pattern(_) => "pattern",
            Rule::Email => "email",
            Rule::Custom(rule) => rule.name(),
        }
    }

    /// Evaluate the rule against a field value
    pub async fn check(&self, field: &str, value: &Value) -> Result<Option<String>, RuleError> {
        match self {
            Rule::Required => Ok(is_blank(value).then(|| "is required".to_string())),
            Rule::Length { min, max } => check_length(field, *min, *max, value),
            Rule::NoWhitespace => {
                let Some(text) = self.string_value(field, value)? else {
                    return Ok(None);
                };
                Ok(text
                    .chars()
                    .any(char::is_whitespace)
                    .then(|| "must not contain whitespace".to_string()))
            }
            Rule::Pattern(pattern) => {
                let Some(text) = self.string_value(field, value)? else {
                    return Ok(None);
                };
                Ok((!pattern.is_match(text)).then(|| "is invalid".to_string()))
            }
            Rule::Email => {
                let Some(text) = self.string_value(field, value)? else {
                    return Ok(None);
                };
                Ok((!EMAIL_PATTERN.is_match(text))
                    .then(|| "is not a valid email address".to_string()))
            }
            Rule::Custom(rule) => rule.check(field, value).await,
        }
    }

    // Null skips the rule; presence is Required's job.
    fn string_value<'v>(&self, field: &str, value: &'v Value) -> Result<Option<&'v str>, RuleError> {
        match value {
            Value::Null => Ok(None),
            Value::String(text) => Ok(Some(text)),
            other => Err(RuleError::misconfigured(
                self.name(),
                field,
                format!("expected a string, found {}", type_name(other)),
            )),
        }
    }
}

impl fmt::Debug for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rule::Length { min, max } => f
                .debug_struct("Length")
                .field("min", min)
                .field("max", max)
                .finish(),
            Rule::Pattern(pattern) => f.debug_tuple("Pattern").field(&pattern.as_str()).finish(),
            Rule::Custom(rule) => f.debug_tuple("Custom").field(&rule.name()).finish(),
            other => f.write_str(match other {
                Rule::Required => "Required",
                Rule::NoWhitespace => "NoWhitespace",
                _ => "Email",
            }),
        }
    }
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        _ => false,
    }
}

fn check_length(
    field: &str,
    min: Option<usize>,
    max: Option<usize>,
    value: &Value,
) -> Result<Option<String>, RuleError> {
    if let (Some(min), Some(max)) = (min, max) {
        if min > max {
            return Err(RuleError::misconfigured(
                "length",
                field,
                format!("min {} is greater than max {}", min, max),
            ));
        }
    }

    let length = match value {
        Value::Null => return Ok(None),
        Value::String(s) => s.chars().count(),
        Value::Array(items) => items.len(),
        other => {
            return Err(RuleError::misconfigured(
                "length",
                field,
                format!("expected a string or array, found {}", type_name(other)),
            ))
        }
    };

    if min.is_some_and(|min| length < min) {
        return Ok(Some("too short".to_string()));
    }
    if max.is_some_and(|max| length > max) {
        return Ok(Some("too long".to_string()));
    }
    Ok(None)
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
