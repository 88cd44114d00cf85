//! # rowbound-validation
//!
//! Field validation rules evaluated before a record is persisted.
//! Rules are a closed set of built-in variants plus a [`CustomRule`]
//! extension point; they are grouped per field in [`Rules`] and evaluated
//! left to right, collecting every failure into [`ValidationErrors`].

pub mod error;
pub mod rule;
pub mod rules;

pub use error::{RuleError, ValidationErrors};
pub use rule::{CustomRule, FnRule, Rule};
pub use rules::Rules;
