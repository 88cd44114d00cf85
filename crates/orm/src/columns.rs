//! ColumnSet - the columns an operation reads or writes

use std::fmt;

use crate::error::{ModelError, ModelResult};
use crate::model::Model;
use crate::security::validate_identifier;

/// Ordered, duplicate-free set of column names.
///
/// Built from a record's persistent fields in declaration order. Removing
/// names keeps the remaining order and ignores names that are not present.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnSet {
    columns: Vec<String>,
}

impl ColumnSet {
    /// Columns for every persistent field of the model's record.
    ///
    /// A name declared twice is a configuration error rather than being
    /// silently collapsed.
    pub fn for_model(model: &Model<'_>) -> ModelResult<Self> {
        let mut set = ColumnSet::default();
        for field in model.fields().into_iter().filter(|field| !field.transient) {
            validate_identifier(field.name)?;
            if set.contains(field.name) {
                return Err(ModelError::Configuration(format!(
                    "Column '{}' is declared more than once on table '{}'",
                    field.name,
                    model.table_name()
                )));
            }
            set.columns.push(field.name.to_string());
        }
        Ok(set)
    }

    /// Remove the named columns if present
    pub fn remove<S: AsRef<str>>(&mut self, names: &[S]) {
        self.columns
            .retain(|column| !names.iter().any(|name| name.as_ref() == column));
    }

    pub fn contains(&self, name: &str) -> bool {
        self.columns.iter().any(|column| column == name)
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(String::as_str)
    }

    pub fn names(&self) -> &[String] {
        &self.columns
    }
}

impl fmt::Display for ColumnSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.columns.join(", "))
    }
}
