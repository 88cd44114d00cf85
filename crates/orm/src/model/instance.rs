//! Model - per-operation view over one record

use std::fmt;

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

use crate::backends::{DatabaseRow, DatabaseValue};
use crate::columns::ColumnSet;
use crate::error::{ModelError, ModelResult};
use crate::model::core_trait::{Field, Record};
use crate::security::validate_identifier;

/// Borrowed wrapper around a record for the duration of one operation.
///
/// Construction checks that the record can be persisted at all: its table
/// name and primary key column must be valid identifiers and the primary key
/// must be one of its persistent fields.
pub struct Model<'a> {
    record: &'a mut (dyn Record + 'a),
    table_name: String,
}

impl<'a> Model<'a> {
    pub fn new(record: &'a mut (dyn Record + 'a)) -> ModelResult<Self> {
        let table_name = record.table_name();
        validate_identifier(&table_name).map_err(|e| {
            ModelError::Configuration(format!("Cannot derive a table name for record: {}", e))
        })?;

        let id_column = record.id_column();
        validate_identifier(id_column)?;
        let has_id_field = record
            .fields()
            .iter()
            .any(|field| field.name == id_column && !field.transient);
        if !has_id_field {
            return Err(ModelError::Configuration(format!(
                "Record for table '{}' has no identifier field '{}'",
                table_name, id_column
            )));
        }

        Ok(Self { record, table_name })
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    pub fn id(&self) -> i64 {
        self.record.id()
    }

    pub fn set_id(&mut self, id: i64) {
        self.record.set_id(id);
    }

    pub fn id_column(&self) -> &'static str {
        self.record.id_column()
    }

    pub fn created_at_column(&self) -> &'static str {
        self.record.created_at_column()
    }

    /// Not yet persisted
    pub fn is_new(&self) -> bool {
        self.id() == 0
    }

    pub fn fields(&self) -> Vec<Field> {
        self.record.fields()
    }

    /// Current values for `columns`, in the column set's order
    pub fn values_for(&self, columns: &ColumnSet) -> ModelResult<Vec<DatabaseValue>> {
        let mut fields = self.fields();
        columns
            .iter()
            .map(|column| {
                fields
                    .iter_mut()
                    .find(|field| field.name == column)
                    .map(|field| std::mem::replace(&mut field.value, DatabaseValue::Null))
                    .ok_or_else(|| {
                        ModelError::Configuration(format!(
                            "Column '{}' is not a field of table '{}'",
                            column, self.table_name
                        ))
                    })
            })
            .collect()
    }

    pub fn touch_created_at(&mut self, now: DateTime<Utc>) {
        self.record.set_created_at(now);
    }

    pub fn touch_updated_at(&mut self, now: DateTime<Utc>) {
        self.record.set_updated_at(now);
    }

    pub fn hydrate(&mut self, row: &dyn DatabaseRow) -> ModelResult<()> {
        self.record.hydrate(row)
    }

    /// Every field value, transient ones included, keyed by field name
    pub fn to_json_map(&self) -> Map<String, Value> {
        self.fields()
            .into_iter()
            .map(|field| (field.name.to_string(), field.value.to_json()))
            .collect()
    }
}

impl fmt::Debug for Model<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Model")
            .field("table_name", &self.table_name)
            .field("id", &self.id())
            .finish()
    }
}
