//! Record Trait - what a type must provide to be persisted
//!
//! Implemented explicitly per record type; the persistence core never inspects
//! a record any other way.

use chrono::{DateTime, Utc};

use crate::backends::{DatabaseRow, DatabaseValue};
use crate::error::ModelResult;
use crate::model::naming;

/// One declared field of a record and its current value
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: &'static str,
    pub value: DatabaseValue,
    /// Transient fields are visible to validators but never persisted
    pub transient: bool,
}

impl Field {
    pub fn new(name: &'static str, value: impl Into<DatabaseValue>) -> Self {
        Self {
            name,
            value: value.into(),
            transient: false,
        }
    }

    pub fn transient(name: &'static str, value: impl Into<DatabaseValue>) -> Self {
        Self {
            name,
            value: value.into(),
            transient: true,
        }
    }
}

/// A value that maps to one row of one table
pub trait Record: Send + Sync {
    /// Table name; defaults to the pluralised snake_case type name
    fn table_name(&self) -> String {
        naming::tableize(std::any::type_name::<Self>())
    }

    /// Primary key column
    fn id_column(&self) -> &'static str {
        "id"
    }

    /// Creation timestamp column, never rewritten by an update
    fn created_at_column(&self) -> &'static str {
        "created_at"
    }

    /// Primary key value; zero means the record has not been persisted
    fn id(&self) -> i64;

    fn set_id(&mut self, id: i64);

    /// Declared fields in declaration order, including the primary key
    fn fields(&self) -> Vec<Field>;

    /// Set created_at timestamp
    fn set_created_at(&mut self, _timestamp: DateTime<Utc>) {}

    /// Set updated_at timestamp
    fn set_updated_at(&mut self, _timestamp: DateTime<Utc>) {}

    /// Overwrite this record's fields from a fetched row
    fn hydrate(&mut self, row: &dyn DatabaseRow) -> ModelResult<()>;
}
