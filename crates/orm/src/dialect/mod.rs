//! SQL Dialects
//!
//! A [`Dialect`] turns a model and a column set into statements for one
//! backend and runs them against a [`Store`]. The provided method bodies
//! cover any backend with `RETURNING` support; implementations supply the
//! placeholder syntax and may override identifier quoting or any operation.

pub mod postgres;
pub mod sql;
pub mod sqlite;

use std::fmt::Debug;

use async_trait::async_trait;

use crate::backends::{DatabaseValue, Store};
use crate::columns::ColumnSet;
use crate::error::{ModelError, OrmResult};
use crate::model::Model;
use crate::security::escape_identifier;

pub use postgres::PostgresDialect;
pub use sqlite::SqliteDialect;

#[async_trait]
pub trait Dialect: Send + Sync + Debug {
    fn name(&self) -> &'static str;

    /// Placeholder for the 1-based parameter `index`
    fn placeholder(&self, index: usize) -> String;

    fn quote_identifier(&self, identifier: &str) -> String {
        escape_identifier(identifier, '"')
    }

    /// Insert the model's `columns` and write the generated identifier back
    async fn create(&self, store: &dyn Store, model: &mut Model<'_>, columns: &ColumnSet) -> OrmResult<()> {
        let statement = sql::insert(self, model.table_name(), columns, model.id_column());
        let values = model.values_for(columns)?;

        let row = store.fetch_optional(&statement, &values).await?.ok_or_else(|| {
            ModelError::Execution(format!("Insert into '{}' returned no row", model.table_name()))
        })?;

        let id = row.get_by_index(0)?.as_i64().ok_or_else(|| {
            ModelError::Execution(format!(
                "Insert into '{}' returned a non-integer identifier",
                model.table_name()
            ))
        })?;
        model.set_id(id);
        Ok(())
    }

    /// Update `columns` of the row addressed by the model's identifier
    async fn update(&self, store: &dyn Store, model: &mut Model<'_>, columns: &ColumnSet) -> OrmResult<()> {
        if columns.is_empty() {
            return Err(ModelError::Configuration(format!(
                "Nothing to update on table '{}': no columns left after exclusions",
                model.table_name()
            )));
        }

        let statement = sql::update(self, model.table_name(), columns, model.id_column());
        let mut values = model.values_for(columns)?;
        values.push(DatabaseValue::from(model.id()));

        let affected = store.execute(&statement, &values).await?;
        if affected == 0 {
            return Err(not_found(model));
        }
        Ok(())
    }

    /// Delete the row addressed by the model's identifier; no row is `NotFound`
    async fn destroy(&self, store: &dyn Store, model: &Model<'_>) -> OrmResult<()> {
        let statement = sql::delete(self, model.table_name(), model.id_column());

        let affected = store.execute(&statement, &[DatabaseValue::from(model.id())]).await?;
        if affected == 0 {
            return Err(not_found(model));
        }
        Ok(())
    }

    /// Load the row with identifier `id` into the model
    async fn find(&self, store: &dyn Store, model: &mut Model<'_>, columns: &ColumnSet, id: i64) -> OrmResult<()> {
        let statement = sql::select_by_id(self, model.table_name(), columns, model.id_column());

        match store.fetch_optional(&statement, &[DatabaseValue::from(id)]).await? {
            Some(row) => model.hydrate(row.as_ref()),
            None => Err(ModelError::NotFound {
                table: model.table_name().to_string(),
                id,
            }),
        }
    }
}

fn not_found(model: &Model<'_>) -> ModelError {
    ModelError::NotFound {
        table: model.table_name().to_string(),
        id: model.id(),
    }
}
