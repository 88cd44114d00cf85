//! SQLite Store Implementation
//!
//! [`Store`] over a sqlx `SqlitePool`. SQLite values are dynamically typed, so
//! decoding looks at the declared column type first and falls back to the
//! value's storage class.

use async_trait::async_trait;
use sqlx::sqlite::{SqliteArguments, SqlitePoolOptions, SqliteRow};
use sqlx::{Column, Pool, Row, Sqlite, TypeInfo, ValueRef};

use super::core::*;
use crate::config::PoolConfig;
use crate::error::{ModelError, OrmResult};

/// SQLite connection pool store
#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: Pool<Sqlite>,
}

impl SqliteStore {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }

    /// Create a pool for `database_url` using `config`.
    ///
    /// For `sqlite::memory:` every pooled connection is a separate database;
    /// use a single connection with no idle timeout or lifetime.
    pub async fn connect(database_url: &str, config: &PoolConfig) -> OrmResult<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(config.acquire_timeout())
            .test_before_acquire(config.test_before_acquire)
            .idle_timeout(config.idle_timeout())
            .max_lifetime(config.max_lifetime())
            .connect(database_url)
            .await
            .map_err(|e| ModelError::Connection(format!("Failed to create SQLite pool: {}", e)))?;

        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }
}

#[async_trait]
impl Store for SqliteStore {
    async fn execute(&self, sql: &str, params: &[DatabaseValue]) -> OrmResult<u64> {
        let mut query = sqlx::query(sql);
        for param in params {
            query = bind_database_value(query, param);
        }

        let result = query
            .execute(&self.pool)
            .await
            .map_err(|e| ModelError::Execution(format!("Query execution failed: {}", e)))?;

        Ok(result.rows_affected())
    }

    async fn fetch_all(&self, sql: &str, params: &[DatabaseValue]) -> OrmResult<Vec<Box<dyn DatabaseRow>>> {
        let mut query = sqlx::query(sql);
        for param in params {
            query = bind_database_value(query, param);
        }

        let rows = query
            .fetch_all(&self.pool)
            .await
            .map_err(|e| ModelError::Execution(format!("Query fetch failed: {}", e)))?;

        Ok(rows
            .into_iter()
            .map(|row| Box::new(SqliteRowValue::new(row)) as Box<dyn DatabaseRow>)
            .collect())
    }

    async fn fetch_optional(&self, sql: &str, params: &[DatabaseValue]) -> OrmResult<Option<Box<dyn DatabaseRow>>> {
        let mut query = sqlx::query(sql);
        for param in params {
            query = bind_database_value(query, param);
        }

        let row = query
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| ModelError::Execution(format!("Query fetch failed: {}", e)))?;

        Ok(row.map(|r| Box::new(SqliteRowValue::new(r)) as Box<dyn DatabaseRow>))
    }

    async fn close(&self) -> OrmResult<()> {
        self.pool.close().await;
        Ok(())
    }
}

/// SQLite row implementation
pub struct SqliteRowValue {
    row: SqliteRow,
}

impl SqliteRowValue {
    pub fn new(row: SqliteRow) -> Self {
        Self { row }
    }
}

impl DatabaseRow for SqliteRowValue {
    fn get_by_index(&self, index: usize) -> OrmResult<DatabaseValue> {
        sqlite_value_to_database_value(&self.row, index)
    }

    fn get_by_name(&self, name: &str) -> OrmResult<DatabaseValue> {
        let index = self
            .row
            .columns()
            .iter()
            .position(|col| col.name() == name)
            .ok_or_else(|| ModelError::ColumnNotFound(name.to_string()))?;

        sqlite_value_to_database_value(&self.row, index)
    }

    fn column_count(&self) -> usize {
        self.row.len()
    }

    fn column_names(&self) -> Vec<String> {
        self.row.columns().iter().map(|col| col.name().to_string()).collect()
    }
}

fn bind_database_value<'q>(
    query: sqlx::query::Query<'q, Sqlite, SqliteArguments<'q>>,
    value: &DatabaseValue,
) -> sqlx::query::Query<'q, Sqlite, SqliteArguments<'q>> {
    match value {
        DatabaseValue::Null => query.bind(Option::<String>::None),
        DatabaseValue::Bool(b) => query.bind(*b),
        DatabaseValue::Int32(i) => query.bind(*i),
        DatabaseValue::Int64(i) => query.bind(*i),
        DatabaseValue::Float64(f) => query.bind(*f),
        DatabaseValue::String(s) => query.bind(s.clone()),
        DatabaseValue::Bytes(b) => query.bind(b.clone()),
        DatabaseValue::Uuid(u) => query.bind(*u),
        DatabaseValue::DateTime(dt) => query.bind(*dt),
        DatabaseValue::Date(d) => query.bind(*d),
        DatabaseValue::Time(t) => query.bind(*t),
        DatabaseValue::Json(j) => query.bind(sqlx::types::Json(j.clone())),
    }
}

fn sqlite_value_to_database_value(row: &SqliteRow, index: usize) -> OrmResult<DatabaseValue> {
    let raw = row
        .try_get_raw(index)
        .map_err(|e| ModelError::Serialization(format!("Failed to read column {}: {}", index, e)))?;
    if raw.is_null() {
        return Ok(DatabaseValue::Null);
    }
    let storage = raw.type_info().name().to_string();
    let declared = row.columns()[index].type_info().name().to_string();

    let decode_err =
        |e: sqlx::Error| ModelError::Serialization(format!("Failed to decode {} column {}: {}", declared, index, e));

    let value = match declared.as_str() {
        "BOOLEAN" => DatabaseValue::Bool(row.try_get(index).map_err(decode_err)?),
        "DATETIME" => DatabaseValue::DateTime(row.try_get(index).map_err(decode_err)?),
        "DATE" => DatabaseValue::Date(row.try_get(index).map_err(decode_err)?),
        "TIME" => DatabaseValue::Time(row.try_get(index).map_err(decode_err)?),
        _ => match storage.as_str() {
            "INTEGER" => DatabaseValue::Int64(row.try_get(index).map_err(decode_err)?),
            "REAL" => DatabaseValue::Float64(row.try_get(index).map_err(decode_err)?),
            "BLOB" => DatabaseValue::Bytes(row.try_get(index).map_err(decode_err)?),
            _ => DatabaseValue::String(row.try_get(index).map_err(decode_err)?),
        },
    };

    Ok(value)
}
