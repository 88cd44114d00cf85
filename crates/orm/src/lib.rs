//! # rowbound-orm: record persistence core
//!
//! Maps records to rows and back through a pluggable SQL [`Dialect`].
//! A [`Connection`] owns a [`Store`] and a dialect and exposes create,
//! update, save, destroy, find and reload, plus `validate_and_*` variants
//! that run a [`Validator`] first. Every operation is timed and every
//! statement is logged through a [`QueryLogger`].
//!
//! Types opt in by implementing [`Record`]; nothing is discovered by
//! reflection.

pub mod backends;
pub mod columns;
pub mod config;
pub mod connection;
pub mod dialect;
pub mod error;
pub mod model;
pub mod query;
pub mod security;
pub mod validation;

#[cfg(test)]
mod testing;

// Re-export core traits and types
pub use backends::{BackendType, DatabaseRow, DatabaseRowExt, DatabaseValue, PostgresStore, SqliteStore, Store};
pub use columns::ColumnSet;
pub use config::{DatabaseConfig, PoolConfig};
pub use connection::{Connection, Outcome, QueryLogger, TracingLogger};
pub use dialect::{Dialect, PostgresDialect, SqliteDialect};
pub use error::{ModelError, ModelResult, OrmError, OrmResult};
pub use model::{Field, Model, Record};
pub use query::Query;
pub use validation::Validator;

pub use rowbound_validation::{CustomRule, Rule, RuleError, Rules, ValidationErrors};
