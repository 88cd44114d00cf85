//! Query - SQL text with positional arguments
//!
//! Built once and executed through [`Connection::exec`](crate::Connection::exec)
//! or [`Connection::fetch_all`](crate::Connection::fetch_all). The text must
//! already use the connection dialect's placeholder style; see
//! [`Connection::raw_query`](crate::Connection::raw_query) for `?` rebinding.

use std::fmt;

use crate::backends::DatabaseValue;

#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    sql: String,
    args: Vec<DatabaseValue>,
}

impl Query {
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            args: Vec::new(),
        }
    }

    /// Append a positional argument
    pub fn bind(mut self, value: impl Into<DatabaseValue>) -> Self {
        self.args.push(value.into());
        self
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn args(&self) -> &[DatabaseValue] {
        &self.args
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.sql)
    }
}
