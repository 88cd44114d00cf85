//! Test doubles shared by the unit tests

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::backends::{DatabaseRow, DatabaseRowExt, DatabaseValue, Store};
use crate::connection::{Outcome, QueryLogger};
use crate::error::{ModelError, ModelResult, OrmResult};
use crate::model::{Field, Record};

#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct User {
    pub id: i64,
    pub email: String,
    pub password: String,
    pub password_confirmation: String,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl User {
    pub fn new(email: &str, password: &str) -> Self {
        Self {
            email: email.to_string(),
            password: password.to_string(),
            ..Default::default()
        }
    }
}

impl Record for User {
    fn id(&self) -> i64 {
        self.id
    }

    fn set_id(&mut self, id: i64) {
        self.id = id;
    }

    fn fields(&self) -> Vec<Field> {
        vec![
            Field::new("id", self.id),
            Field::new("email", &self.email),
            Field::new("password", &self.password),
            Field::transient("password_confirmation", &self.password_confirmation),
            Field::new("created_at", self.created_at),
            Field::new("updated_at", self.updated_at),
        ]
    }

    fn set_created_at(&mut self, timestamp: DateTime<Utc>) {
        self.created_at = Some(timestamp);
    }

    fn set_updated_at(&mut self, timestamp: DateTime<Utc>) {
        self.updated_at = Some(timestamp);
    }

    fn hydrate(&mut self, row: &dyn DatabaseRow) -> ModelResult<()> {
        self.id = row.get("id")?;
        self.email = row.get("email")?;
        self.password = row.get("password")?;
        self.created_at = row.try_get("created_at")?;
        self.updated_at = row.try_get("updated_at")?;
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct Account {
    pub id: i64,
    pub name: String,
}

impl Record for Account {
    fn id(&self) -> i64 {
        self.id
    }

    fn set_id(&mut self, id: i64) {
        self.id = id;
    }

    fn fields(&self) -> Vec<Field> {
        vec![Field::new("id", self.id), Field::new("name", &self.name)]
    }

    fn hydrate(&mut self, row: &dyn DatabaseRow) -> ModelResult<()> {
        self.id = row.get("id")?;
        self.name = row.get("name")?;
        Ok(())
    }
}

/// In-memory row with named columns
#[derive(Debug, Clone)]
pub(crate) struct MockRow {
    columns: Vec<(String, DatabaseValue)>,
}

impl MockRow {
    pub fn new(columns: Vec<(&str, DatabaseValue)>) -> Self {
        Self {
            columns: columns
                .into_iter()
                .map(|(name, value)| (name.to_string(), value))
                .collect(),
        }
    }
}

impl DatabaseRow for MockRow {
    fn get_by_index(&self, index: usize) -> OrmResult<DatabaseValue> {
        self.columns
            .get(index)
            .map(|(_, value)| value.clone())
            .ok_or_else(|| ModelError::ColumnNotFound(index.to_string()))
    }

    fn get_by_name(&self, name: &str) -> OrmResult<DatabaseValue> {
        self.columns
            .iter()
            .find(|(column, _)| column == name)
            .map(|(_, value)| value.clone())
            .ok_or_else(|| ModelError::ColumnNotFound(name.to_string()))
    }

    fn column_count(&self) -> usize {
        self.columns.len()
    }

    fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|(name, _)| name.clone()).collect()
    }
}

/// Store that records every statement and replays scripted results.
///
/// `execute` reports one affected row unless told otherwise; fetches return
/// scripted rows in order and nothing once they run out.
#[derive(Default)]
pub(crate) struct MockStore {
    statements: Mutex<Vec<(String, Vec<DatabaseValue>)>>,
    affected: Mutex<VecDeque<u64>>,
    rows: Mutex<VecDeque<MockRow>>,
    failure: Mutex<Option<ModelError>>,
}

impl MockStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_affected(self, rows: u64) -> Self {
        self.affected.lock().unwrap().push_back(rows);
        self
    }

    pub fn with_row(self, row: MockRow) -> Self {
        self.rows.lock().unwrap().push_back(row);
        self
    }

    /// Returning `id` from an insert
    pub fn with_id(self, id: i64) -> Self {
        self.with_row(MockRow::new(vec![("id", DatabaseValue::Int64(id))]))
    }

    pub fn failing(self, error: ModelError) -> Self {
        *self.failure.lock().unwrap() = Some(error);
        self
    }

    pub fn statements(&self) -> Vec<(String, Vec<DatabaseValue>)> {
        self.statements.lock().unwrap().clone()
    }

    pub fn sql(&self) -> Vec<String> {
        self.statements().into_iter().map(|(sql, _)| sql).collect()
    }

    fn record(&self, sql: &str, params: &[DatabaseValue]) -> OrmResult<()> {
        self.statements
            .lock()
            .unwrap()
            .push((sql.to_string(), params.to_vec()));
        match self.failure.lock().unwrap().clone() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl Store for MockStore {
    async fn execute(&self, sql: &str, params: &[DatabaseValue]) -> OrmResult<u64> {
        self.record(sql, params)?;
        Ok(self.affected.lock().unwrap().pop_front().unwrap_or(1))
    }

    async fn fetch_all(&self, sql: &str, params: &[DatabaseValue]) -> OrmResult<Vec<Box<dyn DatabaseRow>>> {
        self.record(sql, params)?;
        Ok(self
            .rows
            .lock()
            .unwrap()
            .drain(..)
            .map(|row| Box::new(row) as Box<dyn DatabaseRow>)
            .collect())
    }

    async fn fetch_optional(&self, sql: &str, params: &[DatabaseValue]) -> OrmResult<Option<Box<dyn DatabaseRow>>> {
        self.record(sql, params)?;
        Ok(self
            .rows
            .lock()
            .unwrap()
            .pop_front()
            .map(|row| Box::new(row) as Box<dyn DatabaseRow>))
    }

    async fn close(&self) -> OrmResult<()> {
        Ok(())
    }
}

/// Logger that keeps what it was told
#[derive(Default)]
pub(crate) struct RecordingLogger {
    statements: Mutex<Vec<String>>,
    timings: Mutex<Vec<(String, Outcome)>>,
}

impl RecordingLogger {
    pub fn statements(&self) -> Vec<String> {
        self.statements.lock().unwrap().clone()
    }

    pub fn timings(&self) -> Vec<(String, Outcome)> {
        self.timings.lock().unwrap().clone()
    }

    pub fn labels(&self) -> Vec<String> {
        self.timings().into_iter().map(|(label, _)| label).collect()
    }
}

impl QueryLogger for RecordingLogger {
    fn log_statement(&self, sql: &str, _params: &[DatabaseValue]) {
        self.statements.lock().unwrap().push(sql.to_string());
    }

    fn log_timing(&self, label: &str, _elapsed: Duration, outcome: Outcome) {
        self.timings.lock().unwrap().push((label.to_string(), outcome));
    }
}
