//! Query Instrumentation
//!
//! Every statement is reported to a [`QueryLogger`] before it reaches the
//! store, and every connection operation is timed by an [`OperationTimer`]
//! that reports on all exit paths.

use std::time::{Duration, Instant};

use async_trait::async_trait;

use crate::backends::core::render_params;
use crate::backends::{DatabaseRow, DatabaseValue, Store};
use crate::error::OrmResult;

/// How a timed operation ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Ok,
    Failed,
    /// The operation's future was dropped before completing
    Cancelled,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Ok => "ok",
            Outcome::Failed => "failed",
            Outcome::Cancelled => "cancelled",
        }
    }
}

/// Sink for generated SQL and operation timings
pub trait QueryLogger: Send + Sync {
    fn log_statement(&self, sql: &str, params: &[DatabaseValue]);

    fn log_timing(&self, label: &str, elapsed: Duration, outcome: Outcome);
}

/// Default sink emitting `tracing` events
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLogger;

impl QueryLogger for TracingLogger {
    fn log_statement(&self, sql: &str, params: &[DatabaseValue]) {
        tracing::debug!(
            target: "rowbound::sql",
            sql = %sql,
            params = %render_params(params),
            "Executing statement"
        );
    }

    fn log_timing(&self, label: &str, elapsed: Duration, outcome: Outcome) {
        let elapsed_ms = elapsed.as_secs_f64() * 1000.0;
        match outcome {
            Outcome::Ok => tracing::debug!(
                target: "rowbound::timing",
                operation = label,
                elapsed_ms,
                "{} completed in {:?}",
                label,
                elapsed
            ),
            Outcome::Failed | Outcome::Cancelled => tracing::warn!(
                target: "rowbound::timing",
                operation = label,
                elapsed_ms,
                outcome = outcome.as_str(),
                "{} {} after {:?}",
                label,
                outcome.as_str(),
                elapsed
            ),
        }
    }
}

/// Scoped timer for one labelled operation.
///
/// Reports when dropped; an operation never passed to [`finish`](Self::finish)
/// is reported as cancelled.
pub struct OperationTimer<'a> {
    label: &'static str,
    started: Instant,
    logger: &'a dyn QueryLogger,
    outcome: Option<Outcome>,
}

impl<'a> OperationTimer<'a> {
    pub fn start(label: &'static str, logger: &'a dyn QueryLogger) -> Self {
        Self {
            label,
            started: Instant::now(),
            logger,
            outcome: None,
        }
    }

    pub fn finish<T>(mut self, result: &OrmResult<T>) {
        self.outcome = Some(if result.is_ok() { Outcome::Ok } else { Outcome::Failed });
    }
}

impl Drop for OperationTimer<'_> {
    fn drop(&mut self) {
        let outcome = self.outcome.unwrap_or(Outcome::Cancelled);
        self.logger.log_timing(self.label, self.started.elapsed(), outcome);
    }
}

/// Store wrapper logging each statement before delegating
pub(crate) struct LoggedStore<'a> {
    store: &'a dyn Store,
    logger: &'a dyn QueryLogger,
}

impl<'a> LoggedStore<'a> {
    pub(crate) fn new(store: &'a dyn Store, logger: &'a dyn QueryLogger) -> Self {
        Self { store, logger }
    }
}

#[async_trait]
impl<'a> Store for LoggedStore<'a> {
    async fn execute(&self, sql: &str, params: &[DatabaseValue]) -> OrmResult<u64> {
        self.logger.log_statement(sql, params);
        self.store.execute(sql, params).await
    }

    async fn fetch_all(&self, sql: &str, params: &[DatabaseValue]) -> OrmResult<Vec<Box<dyn DatabaseRow>>> {
        self.logger.log_statement(sql, params);
        self.store.fetch_all(sql, params).await
    }

    async fn fetch_optional(&self, sql: &str, params: &[DatabaseValue]) -> OrmResult<Option<Box<dyn DatabaseRow>>> {
        self.logger.log_statement(sql, params);
        self.store.fetch_optional(sql, params).await
    }

    async fn close(&self) -> OrmResult<()> {
        self.store.close().await
    }
}
