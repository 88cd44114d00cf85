//! Connection - the public persistence API
//!
//! A [`Connection`] owns one store, one dialect and one query logger for its
//! lifetime and carries no per-call state, so clones share the same pool.
//! Each operation builds a fresh [`Model`] and [`ColumnSet`], delegates SQL
//! to the dialect and is timed under a fixed label.

pub mod instrumentation;

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use chrono::Utc;
use rowbound_validation::ValidationErrors;

use crate::backends::{BackendType, DatabaseRow, DatabaseValue, PostgresStore, SqliteStore, Store};
use crate::columns::ColumnSet;
use crate::config::{redact_url, DatabaseConfig};
use crate::dialect::sql::rebind;
use crate::dialect::{Dialect, PostgresDialect, SqliteDialect};
use crate::error::{ModelError, OrmResult};
use crate::model::{Model, Record};
use crate::query::Query;
use crate::validation::Validator;

use instrumentation::LoggedStore;
pub use instrumentation::{OperationTimer, Outcome, QueryLogger, TracingLogger};

#[derive(Clone)]
pub struct Connection {
    store: Arc<dyn Store>,
    dialect: Arc<dyn Dialect>,
    logger: Arc<dyn QueryLogger>,
}

impl Connection {
    pub fn new(store: Arc<dyn Store>, dialect: Arc<dyn Dialect>) -> Self {
        Self {
            store,
            dialect,
            logger: Arc::new(TracingLogger),
        }
    }

    /// Replace the default `tracing` sink
    pub fn with_logger(mut self, logger: Arc<dyn QueryLogger>) -> Self {
        self.logger = logger;
        self
    }

    /// Open a pool for `config` and pair it with the matching dialect
    pub async fn connect(config: &DatabaseConfig) -> OrmResult<Self> {
        let backend = config.backend()?;
        let connection = match backend {
            BackendType::PostgreSQL => {
                let store = PostgresStore::connect(&config.url, &config.pool).await?;
                Self::new(Arc::new(store), Arc::new(PostgresDialect))
            }
            BackendType::SQLite => {
                let store = SqliteStore::connect(&config.url, &config.pool).await?;
                Self::new(Arc::new(store), Arc::new(SqliteDialect))
            }
        };

        tracing::info!(
            "Connected to {} database at {} (max_connections={})",
            backend,
            redact_url(&config.url),
            config.pool.max_connections
        );
        Ok(connection)
    }

    pub fn dialect(&self) -> &dyn Dialect {
        self.dialect.as_ref()
    }

    pub async fn close(&self) -> OrmResult<()> {
        self.store.close().await
    }

    /// Insert a record.
    ///
    /// A new record (id 0) has its identifier column left out so the backend
    /// assigns it; the assigned id is written back. Both timestamps are set to
    /// the same instant before any SQL is generated and stay set if the store
    /// rejects the insert.
    pub async fn create<R: Record>(&self, record: &mut R, exclude: &[&str]) -> OrmResult<()> {
        self.timed("Create", async move {
            let mut model = Model::new(record)?;
            let mut columns = ColumnSet::for_model(&model)?;
            columns.remove(exclude);
            if model.is_new() {
                columns.remove(&[model.id_column()]);
            }

            let now = Utc::now();
            model.touch_created_at(now);
            model.touch_updated_at(now);

            self.dialect.create(&self.logged_store(), &mut model, &columns).await
        })
        .await
    }

    /// Update a persisted record.
    ///
    /// The identifier and creation timestamp columns are never written. Excluding
    /// every remaining column is a configuration error and leaves the record
    /// untouched.
    pub async fn update<R: Record>(&self, record: &mut R, exclude: &[&str]) -> OrmResult<()> {
        self.timed("Update", async move {
            let mut model = Model::new(record)?;
            let mut columns = ColumnSet::for_model(&model)?;
            columns.remove(&[model.id_column(), model.created_at_column()]);
            columns.remove(exclude);
            if columns.is_empty() {
                return Err(ModelError::Configuration(format!(
                    "Nothing to update on table '{}': every column is excluded",
                    model.table_name()
                )));
            }

            model.touch_updated_at(Utc::now());
            self.dialect.update(&self.logged_store(), &mut model, &columns).await
        })
        .await
    }

    /// Create when the record has no identifier yet, update otherwise
    pub async fn save<R: Record>(&self, record: &mut R, exclude: &[&str]) -> OrmResult<()> {
        if record.id() == 0 {
            self.create(record, exclude).await
        } else {
            self.update(record, exclude).await
        }
    }

    pub async fn destroy<R: Record>(&self, record: &mut R) -> OrmResult<()> {
        self.timed("Destroy", async move {
            let model = Model::new(record)?;
            self.dialect.destroy(&self.logged_store(), &model).await
        })
        .await
    }

    /// Load the row with identifier `id` into `record`
    pub async fn find<R: Record>(&self, record: &mut R, id: i64) -> OrmResult<()> {
        self.timed("Find", async move {
            let mut model = Model::new(record)?;
            let columns = ColumnSet::for_model(&model)?;
            self.dialect.find(&self.logged_store(), &mut model, &columns, id).await
        })
        .await
    }

    /// Overwrite `record` with its stored row
    pub async fn reload<R: Record>(&self, record: &mut R) -> OrmResult<()> {
        let id = record.id();
        self.find(record, id).await
    }

    /// Validate, then create only if no field has errors.
    ///
    /// Returns the validation errors when there are any; nothing is written in
    /// that case and the `Create` timer never starts.
    pub async fn validate_and_create<R: Record>(
        &self,
        record: &mut R,
        validator: &dyn Validator,
        exclude: &[&str],
    ) -> OrmResult<ValidationErrors> {
        let errors = {
            let model = Model::new(&mut *record)?;
            validator.validate_create(&model, self).await?
        };
        if errors.has_any() {
            return Ok(errors);
        }

        self.create(record, exclude).await?;
        Ok(ValidationErrors::new())
    }

    pub async fn validate_and_update<R: Record>(
        &self,
        record: &mut R,
        validator: &dyn Validator,
        exclude: &[&str],
    ) -> OrmResult<ValidationErrors> {
        let errors = {
            let model = Model::new(&mut *record)?;
            validator.validate_update(&model, self).await?
        };
        if errors.has_any() {
            return Ok(errors);
        }

        self.update(record, exclude).await?;
        Ok(ValidationErrors::new())
    }

    pub async fn validate_and_save<R: Record>(
        &self,
        record: &mut R,
        validator: &dyn Validator,
        exclude: &[&str],
    ) -> OrmResult<ValidationErrors> {
        let errors = {
            let model = Model::new(&mut *record)?;
            validator.validate_save(&model, self).await?
        };
        if errors.has_any() {
            return Ok(errors);
        }

        self.save(record, exclude).await?;
        Ok(ValidationErrors::new())
    }

    /// Build a query from `?`-style SQL, rewritten to this dialect's placeholders
    pub fn raw_query(&self, sql: &str, args: Vec<DatabaseValue>) -> Query {
        args.into_iter()
            .fold(Query::new(rebind(self.dialect.as_ref(), sql)), |query, arg| query.bind(arg))
    }

    /// Run a statement, returning the number of affected rows
    pub async fn exec(&self, query: &Query) -> OrmResult<u64> {
        self.timed("Exec", async move {
            self.logged_store().execute(query.sql(), query.args()).await
        })
        .await
    }

    pub async fn fetch_all(&self, query: &Query) -> OrmResult<Vec<Box<dyn DatabaseRow>>> {
        self.timed("Query", async move {
            self.logged_store().fetch_all(query.sql(), query.args()).await
        })
        .await
    }

    fn logged_store(&self) -> LoggedStore<'_> {
        LoggedStore::new(self.store.as_ref(), self.logger.as_ref())
    }

    async fn timed<T, F>(&self, label: &'static str, operation: F) -> OrmResult<T>
    where
        F: Future<Output = OrmResult<T>>,
    {
        let timer = OperationTimer::start(label, self.logger.as_ref());
        let result = operation.await;
        timer.finish(&result);
        result
    }
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("dialect", &self.dialect.name())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use async_trait::async_trait;
    use rowbound_validation::{Rule, Rules};

    use super::*;
    use crate::testing::{Account, MockRow, MockStore, RecordingLogger, User};

    fn connection(store: MockStore) -> (Connection, Arc<MockStore>, Arc<RecordingLogger>) {
        let store = Arc::new(store);
        let logger = Arc::new(RecordingLogger::default());
        let conn = Connection::new(store.clone(), Arc::new(PostgresDialect)).with_logger(logger.clone());
        (conn, store, logger)
    }

    fn signup_rules() -> Rules {
        Rules::new()
            .field("email", Rule::Required)
            .field("password", Rule::length(4, 8))
    }

    #[tokio::test]
    async fn test_save_new_record_creates_with_timestamps() {
        let (conn, store, logger) = connection(MockStore::new().with_id(42));
        let mut user = User::new("a@b.co", "secret");
        let started = Utc::now();

        conn.save(&mut user, &[]).await.unwrap();

        assert_eq!(user.id, 42);
        let created_at = user.created_at.unwrap();
        assert!(created_at >= started);
        assert_eq!(user.updated_at, Some(created_at));

        let statements = store.statements();
        assert_eq!(statements.len(), 1);
        assert_eq!(
            statements[0].0,
            r#"INSERT INTO "users" ("email", "password", "created_at", "updated_at") VALUES ($1, $2, $3, $4) RETURNING "id""#
        );
        assert_eq!(statements[0].1[0], DatabaseValue::from("a@b.co"));
        assert_eq!(statements[0].1[2], DatabaseValue::DateTime(created_at));
        assert_eq!(logger.labels(), vec!["Create"]);
    }

    #[tokio::test]
    async fn test_save_persisted_record_updates() {
        let (conn, store, logger) = connection(MockStore::new());
        let mut user = User::new("a@b.co", "secret");
        user.id = 5;

        conn.save(&mut user, &[]).await.unwrap();

        let statements = store.statements();
        assert_eq!(
            statements[0].0,
            r#"UPDATE "users" SET "email" = $1, "password" = $2, "updated_at" = $3 WHERE "id" = $4"#
        );
        assert_eq!(statements[0].1.last(), Some(&DatabaseValue::Int64(5)));
        assert!(user.updated_at.is_some());
        assert_eq!(user.created_at, None);
        assert_eq!(logger.labels(), vec!["Update"]);
    }

    #[tokio::test]
    async fn test_create_applies_exclusions() {
        let (conn, store, _) = connection(MockStore::new().with_id(1));
        let mut user = User::new("a@b.co", "secret");

        conn.create(&mut user, &["password", "nickname"]).await.unwrap();

        assert_eq!(
            store.sql(),
            vec![r#"INSERT INTO "users" ("email", "created_at", "updated_at") VALUES ($1, $2, $3) RETURNING "id""#]
        );
    }

    #[tokio::test]
    async fn test_create_with_explicit_id_keeps_identifier_column() {
        let (conn, store, _) = connection(MockStore::new().with_id(11));
        let mut account = Account {
            id: 11,
            name: "Acme".to_string(),
        };

        conn.create(&mut account, &[]).await.unwrap();

        assert_eq!(
            store.sql(),
            vec![r#"INSERT INTO "accounts" ("id", "name") VALUES ($1, $2) RETURNING "id""#]
        );
        assert_eq!(account.id, 11);
    }

    #[tokio::test]
    async fn test_create_failure_keeps_timestamps() {
        let (conn, store, logger) =
            connection(MockStore::new().failing(ModelError::Execution("unique violation".into())));
        let mut user = User::new("a@b.co", "secret");

        let result = conn.create(&mut user, &[]).await;

        assert!(matches!(result, Err(ModelError::Execution(_))));
        assert!(user.created_at.is_some());
        assert_eq!(user.id, 0);
        assert_eq!(logger.statements(), store.sql());
        assert_eq!(logger.timings(), vec![("Create".to_string(), Outcome::Failed)]);
    }

    #[tokio::test]
    async fn test_update_with_every_column_excluded() {
        let (conn, store, logger) = connection(MockStore::new());
        let mut account = Account {
            id: 7,
            name: "X".to_string(),
        };

        let result = conn.update(&mut account, &["name"]).await;

        assert!(matches!(result, Err(ModelError::Configuration(_))));
        assert!(store.statements().is_empty());
        assert_eq!(account.name, "X");
        assert_eq!(logger.timings(), vec![("Update".to_string(), Outcome::Failed)]);
    }

    #[derive(Debug, Default)]
    struct Event {
        id: i64,
        title: String,
        inserted_at: Option<chrono::DateTime<Utc>>,
    }

    impl Record for Event {
        fn created_at_column(&self) -> &'static str {
            "inserted_at"
        }

        fn id(&self) -> i64 {
            self.id
        }

        fn set_id(&mut self, id: i64) {
            self.id = id;
        }

        fn fields(&self) -> Vec<crate::model::Field> {
            vec![
                crate::model::Field::new("id", self.id),
                crate::model::Field::new("title", &self.title),
                crate::model::Field::new("inserted_at", self.inserted_at),
            ]
        }

        fn hydrate(&mut self, row: &dyn DatabaseRow) -> crate::error::ModelResult<()> {
            use crate::backends::DatabaseRowExt;
            self.id = row.get("id")?;
            self.title = row.get("title")?;
            self.inserted_at = row.try_get("inserted_at")?;
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_update_skips_custom_creation_column() {
        let (conn, store, _) = connection(MockStore::new());
        let mut event = Event {
            id: 5,
            title: "Launch".to_string(),
            inserted_at: Some(Utc::now()),
        };

        conn.update(&mut event, &[]).await.unwrap();

        assert_eq!(
            store.sql(),
            vec![r#"UPDATE "events" SET "title" = $1 WHERE "id" = $2"#]
        );
    }

    #[tokio::test]
    async fn test_update_missing_row_is_not_found() {
        let (conn, _, _) = connection(MockStore::new().with_affected(0));
        let mut account = Account {
            id: 9,
            name: "Gone".to_string(),
        };

        let err = conn.update(&mut account, &[]).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_destroy() {
        let (conn, store, logger) = connection(MockStore::new().with_affected(1).with_affected(0));
        let mut account = Account {
            id: 3,
            name: "Acme".to_string(),
        };

        conn.destroy(&mut account).await.unwrap();
        let err = conn.destroy(&mut account).await.unwrap_err();

        assert_eq!(
            err,
            ModelError::NotFound {
                table: "accounts".to_string(),
                id: 3
            }
        );
        assert_eq!(store.sql()[0], r#"DELETE FROM "accounts" WHERE "id" = $1"#);
        assert_eq!(store.statements()[0].1, vec![DatabaseValue::Int64(3)]);
        assert_eq!(logger.labels(), vec!["Destroy", "Destroy"]);
    }

    #[tokio::test]
    async fn test_reload_overwrites_fields() {
        let row = MockRow::new(vec![
            ("id", DatabaseValue::Int64(9)),
            ("name", DatabaseValue::from("Acme")),
        ]);
        let (conn, store, logger) = connection(MockStore::new().with_row(row));
        let mut account = Account {
            id: 9,
            name: "stale".to_string(),
        };

        conn.reload(&mut account).await.unwrap();

        assert_eq!(account.name, "Acme");
        assert_eq!(
            store.sql(),
            vec![r#"SELECT "id", "name" FROM "accounts" WHERE "id" = $1 LIMIT 1"#]
        );
        assert_eq!(logger.labels(), vec!["Find"]);
    }

    #[tokio::test]
    async fn test_find_missing_row() {
        let (conn, _, _) = connection(MockStore::new());
        let mut account = Account::default();

        let err = conn.find(&mut account, 404).await.unwrap_err();
        assert_eq!(
            err,
            ModelError::NotFound {
                table: "accounts".to_string(),
                id: 404
            }
        );
    }

    #[tokio::test]
    async fn test_validate_and_create_short_circuits() {
        let (conn, store, logger) = connection(MockStore::new());
        let mut user = User::new("", "ab");

        let errors = conn
            .validate_and_create(&mut user, &signup_rules(), &[])
            .await
            .unwrap();

        let expected: ValidationErrors = [("email", "is required"), ("password", "too short")]
            .into_iter()
            .collect();
        assert_eq!(errors, expected);
        assert!(store.statements().is_empty());
        assert!(logger.timings().is_empty());
        assert_eq!(user.created_at, None);
    }

    #[tokio::test]
    async fn test_validate_and_create_matches_create() {
        let (conn, store, logger) = connection(MockStore::new().with_id(3));
        let mut user = User::new("a@b.co", "secret");

        let errors = conn
            .validate_and_create(&mut user, &signup_rules(), &[])
            .await
            .unwrap();

        assert!(!errors.has_any());
        assert_eq!(user.id, 3);
        assert_eq!(store.statements().len(), 1);
        assert_eq!(logger.labels(), vec!["Create"]);

        let (conn, _, _) =
            connection(MockStore::new().failing(ModelError::Execution("disk full".into())));
        let mut user = User::new("a@b.co", "secret");
        let err = conn
            .validate_and_create(&mut user, &signup_rules(), &[])
            .await
            .unwrap_err();
        assert_eq!(err, ModelError::Execution("disk full".into()));
    }

    #[tokio::test]
    async fn test_validator_failure_is_terminal() {
        let (conn, store, _) = connection(MockStore::new());
        let rules = Rules::new().field("email", Rule::Length { min: Some(8), max: Some(2) });
        let mut user = User::new("a@b.co", "secret");

        let result = conn.validate_and_save(&mut user, &rules, &[]).await;

        assert!(matches!(result, Err(ModelError::Validation(_))));
        assert!(store.statements().is_empty());
    }

    struct RejectUpdates;

    #[async_trait]
    impl Validator for RejectUpdates {
        async fn validate(&self, _model: &Model<'_>, _conn: &Connection) -> OrmResult<ValidationErrors> {
            Ok(ValidationErrors::new())
        }

        async fn validate_update(&self, model: &Model<'_>, _conn: &Connection) -> OrmResult<ValidationErrors> {
            let mut errors = ValidationErrors::new();
            errors.add("id", format!("{} is read-only", model.id()));
            Ok(errors)
        }
    }

    #[tokio::test]
    async fn test_operation_hooks_are_distinct() {
        let (conn, store, _) = connection(MockStore::new());
        let mut account = Account {
            id: 4,
            name: "Acme".to_string(),
        };

        let errors = conn
            .validate_and_update(&mut account, &RejectUpdates, &[])
            .await
            .unwrap();
        assert_eq!(errors.get("id").unwrap(), ["4 is read-only"]);

        let errors = conn.validate_and_save(&mut account, &RejectUpdates, &[]).await.unwrap();
        assert!(!errors.has_any());
        assert_eq!(store.statements().len(), 1);
    }

    #[tokio::test]
    async fn test_raw_query_rebinds_and_is_timed() {
        let row = MockRow::new(vec![("count", DatabaseValue::Int64(2))]);
        let (conn, store, logger) = connection(MockStore::new().with_row(row));

        let query = conn.raw_query(
            "UPDATE users SET email = ? WHERE id = ?",
            vec!["x@y.z".into(), 3i64.into()],
        );
        assert_eq!(query.sql(), "UPDATE users SET email = $1 WHERE id = $2");
        assert_eq!(conn.exec(&query).await.unwrap(), 1);

        let rows = conn
            .fetch_all(&conn.raw_query("SELECT COUNT(*) AS count FROM users", vec![]))
            .await
            .unwrap();
        assert_eq!(rows[0].get_by_name("count").unwrap(), DatabaseValue::Int64(2));

        assert_eq!(store.statements()[0].1, vec![DatabaseValue::from("x@y.z"), DatabaseValue::Int64(3)]);
        assert_eq!(logger.labels(), vec!["Exec", "Query"]);
    }

    struct StalledStore;

    #[async_trait]
    impl Store for StalledStore {
        async fn execute(&self, _sql: &str, _params: &[DatabaseValue]) -> OrmResult<u64> {
            std::future::pending().await
        }

        async fn fetch_all(&self, _sql: &str, _params: &[DatabaseValue]) -> OrmResult<Vec<Box<dyn DatabaseRow>>> {
            std::future::pending().await
        }

        async fn fetch_optional(
            &self,
            _sql: &str,
            _params: &[DatabaseValue],
        ) -> OrmResult<Option<Box<dyn DatabaseRow>>> {
            std::future::pending().await
        }

        async fn close(&self) -> OrmResult<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_dropped_operation_is_reported_cancelled() {
        let logger = Arc::new(RecordingLogger::default());
        let conn = Connection::new(Arc::new(StalledStore), Arc::new(PostgresDialect)).with_logger(logger.clone());
        let mut account = Account {
            id: 1,
            name: "Acme".to_string(),
        };

        let result = tokio::time::timeout(Duration::from_millis(20), conn.destroy(&mut account)).await;

        assert!(result.is_err());
        assert_eq!(logger.timings(), vec![("Destroy".to_string(), Outcome::Cancelled)]);
    }

    #[test]
    fn test_connection_is_shareable() {
        fn assert_send_sync_clone<T: Send + Sync + Clone>() {}
        assert_send_sync_clone::<Connection>();
    }
}
