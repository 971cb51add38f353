//! Statement execution interface

use crate::{Result, Value};

/// A positional row as returned by the engine
pub type Row = Vec<Value>;

/// Trait for engines that run finished SQL text
///
/// Calls block until the engine returns. Implementations report engine
/// rejections as [`crate::Error::QueryExecution`].
pub trait Executor {
    /// Execute one statement and return its rows (empty for writes)
    fn fetch_all(&mut self, sql: &str) -> Result<Vec<Row>>;

    /// Key generated by the most recent successful INSERT, if any
    fn last_insert_id(&mut self) -> Result<Option<i64>>;

    /// Number of rows changed by the most recent write statement
    fn rows_affected(&mut self) -> Result<u64>;

    /// Make pending changes durable
    fn persist(&mut self) -> Result<()>;
}

impl<E: Executor + ?Sized> Executor for &mut E {
    fn fetch_all(&mut self, sql: &str) -> Result<Vec<Row>> {
        (**self).fetch_all(sql)
    }

    fn last_insert_id(&mut self) -> Result<Option<i64>> {
        (**self).last_insert_id()
    }

    fn rows_affected(&mut self) -> Result<u64> {
        (**self).rows_affected()
    }

    fn persist(&mut self) -> Result<()> {
        (**self).persist()
    }
}

/// SQLite executor over a single `sqlx` connection
pub mod sqlite {
    use super::*;
    use crate::monitor::{QueryEvent, QueryMonitor, QueryOutcome, QueryType, TracingMonitor};
    use crate::Error;
    use sqlx::sqlite::{SqliteConnectOptions, SqliteConnection, SqliteRow};
    use sqlx::{ConnectOptions, Connection, Row as _, TypeInfo, ValueRef};
    use std::path::Path;
    use std::str::FromStr;
    use std::sync::Arc;
    use std::time::Instant;
    use tokio::runtime::Runtime;

    /// Options for opening a database
    ///
    /// # Examples
    /// ```
    /// use entrydb_core::executor::sqlite::OpenOptions;
    /// use entrydb_core::monitor::NoopMonitor;
    /// use std::sync::Arc;
    ///
    /// let options = OpenOptions::new()
    ///     .create(true)
    ///     .monitor(Arc::new(NoopMonitor));
    /// ```
    #[derive(Clone)]
    pub struct OpenOptions {
        create: bool,
        foreign_keys: bool,
        monitor: Arc<dyn QueryMonitor>,
    }

    impl Default for OpenOptions {
        fn default() -> Self {
            Self {
                create: false,
                foreign_keys: true,
                monitor: Arc::new(TracingMonitor::default()),
            }
        }
    }

    impl std::fmt::Debug for OpenOptions {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.debug_struct("OpenOptions")
                .field("create", &self.create)
                .field("foreign_keys", &self.foreign_keys)
                .finish_non_exhaustive()
        }
    }

    impl OpenOptions {
        pub fn new() -> Self {
            Self::default()
        }

        /// Create the database file when it does not exist
        pub fn create(mut self, create: bool) -> Self {
            self.create = create;
            self
        }

        /// Enforce foreign-key constraints (on by default)
        pub fn foreign_keys(mut self, enabled: bool) -> Self {
            self.foreign_keys = enabled;
            self
        }

        /// Observer that receives every executed statement
        pub fn monitor(mut self, monitor: Arc<dyn QueryMonitor>) -> Self {
            self.monitor = monitor;
            self
        }
    }

    /// Blocking SQLite executor
    ///
    /// Owns a current-thread `tokio` runtime and drives each `sqlx` call to
    /// completion on the caller's thread. A transaction is opened before the
    /// first statement after each commit; [`Executor::persist`] commits it.
    /// Dropping the executor without persisting discards pending changes.
    pub struct SqliteExecutor {
        runtime: Runtime,
        conn: SqliteConnection,
        in_transaction: bool,
        monitor: Arc<dyn QueryMonitor>,
    }

    impl std::fmt::Debug for SqliteExecutor {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.debug_struct("SqliteExecutor")
                .field("in_transaction", &self.in_transaction)
                .finish_non_exhaustive()
        }
    }

    impl SqliteExecutor {
        /// Open the database file at `path`
        pub fn open(path: &str, options: &OpenOptions) -> Result<Self> {
            if !options.create && !Path::new(path).is_file() {
                return Err(Error::missing_database(path));
            }
            let connect = SqliteConnectOptions::new()
                .filename(path)
                .create_if_missing(options.create)
                .foreign_keys(options.foreign_keys);
            Self::connect(connect, options)
        }

        /// Open a private in-memory database
        pub fn in_memory(options: &OpenOptions) -> Result<Self> {
            let connect =
                SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(options.foreign_keys);
            Self::connect(connect, options)
        }

        fn connect(connect: SqliteConnectOptions, options: &OpenOptions) -> Result<Self> {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .map_err(sqlx::Error::Io)?;
            let conn = runtime.block_on(connect.connect())?;
            Ok(Self {
                runtime,
                conn,
                in_transaction: false,
                monitor: options.monitor.clone(),
            })
        }

        /// Commit pending changes and close the connection
        pub fn close(mut self) -> Result<()> {
            self.persist()?;
            let Self { runtime, conn, .. } = self;
            runtime.block_on(conn.close())?;
            Ok(())
        }

        fn run(&mut self, sql: &str) -> Result<Vec<Row>> {
            let started = Instant::now();
            let result = self
                .runtime
                .block_on(sqlx::query(sql).fetch_all(&mut self.conn));

            let (outcome, result) = match result {
                Ok(rows) => match rows.iter().map(decode_row).collect::<Result<Vec<_>>>() {
                    Ok(rows) => (QueryOutcome::Rows(rows.len()), Ok(rows)),
                    Err(err) => (QueryOutcome::Failed(err.to_string()), Err(err)),
                },
                Err(err) => {
                    let message = err
                        .as_database_error()
                        .map(|db| db.message().to_string())
                        .unwrap_or_else(|| err.to_string());
                    (
                        QueryOutcome::Failed(message.clone()),
                        Err(Error::query_execution(message, sql)),
                    )
                }
            };

            self.monitor.on_query(&QueryEvent {
                sql,
                query_type: QueryType::from_sql(sql),
                duration: started.elapsed(),
                outcome,
            });
            result
        }

        fn begin_if_needed(&mut self) -> Result<()> {
            if !self.in_transaction {
                self.run("BEGIN")?;
                self.in_transaction = true;
            }
            Ok(())
        }

        fn single_integer(&mut self, sql: &str) -> Result<Option<i64>> {
            let rows = self.fetch_all(sql)?;
            Ok(rows
                .into_iter()
                .next()
                .and_then(|row| row.into_iter().next())
                .and_then(|value| value.as_i64()))
        }
    }

    impl Executor for SqliteExecutor {
        fn fetch_all(&mut self, sql: &str) -> Result<Vec<Row>> {
            match transaction_effect(sql) {
                Some(open) => {
                    let rows = self.run(sql)?;
                    self.in_transaction = open;
                    Ok(rows)
                }
                None => {
                    self.begin_if_needed()?;
                    self.run(sql)
                }
            }
        }

        fn last_insert_id(&mut self) -> Result<Option<i64>> {
            Ok(self
                .single_integer("SELECT last_insert_rowid()")?
                .filter(|id| *id != 0))
        }

        fn rows_affected(&mut self) -> Result<u64> {
            Ok(self
                .single_integer("SELECT changes()")?
                .map_or(0, |n| n.max(0) as u64))
        }

        fn persist(&mut self) -> Result<()> {
            if self.in_transaction {
                self.run("COMMIT")?;
                self.in_transaction = false;
            }
            Ok(())
        }
    }

    /// Whether a statement leaves a transaction open (`BEGIN`) or closed
    /// (`COMMIT`, `END`, `ROLLBACK`)
    ///
    /// `SAVEPOINT`, `RELEASE` and `ROLLBACK TO` nest inside the open
    /// transaction and return `None`, like every other statement.
    fn transaction_effect(sql: &str) -> Option<bool> {
        if QueryType::from_sql(sql) != QueryType::Transaction {
            return None;
        }
        let words: Vec<String> = sql
            .split(|c: char| c.is_whitespace() || c == ';')
            .filter(|word| !word.is_empty())
            .map(str::to_ascii_uppercase)
            .collect();
        match words.first().map(String::as_str) {
            Some("BEGIN") => Some(true),
            Some("COMMIT" | "END") => Some(false),
            Some("ROLLBACK") if !words.iter().any(|word| word == "TO") => Some(false),
            _ => None,
        }
    }

    /// Convert a `sqlx` row into positional values by storage class
    fn decode_row(row: &SqliteRow) -> Result<Row> {
        (0..row.len()).map(|index| decode_cell(row, index)).collect()
    }

    fn decode_cell(row: &SqliteRow, index: usize) -> Result<Value> {
        let raw = row.try_get_raw(index)?;
        if raw.is_null() {
            return Ok(Value::Null);
        }
        let storage = raw.type_info().name().to_ascii_uppercase();
        let value = match storage.as_str() {
            "INTEGER" | "BOOLEAN" => Value::Integer(row.try_get_unchecked::<i64, _>(index)?),
            "REAL" => Value::Real(row.try_get_unchecked::<f64, _>(index)?),
            "BLOB" => Value::Blob(row.try_get_unchecked::<Vec<u8>, _>(index)?),
            _ => Value::Text(row.try_get_unchecked::<String, _>(index)?),
        };
        Ok(value)
    }

}
