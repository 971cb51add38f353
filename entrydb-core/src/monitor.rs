//! Observation hooks for executed statements
//!
//! An executor reports every statement it sends to the engine to a
//! [`QueryMonitor`]. The default [`TracingMonitor`] turns those reports into
//! `tracing` events; [`NoopMonitor`] drops them.
//!
//! # Example
//!
//! ```rust
//! use entrydb_core::monitor::{QueryEvent, QueryMonitor};
//!
//! struct PrintingMonitor;
//!
//! impl QueryMonitor for PrintingMonitor {
//!     fn on_query(&self, event: &QueryEvent<'_>) {
//!         println!("[{:?}] {}", event.duration, event.sql);
//!     }
//! }
//! ```

use std::time::Duration;

/// The type of SQL statement being executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryType {
    Select,
    Insert,
    Update,
    Delete,
    /// CREATE, ALTER, DROP and PRAGMA statements
    Schema,
    /// BEGIN, COMMIT, END, ROLLBACK, SAVEPOINT and RELEASE
    Transaction,
    Other,
}

impl QueryType {
    /// Detect query type from the leading keyword of a statement.
    pub fn from_sql(sql: &str) -> Self {
        let keyword = sql
            .trim_start()
            .split(|c: char| c.is_whitespace() || c == '(' || c == ';')
            .next()
            .unwrap_or("")
            .to_ascii_uppercase();

        match keyword.as_str() {
            "SELECT" | "WITH" => QueryType::Select,
            "INSERT" => QueryType::Insert,
            "UPDATE" => QueryType::Update,
            "DELETE" => QueryType::Delete,
            "CREATE" | "ALTER" | "DROP" | "PRAGMA" => QueryType::Schema,
            "BEGIN" | "COMMIT" | "END" | "ROLLBACK" | "SAVEPOINT" | "RELEASE" => {
                QueryType::Transaction
            }
            _ => QueryType::Other,
        }
    }
}

/// How a statement ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryOutcome {
    /// The engine accepted the statement and returned this many rows
    Rows(usize),
    /// The engine rejected the statement
    Failed(String),
}

/// A single executed statement.
#[derive(Debug, Clone)]
pub struct QueryEvent<'a> {
    pub sql: &'a str,
    pub query_type: QueryType,
    pub duration: Duration,
    pub outcome: QueryOutcome,
}

/// Observer for executed statements.
pub trait QueryMonitor: Send + Sync {
    fn on_query(&self, event: &QueryEvent<'_>);
}

/// Discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopMonitor;

impl QueryMonitor for NoopMonitor {
    fn on_query(&self, _event: &QueryEvent<'_>) {}
}

/// Emits executed statements as `tracing` events.
///
/// Successful statements are logged at `DEBUG`, rejected ones at `WARN`.
#[derive(Debug, Clone)]
pub struct TracingMonitor {
    /// Truncate long SQL strings (in bytes). `None` means no truncation.
    pub max_sql_length: Option<usize>,
}

impl Default for TracingMonitor {
    fn default() -> Self {
        Self {
            max_sql_length: Some(200),
        }
    }
}

impl TracingMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set maximum SQL length to display.
    pub fn max_sql_length(mut self, len: usize) -> Self {
        self.max_sql_length = Some(len);
        self
    }

    /// Disable SQL truncation.
    pub fn no_truncate(mut self) -> Self {
        self.max_sql_length = None;
        self
    }

    fn truncate_sql<'s>(&self, sql: &'s str) -> std::borrow::Cow<'s, str> {
        match self.max_sql_length {
            Some(max) if sql.len() > max => {
                format!("{}...", truncate_sql_bytes(sql, max)).into()
            }
            _ => sql.into(),
        }
    }
}

impl QueryMonitor for TracingMonitor {
    fn on_query(&self, event: &QueryEvent<'_>) {
        let sql = self.truncate_sql(event.sql.trim());
        match &event.outcome {
            QueryOutcome::Rows(rows) => tracing::debug!(
                query_type = ?event.query_type,
                duration_us = event.duration.as_micros() as u64,
                rows = *rows,
                "executed sql: {}",
                sql
            ),
            QueryOutcome::Failed(message) => tracing::warn!(
                query_type = ?event.query_type,
                duration_us = event.duration.as_micros() as u64,
                error = %message,
                "sql rejected: {}",
                sql
            ),
        }
    }
}

fn truncate_sql_bytes(sql: &str, max_bytes: usize) -> &str {
    if sql.len() <= max_bytes {
        return sql;
    }
    let mut end = max_bytes;
    while end > 0 && !sql.is_char_boundary(end) {
        end -= 1;
    }
    &sql[..end]
}
