//! Error types for entrydb

use thiserror::Error;

/// The main error type for entrydb operations
#[derive(Error, Debug)]
pub enum Error {
    /// Connection-level engine failure (opening, closing, decoding)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Missing table or column, missing or composite primary key, key-set mismatch
    #[error("Schema error: {message}")]
    Schema { message: String },

    /// Illegal clause order or unknown field/column name
    #[error("Query syntax error: {message}")]
    QuerySyntax { message: String },

    /// Row width does not match the field list
    #[error("Shape error: row has {found} values but {expected} fields were given")]
    Shape { expected: usize, found: usize },

    /// Value cannot be rendered as a SQL literal
    #[error("Type error: {message}")]
    Type { message: String },

    /// `run` was called without an explicit or bound executor
    #[error("Query does not have an executor to run on")]
    NoExecutor,

    /// The engine rejected a statement
    #[error("Query execution error: {message}\nwhile running: {sql}")]
    QueryExecution { message: String, sql: String },

    /// Identity lookup matched no row
    #[error("No entry in table '{table}' with {column} = {id}")]
    NotFound {
        table: String,
        column: String,
        id: String,
    },

    /// Identity lookup matched more than one row
    #[error("{count} entries in table '{table}' share {column} = {id}")]
    AmbiguousResult {
        table: String,
        column: String,
        id: String,
        count: usize,
    },

    /// Database file does not exist and creation was not requested
    #[error("No database file at '{path}'; open it with `create(true)` to create one")]
    MissingDatabase { path: String },
}

/// Convenience Result type for entrydb operations
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create a new schema error
    pub fn schema(message: impl Into<String>) -> Self {
        Self::Schema {
            message: message.into(),
        }
    }

    /// Create a new query syntax error
    pub fn query_syntax(message: impl Into<String>) -> Self {
        Self::QuerySyntax {
            message: message.into(),
        }
    }

    pub fn shape(expected: usize, found: usize) -> Self {
        Self::Shape { expected, found }
    }

    /// Create a new type error
    pub fn type_error(message: impl Into<String>) -> Self {
        Self::Type {
            message: message.into(),
        }
    }

    /// Create a new execution error carrying the offending statement
    pub fn query_execution(message: impl Into<String>, sql: impl Into<String>) -> Self {
        Self::QueryExecution {
            message: message.into(),
            sql: sql.into(),
        }
    }

    pub fn not_found(
        table: impl Into<String>,
        column: impl Into<String>,
        id: impl Into<String>,
    ) -> Self {
        Self::NotFound {
            table: table.into(),
            column: column.into(),
            id: id.into(),
        }
    }

    pub fn ambiguous(
        table: impl Into<String>,
        column: impl Into<String>,
        id: impl Into<String>,
        count: usize,
    ) -> Self {
        Self::AmbiguousResult {
            table: table.into(),
            column: column.into(),
            id: id.into(),
            count,
        }
    }

    pub fn missing_database(path: impl Into<String>) -> Self {
        Self::MissingDatabase { path: path.into() }
    }
}
