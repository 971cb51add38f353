//! entrydb core - records, a checked SQL statement builder and a SQLite executor
//!
//! This crate provides the building blocks used by the `entrydb` facade:
//! a closed [`Value`] type, table-tagged [`Record`]s, a clause-by-clause
//! [`Query`] builder that validates names against the live schema, and a
//! blocking SQLite [`Executor`].

pub mod builder;
pub mod catalog;
pub mod error;
pub mod executor;
pub mod mapper;
pub mod monitor;
pub mod record;
pub mod value;

// Re-export main types
pub use builder::{Clause, IntoSelection, Query, Selection};
pub use catalog::{Column, ColumnType, ForeignKey, SchemaCatalog};
pub use error::{Error, Result};
pub use executor::sqlite::{OpenOptions, SqliteExecutor};
pub use executor::{Executor, Row};
pub use monitor::{NoopMonitor, QueryMonitor, TracingMonitor};
pub use record::{IntoFields, IntoRecord, Record};
pub use value::Value;
