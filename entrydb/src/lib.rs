//! entrydb - schema-keyed records over SQLite
//!
//! entrydb reads and writes SQLite rows as [`Record`]s keyed by column name,
//! and builds SQL statements clause by clause with [`Query`], checking clause
//! order and every table and column name against the live schema before the
//! statement reaches the engine.
//!
//! # Examples
//!
//! ```
//! use entrydb::{Column, Database, Record, Value};
//!
//! let mut db = Database::in_memory().unwrap();
//! db.create_table(
//!     "people",
//!     &[
//!         Column::new("id", "INTEGER").primary_key().unwrap(),
//!         Column::new("name", "TEXT"),
//!     ],
//! )
//! .unwrap();
//!
//! let id = db
//!     .add_entry(Record::from_fields("people", [("name", "Tom")]), None, false)
//!     .unwrap()
//!     .unwrap();
//!
//! let people = db
//!     .select("*")
//!     .unwrap()
//!     .from("people")
//!     .unwrap()
//!     .where_("id", id)
//!     .unwrap()
//!     .run()
//!     .unwrap();
//! assert_eq!(people[0].get("name"), Some(&Value::from("Tom")));
//! ```

pub mod database;

// Re-export main types
pub use database::Database;
pub use entrydb_core::executor::sqlite::{OpenOptions, SqliteExecutor};
pub use entrydb_core::monitor::{
    NoopMonitor, QueryEvent, QueryMonitor, QueryOutcome, QueryType, TracingMonitor,
};
pub use entrydb_core::{
    mapper, Clause, Column, ColumnType, Error, Executor, ForeignKey, IntoFields, IntoRecord,
    IntoSelection, Query, Record, Result, Row, SchemaCatalog, Selection, Value,
};
