//! Statement builder
//!
//! A [`Query`] accepts clause calls one at a time and checks each against the
//! grammar in [`clause`] before touching its SQL text. When bound to an
//! executor it also checks table and field names against the schema catalog.
//! A query runs once; running it consumes it.

pub mod clause;
pub mod selection;

pub use clause::Clause;
pub use selection::{IntoSelection, Selection};

use crate::catalog::SchemaCatalog;
use crate::mapper::{self, assignments, encode_value};
use crate::record::IntoFields;
use crate::{Error, Executor, Record, Result, Row, Value};
use clause::{describe, describe_all};
use std::fmt;

/// A single SQL statement under construction
pub struct Query<'a> {
    executor: Option<&'a mut dyn Executor>,
    sql: String,
    history: Vec<Clause>,
    selection: Option<Selection>,
    table: Option<String>,
    allowed: Option<Vec<String>>,
    consumed: bool,
}

impl Query<'static> {
    /// Create an unbound query; names are not checked against any schema
    pub fn new() -> Self {
        Self::with_executor(None)
    }
}

impl Default for Query<'static> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> Query<'a> {
    /// Create a query bound to an executor, which also serves as its catalog
    ///
    /// # Examples
    /// ```
    /// use entrydb_core::executor::sqlite::{OpenOptions, SqliteExecutor};
    /// use entrydb_core::{Executor, Query};
    ///
    /// let mut exec = SqliteExecutor::in_memory(&OpenOptions::new()).unwrap();
    /// exec.fetch_all("CREATE TABLE people (id INTEGER PRIMARY KEY, name TEXT)").unwrap();
    ///
    /// let mut query = Query::bound(&mut exec);
    /// query.select("*").unwrap().from("people").unwrap();
    /// assert_eq!(query.sql(), "SELECT * FROM people ");
    /// assert!(query.run().unwrap().is_empty());
    /// ```
    pub fn bound(executor: &'a mut dyn Executor) -> Self {
        Self::with_executor(Some(executor))
    }

    fn with_executor(executor: Option<&'a mut dyn Executor>) -> Self {
        Self {
            executor,
            sql: String::new(),
            history: Vec::new(),
            selection: None,
            table: None,
            allowed: None,
            consumed: false,
        }
    }

    /// The SQL text built so far
    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// Clauses applied so far, oldest first
    pub fn history(&self) -> &[Clause] {
        &self.history
    }

    pub fn table(&self) -> Option<&str> {
        self.table.as_deref()
    }

    pub fn selection(&self) -> Option<&Selection> {
        self.selection.as_ref()
    }

    /// Explicitly selected fields; `None` before SELECT or for `*`
    pub fn fields(&self) -> Option<&[String]> {
        match &self.selection {
            Some(Selection::Fields(fields)) => Some(fields),
            _ => None,
        }
    }

    pub fn is_bound(&self) -> bool {
        self.executor.is_some()
    }

    /// Whether the query has been run
    pub fn is_consumed(&self) -> bool {
        self.consumed
    }

    fn state(&self) -> Option<Clause> {
        self.history.last().copied()
    }

    fn check(&self, clause: Clause) -> Result<()> {
        if self.consumed {
            return Err(Error::query_syntax(
                "This query has already been run; build a new one",
            ));
        }
        let state = self.state();
        if clause.can_follow(state) {
            return Ok(());
        }
        Err(Error::query_syntax(format!(
            "Query syntax incorrect or not supported. `{}` cannot follow `{}`; valid next clauses: {}",
            clause,
            describe(state),
            describe_all(Clause::successors(state))
        )))
    }

    fn push(&mut self, clause: Clause, text: &str) {
        self.history.push(clause);
        self.sql.push_str(text);
    }

    /// Load the allowed SET/VALUES keys for `table`
    fn bind_write_target(&mut self, table: &str) -> Result<()> {
        if let Some(exec) = self.executor.as_deref_mut() {
            if !exec.table_exists(table)? {
                return Err(Error::schema(format!(
                    "Database has no table called '{table}'"
                )));
            }
            self.allowed = Some(exec.column_names(table)?);
        }
        self.table = Some(table.to_string());
        Ok(())
    }

    fn check_keys(&self, fields: &[(String, Value)]) -> Result<()> {
        for (i, (key, _)) in fields.iter().enumerate() {
            if fields[..i].iter().any(|(earlier, _)| earlier == key) {
                return Err(Error::query_syntax(format!(
                    "Column '{key}' is given more than once"
                )));
            }
        }

        let Some(allowed) = &self.allowed else {
            return Ok(());
        };
        let unknown: Vec<&str> = fields
            .iter()
            .map(|(key, _)| key.as_str())
            .filter(|key| !allowed.iter().any(|column| column == key))
            .collect();
        if unknown.is_empty() {
            return Ok(());
        }
        Err(Error::query_syntax(format!(
            "Data keys [{}] are not columns of table '{}'. Table columns: [{}]",
            unknown.join(", "),
            self.table.as_deref().unwrap_or_default(),
            allowed.join(", ")
        )))
    }

    fn require_column(&mut self, column: &str) -> Result<()> {
        let (Some(exec), Some(table)) = (self.executor.as_deref_mut(), self.table.as_deref()) else {
            return Ok(());
        };
        let columns = exec.column_names(table)?;
        if columns.iter().any(|c| c == column) {
            return Ok(());
        }
        Err(Error::query_syntax(format!(
            "'{column}' is not a column in the table '{table}'. The table has the following columns: [{}]",
            columns.join(", ")
        )))
    }

    /// SQL `SELECT`. Must be followed by [`Query::from`].
    ///
    /// Accepts `"*"`, a comma-separated field list, or a list of names.
    pub fn select<S: IntoSelection>(&mut self, selection: S) -> Result<&mut Self> {
        self.check(Clause::Select)?;
        let selection = selection.into_selection();
        if let Selection::Fields(fields) = &selection {
            if fields.is_empty() {
                return Err(Error::query_syntax("SELECT needs at least one field"));
            }
            for (i, field) in fields.iter().enumerate() {
                if fields[..i].contains(field) {
                    return Err(Error::query_syntax(format!(
                        "Field '{field}' is selected more than once"
                    )));
                }
            }
        }
        let text = format!("SELECT {} ", selection.to_sql());
        self.selection = Some(selection);
        self.push(Clause::Select, &text);
        Ok(self)
    }

    /// SQL `FROM`. Selected fields must be columns of `table`.
    pub fn from(&mut self, table: &str) -> Result<&mut Self> {
        self.check(Clause::From)?;
        if let Some(exec) = self.executor.as_deref_mut() {
            let columns = exec.column_names(table)?;
            if let Some(Selection::Fields(fields)) = &self.selection {
                let unknown: Vec<&str> = fields
                    .iter()
                    .map(String::as_str)
                    .filter(|field| !columns.iter().any(|c| c == field))
                    .collect();
                if !unknown.is_empty() {
                    return Err(Error::query_syntax(format!(
                        "Some selected field(s): [{}] are not columns in the table '{}'. The table has the following columns: [{}]",
                        unknown.join(", "),
                        table,
                        columns.join(", ")
                    )));
                }
            }
        }
        self.table = Some(table.to_string());
        self.push(Clause::From, &format!("FROM {table} "));
        Ok(self)
    }

    /// SQL `WHERE column = value`, or `WHERE column IS NULL` for a null value
    pub fn where_<V: Into<Value>>(&mut self, column: &str, value: V) -> Result<&mut Self> {
        self.check(Clause::Where)?;
        let value = value.into();
        self.require_column(column)?;
        let text = if value.is_null() {
            format!("WHERE {column} IS NULL ")
        } else {
            format!("WHERE {column} = {} ", encode_value(&value)?)
        };
        self.push(Clause::Where, &text);
        Ok(self)
    }

    /// SQL `WHERE` with a caller-written condition, appended verbatim
    ///
    /// Nothing in `condition` is escaped or validated. Use it for expressions
    /// the builder does not model, or before [`Query::like`].
    pub fn where_raw(&mut self, condition: &str) -> Result<&mut Self> {
        self.check(Clause::Where)?;
        self.push(Clause::Where, &format!("WHERE {condition} "));
        Ok(self)
    }

    /// SQL `LIKE`. Must follow a `WHERE`.
    pub fn like(&mut self, pattern: &str) -> Result<&mut Self> {
        self.check(Clause::Like)?;
        let text = format!("LIKE {} ", encode_value(&Value::from(pattern))?);
        self.push(Clause::Like, &text);
        Ok(self)
    }

    /// SQL `UPDATE`. Must be followed by [`Query::set`].
    pub fn update(&mut self, table: &str) -> Result<&mut Self> {
        self.check(Clause::Update)?;
        self.bind_write_target(table)?;
        self.push(Clause::Update, &format!("UPDATE {table} "));
        Ok(self)
    }

    /// SQL `SET`. Keys must be columns of the updated table.
    pub fn set<F: IntoFields>(&mut self, values: F) -> Result<&mut Self> {
        self.check(Clause::Set)?;
        let fields = values.into_fields();
        if fields.is_empty() {
            return Err(Error::query_syntax("SET needs at least one column"));
        }
        self.check_keys(&fields)?;
        let text = format!("SET {} ", assignments(&fields)?);
        self.push(Clause::Set, &text);
        Ok(self)
    }

    /// SQL `INSERT INTO`. Must be followed by [`Query::values`].
    pub fn insert_into(&mut self, table: &str) -> Result<&mut Self> {
        self.check(Clause::InsertInto)?;
        self.bind_write_target(table)?;
        self.push(Clause::InsertInto, &format!("INSERT INTO {table} "));
        Ok(self)
    }

    /// SQL `VALUES`, with the matching column list
    pub fn values<F: IntoFields>(&mut self, values: F) -> Result<&mut Self> {
        self.check(Clause::Values)?;
        let fields = values.into_fields();
        if fields.is_empty() {
            return Err(Error::query_syntax("VALUES needs at least one column"));
        }
        self.check_keys(&fields)?;
        let columns: Vec<&str> = fields.iter().map(|(key, _)| key.as_str()).collect();
        let literals = fields
            .iter()
            .map(|(_, value)| encode_value(value))
            .collect::<Result<Vec<_>>>()?;
        let text = format!(
            "({}) VALUES ({}) ",
            columns.join(", "),
            literals.join(", ")
        );
        self.push(Clause::Values, &text);
        Ok(self)
    }

    /// SQL `DELETE FROM`. Starts a fresh statement.
    pub fn delete_from(&mut self, table: &str) -> Result<&mut Self> {
        self.check(Clause::DeleteFrom)?;
        if let Some(exec) = self.executor.as_deref_mut() {
            if !exec.table_exists(table)? {
                return Err(Error::query_syntax(format!(
                    "Can not perform DELETE FROM on a non-existing table: '{table}'"
                )));
            }
        }
        self.table = Some(table.to_string());
        self.sql = format!("DELETE FROM {table} ");
        self.history.push(Clause::DeleteFrom);
        Ok(self)
    }

    fn prepare(&self) -> Result<()> {
        if self.consumed {
            return Err(Error::query_syntax(
                "This query has already been run; build a new one",
            ));
        }
        let state = self.state();
        if !Clause::is_terminal(state) {
            return Err(Error::query_syntax(format!(
                "Query is incomplete after `{}`; expected one of: {}",
                describe(state),
                describe_all(Clause::successors(state))
            )));
        }
        Ok(())
    }

    /// Run on the bound executor and decode rows into records
    ///
    /// A query without matches yields an empty vector.
    pub fn run(&mut self) -> Result<Vec<Record>> {
        self.prepare()?;
        let Self {
            executor,
            sql,
            selection,
            table,
            consumed,
            ..
        } = self;
        let exec = executor.as_deref_mut().ok_or(Error::NoExecutor)?;
        *consumed = true;
        let rows = exec.fetch_all(sql.as_str())?;
        decode_rows(exec, rows, selection.as_ref(), table.as_deref())
    }

    /// Run on the bound executor and return the engine's rows unchanged
    pub fn run_raw(&mut self) -> Result<Vec<Row>> {
        self.prepare()?;
        let exec = self.executor.as_deref_mut().ok_or(Error::NoExecutor)?;
        self.consumed = true;
        exec.fetch_all(&self.sql)
    }

    /// Run on `executor` instead of the bound one and decode rows
    pub fn run_with<E: Executor + ?Sized>(&mut self, executor: &mut E) -> Result<Vec<Record>> {
        self.prepare()?;
        self.consumed = true;
        let rows = executor.fetch_all(&self.sql)?;
        decode_rows(executor, rows, self.selection.as_ref(), self.table.as_deref())
    }

    /// Run on `executor` instead of the bound one, returning raw rows
    pub fn run_raw_with<E: Executor + ?Sized>(&mut self, executor: &mut E) -> Result<Vec<Row>> {
        self.prepare()?;
        self.consumed = true;
        executor.fetch_all(&self.sql)
    }
}

fn decode_rows<E: Executor + ?Sized>(
    exec: &mut E,
    rows: Vec<Row>,
    selection: Option<&Selection>,
    table: Option<&str>,
) -> Result<Vec<Record>> {
    if rows.is_empty() {
        return Ok(Vec::new());
    }
    let table = table.ok_or_else(|| Error::query_syntax("Query has no table to decode rows for"))?;
    let fields = match selection {
        Some(Selection::Fields(fields)) => fields.clone(),
        _ => exec.column_names(table)?,
    };
    mapper::decode_many(&rows, &fields, table).collect()
}

impl fmt::Display for Query<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.sql.trim())
    }
}

impl fmt::Debug for Query<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Query")
            .field("sql", &self.sql)
            .field("history", &self.history)
            .field("table", &self.table)
            .field("bound", &self.executor.is_some())
            .field("consumed", &self.consumed)
            .finish()
    }
}
