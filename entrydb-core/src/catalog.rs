//! Table metadata introspection
//!
//! Every call re-reads engine metadata; nothing is cached between calls.

use crate::{mapper, Error, Executor, Result, Row, Value};
use serde::Serialize;
use std::fmt;

/// Storage affinity derived from a column's declared type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ColumnType {
    Integer,
    Text,
    Real,
    Blob,
    Numeric,
}

impl ColumnType {
    /// Apply SQLite's affinity rules to a declared type name
    pub fn from_declared(declared: &str) -> Self {
        let upper = declared.to_ascii_uppercase();
        if upper.contains("INT") {
            ColumnType::Integer
        } else if upper.contains("CHAR") || upper.contains("CLOB") || upper.contains("TEXT") {
            ColumnType::Text
        } else if upper.contains("BLOB") || upper.trim().is_empty() {
            ColumnType::Blob
        } else if upper.contains("REAL") || upper.contains("FLOA") || upper.contains("DOUB") {
            ColumnType::Real
        } else {
            ColumnType::Numeric
        }
    }
}

/// A foreign-key edge from one column to a column of another table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForeignKey {
    /// The table the key points to
    pub table: String,
    /// Column the key points to
    pub to_column: String,
    /// Column in the owning table holding the key value
    pub from_column: String,
    pub on_update: Option<String>,
    pub on_delete: Option<String>,
    pub id: i64,
    pub seq: i64,
    pub match_mode: Option<String>,
}

impl ForeignKey {
    pub fn new(table: &str, to_column: &str) -> Self {
        Self {
            table: table.to_string(),
            to_column: to_column.to_string(),
            from_column: String::new(),
            on_update: None,
            on_delete: None,
            id: 0,
            seq: 0,
            match_mode: None,
        }
    }

    pub fn on_update(mut self, action: &str) -> Self {
        self.on_update = Some(action.to_string());
        self
    }

    pub fn on_delete(mut self, action: &str) -> Self {
        self.on_delete = Some(action.to_string());
        self
    }

    /// Render as a table constraint
    pub fn to_sql(&self) -> String {
        let mut sql = format!(
            "FOREIGN KEY ({}) REFERENCES {} ({})",
            self.from_column, self.table, self.to_column
        );
        if let Some(action) = &self.on_update {
            sql.push_str(&format!(" ON UPDATE {action}"));
        }
        if let Some(action) = &self.on_delete {
            sql.push_str(&format!(" ON DELETE {action}"));
        }
        sql
    }
}

/// Description of one table column
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Column {
    pub name: String,
    /// Declared type exactly as written in the schema
    pub declared_type: String,
    pub column_type: ColumnType,
    pub not_null: bool,
    pub default: Option<Value>,
    pub primary_key: bool,
    /// Position in the table, starting at 0
    pub ordinal: i64,
    pub foreign_key: Option<ForeignKey>,
}

impl Column {
    /// Describe a column; primary-key columns must be declared `INTEGER`
    ///
    /// # Examples
    /// ```
    /// use entrydb_core::Column;
    ///
    /// let id = Column::new("id", "INTEGER").primary_key().unwrap();
    /// assert!(Column::new("id", "TEXT").primary_key().is_err());
    /// ```
    pub fn new(name: &str, declared_type: &str) -> Self {
        Self {
            name: name.to_string(),
            declared_type: declared_type.to_string(),
            column_type: ColumnType::from_declared(declared_type),
            not_null: false,
            default: None,
            primary_key: false,
            ordinal: 0,
            foreign_key: None,
        }
    }

    /// Mark as the table's primary key
    pub fn primary_key(mut self) -> Result<Self> {
        if !self.declared_type.eq_ignore_ascii_case("INTEGER") {
            return Err(Error::schema(format!(
                "Primary key columns must have sqlite type `INTEGER`, not '{}' (column '{}')",
                self.declared_type, self.name
            )));
        }
        self.primary_key = true;
        Ok(self)
    }

    pub fn not_null(mut self) -> Self {
        self.not_null = true;
        self
    }

    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    /// Attach a foreign key owned by this column
    pub fn references(mut self, mut key: ForeignKey) -> Self {
        key.from_column = self.name.clone();
        self.foreign_key = Some(key);
        self
    }

    /// Render as a column definition for CREATE TABLE / ADD COLUMN
    pub fn to_sql(&self) -> Result<String> {
        let mut sql = format!("\"{}\" {}", self.name.replace('"', "\"\""), self.declared_type);
        if self.primary_key {
            sql.push_str(" PRIMARY KEY");
        }
        if self.not_null {
            sql.push_str(" NOT NULL");
        }
        if let Some(default) = &self.default {
            sql.push_str(&format!(" DEFAULT {}", mapper::encode_value(default)?));
        }
        Ok(sql)
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut attrs = vec![
            self.ordinal.to_string(),
            self.name.clone(),
            self.declared_type.clone(),
        ];
        if self.not_null {
            attrs.push("NOT NULL".to_string());
        }
        if let Some(default) = &self.default {
            attrs.push(format!("DEFAULT: {default}"));
        }
        if self.primary_key {
            attrs.push("PRIMARY KEY".to_string());
        }
        if let Some(key) = &self.foreign_key {
            attrs.push(key.to_sql());
        }
        write!(f, "Column({})", attrs.join(", "))
    }
}

/// Quote an identifier for use inside metadata statements
pub fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Metadata queries available on every executor
pub trait SchemaCatalog: Executor {
    /// Names of all user tables
    fn list_tables(&mut self) -> Result<Vec<String>> {
        let rows = self.fetch_all(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY rowid",
        )?;
        Ok(rows
            .into_iter()
            .filter_map(|row| row.into_iter().next())
            .filter_map(|value| match value {
                Value::Text(name) => Some(name),
                _ => None,
            })
            .collect())
    }

    fn table_exists(&mut self, name: &str) -> Result<bool> {
        Ok(self.list_tables()?.iter().any(|table| table == name))
    }

    /// Columns of `table` ordered by position, with foreign keys attached
    fn columns(&mut self, table: &str) -> Result<Vec<Column>> {
        if !self.table_exists(table)? {
            return Err(Error::schema(format!(
                "Database has no table called '{table}'"
            )));
        }

        let rows = self.fetch_all(&format!("PRAGMA table_info({})", quote_identifier(table)))?;
        let mut columns = rows
            .iter()
            .map(column_from_row)
            .collect::<Result<Vec<_>>>()?;
        columns.sort_by_key(|column| column.ordinal);

        for key in self.foreign_keys(table)? {
            if let Some(column) = columns.iter_mut().find(|c| c.name == key.from_column) {
                column.foreign_key = Some(key);
            }
        }
        Ok(columns)
    }

    fn column_names(&mut self, table: &str) -> Result<Vec<String>> {
        Ok(self.columns(table)?.into_iter().map(|c| c.name).collect())
    }

    fn is_column(&mut self, table: &str, column: &str) -> Result<bool> {
        Ok(self.column_names(table)?.iter().any(|name| name == column))
    }

    /// The single primary-key column of `table`
    ///
    /// Tables with a composite primary key, or a key column not declared
    /// `INTEGER`, are rejected rather than resolved to a key column.
    fn primary_key_column(&mut self, table: &str, required: bool) -> Result<Option<String>> {
        let mut keys: Vec<Column> = self
            .columns(table)?
            .into_iter()
            .filter(|c| c.primary_key)
            .collect();

        match keys.len() {
            0 if required => Err(Error::schema(format!(
                "The table '{table}' has no column defined as a `PRIMARY KEY`"
            ))),
            0 => Ok(None),
            1 => {
                let key = keys.remove(0);
                if !key.declared_type.eq_ignore_ascii_case("INTEGER") {
                    return Err(Error::schema(format!(
                        "Primary key columns must have sqlite type `INTEGER`, not '{}' (column '{}' of table '{table}')",
                        key.declared_type, key.name
                    )));
                }
                Ok(Some(key.name))
            }
            _ => Err(Error::schema(format!(
                "The table '{table}' has a composite primary key ({}); identity operations need a single key column",
                keys.iter().map(|c| c.name.as_str()).collect::<Vec<_>>().join(", ")
            ))),
        }
    }

    fn foreign_keys(&mut self, table: &str) -> Result<Vec<ForeignKey>> {
        let rows = self.fetch_all(&format!(
            "PRAGMA foreign_key_list({})",
            quote_identifier(table)
        ))?;
        rows.iter().map(foreign_key_from_row).collect()
    }
}

impl<E: Executor + ?Sized> SchemaCatalog for E {}

fn cell<'r>(row: &'r Row, index: usize, what: &str) -> Result<&'r Value> {
    row.get(index)
        .ok_or_else(|| Error::schema(format!("metadata row is missing {what}")))
}

fn text_cell(row: &Row, index: usize, what: &str) -> Result<String> {
    match cell(row, index, what)? {
        Value::Text(s) => Ok(s.clone()),
        Value::Null => Ok(String::new()),
        other => Ok(other.to_string()),
    }
}

fn int_cell(row: &Row, index: usize, what: &str) -> Result<i64> {
    cell(row, index, what)?
        .as_i64()
        .ok_or_else(|| Error::schema(format!("metadata {what} is not an integer")))
}

fn action_cell(row: &Row, index: usize, what: &str) -> Result<Option<String>> {
    let action = text_cell(row, index, what)?;
    Ok(match action.as_str() {
        "" | "NO ACTION" | "NONE" => None,
        _ => Some(action),
    })
}

// PRAGMA table_info: cid, name, type, notnull, dflt_value, pk
fn column_from_row(row: &Row) -> Result<Column> {
    let mut column = Column::new(&text_cell(row, 1, "name")?, &text_cell(row, 2, "type")?);
    column.ordinal = int_cell(row, 0, "cid")?;
    column.not_null = int_cell(row, 3, "notnull")? != 0;
    column.default = match cell(row, 4, "dflt_value")? {
        Value::Null => None,
        value => Some(value.clone()),
    };
    // pk is the 1-based position within the key, 0 for non-key columns
    column.primary_key = int_cell(row, 5, "pk")? != 0;
    Ok(column)
}

// PRAGMA foreign_key_list: id, seq, table, from, to, on_update, on_delete, match
fn foreign_key_from_row(row: &Row) -> Result<ForeignKey> {
    Ok(ForeignKey {
        id: int_cell(row, 0, "id")?,
        seq: int_cell(row, 1, "seq")?,
        table: text_cell(row, 2, "table")?,
        from_column: text_cell(row, 3, "from")?,
        to_column: text_cell(row, 4, "to")?,
        on_update: action_cell(row, 5, "on_update")?,
        on_delete: action_cell(row, 6, "on_delete")?,
        match_mode: action_cell(row, 7, "match")?,
    })
}
