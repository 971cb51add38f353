//! Database facade
//!
//! [`Database`] owns a SQLite executor and layers record-level operations on
//! top of the statement builder: insert, update and delete by primary key,
//! lookups, table dumps and schema management.

use entrydb_core::catalog::quote_identifier;
use entrydb_core::{
    Column, Error, Executor, ForeignKey, IntoRecord, IntoSelection, OpenOptions, Query, Record,
    Result, Row, SchemaCatalog, Selection, SqliteExecutor, Value,
};
use std::collections::BTreeSet;

/// A SQLite database addressed through schema-checked records
#[derive(Debug)]
pub struct Database {
    executor: SqliteExecutor,
    path: Option<String>,
}

impl Database {
    /// Open an existing database file
    pub fn open(path: &str) -> Result<Self> {
        Self::open_with(path, &OpenOptions::new())
    }

    /// Open a database file with explicit options
    ///
    /// # Examples
    /// ```
    /// use entrydb::{Database, OpenOptions};
    ///
    /// let path = std::env::temp_dir().join("entrydb-doc-open.db");
    /// let db = Database::open_with(path.to_str().unwrap(), &OpenOptions::new().create(true)).unwrap();
    /// db.close().unwrap();
    /// ```
    pub fn open_with(path: &str, options: &OpenOptions) -> Result<Self> {
        Ok(Self {
            executor: SqliteExecutor::open(path, options)?,
            path: Some(path.to_string()),
        })
    }

    /// Open a private in-memory database
    pub fn in_memory() -> Result<Self> {
        Self::in_memory_with(&OpenOptions::new())
    }

    pub fn in_memory_with(options: &OpenOptions) -> Result<Self> {
        Ok(Self {
            executor: SqliteExecutor::in_memory(options)?,
            path: None,
        })
    }

    /// File backing the database, `None` when in memory
    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }

    /// Commit pending changes
    pub fn save(&mut self) -> Result<()> {
        self.executor.persist()
    }

    /// Commit pending changes and close the connection
    pub fn close(self) -> Result<()> {
        self.executor.close()
    }

    // Statement builders bound to this database

    /// An empty query bound to this database
    pub fn query(&mut self) -> Query<'_> {
        Query::bound(&mut self.executor)
    }

    pub fn select<S: IntoSelection>(&mut self, selection: S) -> Result<Query<'_>> {
        let mut query = self.query();
        query.select(selection)?;
        Ok(query)
    }

    pub fn update(&mut self, table: &str) -> Result<Query<'_>> {
        let mut query = self.query();
        query.update(table)?;
        Ok(query)
    }

    pub fn insert_into(&mut self, table: &str) -> Result<Query<'_>> {
        let mut query = self.query();
        query.insert_into(table)?;
        Ok(query)
    }

    pub fn delete_from(&mut self, table: &str) -> Result<Query<'_>> {
        let mut query = self.query();
        query.delete_from(table)?;
        Ok(query)
    }

    // Catalog

    /// Names of all user tables
    pub fn tables(&mut self) -> Result<Vec<String>> {
        self.executor.list_tables()
    }

    pub fn table_exists(&mut self, table: &str) -> Result<bool> {
        self.executor.table_exists(table)
    }

    pub fn columns(&mut self, table: &str) -> Result<Vec<Column>> {
        self.executor.columns(table)
    }

    pub fn column_names(&mut self, table: &str) -> Result<Vec<String>> {
        self.executor.column_names(table)
    }

    pub fn is_column(&mut self, table: &str, column: &str) -> Result<bool> {
        self.executor.is_column(table, column)
    }

    /// The primary-key column of `table`, if it declares one
    pub fn primary_key_column(&mut self, table: &str) -> Result<Option<String>> {
        self.executor.primary_key_column(table, false)
    }

    pub fn foreign_keys(&mut self, table: &str) -> Result<Vec<ForeignKey>> {
        self.executor.foreign_keys(table)
    }

    fn require_table(&mut self, table: &str) -> Result<()> {
        let tables = self.tables()?;
        if tables.iter().any(|t| t == table) {
            return Ok(());
        }
        Err(Error::schema(format!(
            "Database has no table called '{table}'. Available tables: [{}]",
            tables.join(", ")
        )))
    }

    fn require_column(&mut self, table: &str, column: &str) -> Result<()> {
        let columns = self.column_names(table)?;
        if columns.iter().any(|c| c == column) {
            return Ok(());
        }
        Err(Error::schema(format!(
            "'{column}' is not a column in the table '{table}'. Available columns: [{}]",
            columns.join(", ")
        )))
    }

    fn key_column(&mut self, table: &str) -> Result<String> {
        self.executor
            .primary_key_column(table, true)?
            .ok_or_else(|| {
                Error::schema(format!(
                    "The table '{table}' has no column defined as a `PRIMARY KEY`"
                ))
            })
    }

    /// Keys of `entry` must equal the table's columns, or be a subset when `part`
    fn check_key_set(&mut self, entry: &Record, part: bool) -> Result<()> {
        let columns = self.column_names(entry.table())?;
        let expected: BTreeSet<&str> = columns.iter().map(String::as_str).collect();
        let given = entry.key_set();

        let unknown: Vec<&str> = given.difference(&expected).copied().collect();
        let missing: Vec<&str> = if part {
            Vec::new()
        } else {
            expected.difference(&given).copied().collect()
        };
        if unknown.is_empty() && missing.is_empty() {
            return Ok(());
        }
        Err(Error::schema(format!(
            "Entry keys do not match the columns of table '{}'. Unknown keys: [{}]. Missing keys: [{}]. Table columns: [{}]",
            entry.table(),
            unknown.join(", "),
            missing.join(", "),
            columns.join(", ")
        )))
    }

    // Records

    /// Add a null value for every column of the entry's table it lacks
    pub fn fill_null(&mut self, mut entry: Record) -> Result<Record> {
        for column in self.column_names(entry.table())? {
            if !entry.contains_key(&column) {
                entry.set(column, Value::Null);
            }
        }
        Ok(entry)
    }

    /// Insert an entry and return the generated key when the table has one
    ///
    /// Any value given for the primary key is replaced so the engine assigns
    /// a fresh one. Untagged mappings need `table`.
    ///
    /// # Examples
    /// ```
    /// use entrydb::{Database, Record};
    ///
    /// let mut db = Database::in_memory().unwrap();
    /// db.run_raw_sql("CREATE TABLE people (id INTEGER PRIMARY KEY, name TEXT)").unwrap();
    /// let id = db
    ///     .add_entry(Record::from_fields("people", [("name", "Tom")]), None, false)
    ///     .unwrap();
    /// assert_eq!(id, Some(1));
    /// ```
    pub fn add_entry<R: IntoRecord>(
        &mut self,
        entry: R,
        table: Option<&str>,
        fill_null: bool,
    ) -> Result<Option<i64>> {
        let mut entry = entry.into_record(table)?;
        let table = entry.table().to_string();
        self.require_table(&table)?;

        let key = self.primary_key_column(&table)?;
        if let Some(key) = &key {
            entry.set(key.as_str(), Value::Null);
        }
        if fill_null {
            entry = self.fill_null(entry)?;
        }
        self.check_key_set(&entry, false)?;

        tracing::debug!(table = %table, fields = entry.len(), "adding entry");
        let mut query = self.query();
        query.insert_into(&table)?.values(&entry)?;
        query.run_raw()?;

        match key {
            Some(_) => self.executor.last_insert_id(),
            None => Ok(None),
        }
    }

    /// Update the row whose primary key matches the entry's
    ///
    /// With `part` the entry may name a subset of the columns and the rest
    /// keep their stored values. With `fill_null` absent columns are set to
    /// null.
    pub fn update_entry<R: IntoRecord>(
        &mut self,
        entry: R,
        table: Option<&str>,
        part: bool,
        fill_null: bool,
    ) -> Result<()> {
        let mut entry = entry.into_record(table)?;
        let table = entry.table().to_string();
        self.require_table(&table)?;

        let key = self.key_column(&table)?;
        let id = key_value(&entry, &key)?;
        if fill_null {
            entry = self.fill_null(entry)?;
        }
        self.check_key_set(&entry, part)?;

        tracing::debug!(table = %table, id = %id, "updating entry");
        let mut query = self.query();
        query.update(&table)?.set(entry)?.where_(&key, id)?;
        query.run_raw()?;
        Ok(())
    }

    /// Delete the row identified by the entry's primary key
    pub fn delete_entry(&mut self, entry: &Record) -> Result<()> {
        let key = self.key_column(entry.table())?;
        let id = key_value(entry, &key)?;
        self.delete_entry_by_id(entry.table(), id)
    }

    /// Delete the row of `table` whose primary key equals `id`
    pub fn delete_entry_by_id<V: Into<Value>>(&mut self, table: &str, id: V) -> Result<()> {
        let key = self.key_column(table)?;
        let id = id.into();

        tracing::debug!(table = %table, id = %id, "deleting entry");
        let mut query = self.query();
        query.delete_from(table)?.where_(&key, id.clone())?;
        query.run_raw()?;

        if self.executor.rows_affected()? == 0 {
            return Err(Error::not_found(table, key, id.to_string()));
        }
        Ok(())
    }

    /// Fetch the row of `table` whose primary key equals `id`
    pub fn get_entry_by_id<V: Into<Value>>(&mut self, table: &str, id: V) -> Result<Record> {
        let key = self.key_column(table)?;
        let id = id.into();
        let mut query = self.query();
        let entries = query
            .select("*")?
            .from(table)?
            .where_(&key, id.clone())?
            .run()?;
        single_entry(entries, table, &key, &id)
    }

    /// Every row of `table` as records
    pub fn get_table(&mut self, table: &str) -> Result<Vec<Record>> {
        self.require_table(table)?;
        let mut query = self.query();
        let entries = query.select("*")?.from(table)?.run()?;
        Ok(entries)
    }

    /// Every row of `table` as positional rows, optionally projected
    pub fn get_table_raw(&mut self, table: &str, only: Option<&[&str]>) -> Result<Vec<Row>> {
        self.require_table(table)?;
        let selection = match only {
            None => Selection::All,
            Some(fields) => {
                for field in fields {
                    self.require_column(table, field)?;
                }
                fields.into_selection()
            }
        };
        let mut query = self.query();
        let rows = query.select(selection)?.from(table)?.run_raw()?;
        Ok(rows)
    }

    /// Run SQL text as-is
    pub fn run_raw_sql(&mut self, sql: &str) -> Result<Vec<Row>> {
        self.executor.fetch_all(sql)
    }

    // Schema management

    /// Create a table from column descriptions
    ///
    /// Foreign keys attached to columns become trailing table constraints.
    ///
    /// # Examples
    /// ```
    /// use entrydb::{Column, Database};
    ///
    /// let mut db = Database::in_memory().unwrap();
    /// db.create_table(
    ///     "people",
    ///     &[
    ///         Column::new("id", "INTEGER").primary_key().unwrap(),
    ///         Column::new("name", "TEXT").not_null(),
    ///     ],
    /// )
    /// .unwrap();
    /// assert_eq!(db.column_names("people").unwrap(), vec!["id", "name"]);
    /// ```
    pub fn create_table(&mut self, table: &str, columns: &[Column]) -> Result<()> {
        if columns.is_empty() {
            return Err(Error::schema(format!(
                "Table '{table}' needs at least one column"
            )));
        }
        if self.table_exists(table)? {
            return Err(Error::schema(format!("Table '{table}' already exists")));
        }

        let mut definitions = columns
            .iter()
            .map(Column::to_sql)
            .collect::<Result<Vec<_>>>()?;
        definitions.extend(
            columns
                .iter()
                .filter_map(|column| column.foreign_key.as_ref())
                .map(ForeignKey::to_sql),
        );

        tracing::debug!(table = %table, columns = columns.len(), "creating table");
        self.executor.fetch_all(&format!(
            "CREATE TABLE {} ({})",
            quote_identifier(table),
            definitions.join(", ")
        ))?;
        Ok(())
    }

    pub fn rename_table(&mut self, table: &str, new_name: &str) -> Result<()> {
        self.require_table(table)?;
        tracing::debug!(table = %table, new_name = %new_name, "renaming table");
        self.executor.fetch_all(&format!(
            "ALTER TABLE {} RENAME TO {}",
            quote_identifier(table),
            quote_identifier(new_name)
        ))?;
        Ok(())
    }

    pub fn drop_table(&mut self, table: &str) -> Result<()> {
        self.require_table(table)?;
        tracing::debug!(table = %table, "dropping table");
        self.executor
            .fetch_all(&format!("DROP TABLE {}", quote_identifier(table)))?;
        Ok(())
    }

    /// Append a column to an existing table
    ///
    /// Columns carrying a foreign key are rejected.
    pub fn add_column(&mut self, table: &str, column: &Column) -> Result<()> {
        self.require_table(table)?;
        if column.foreign_key.is_some() {
            return Err(Error::schema(format!(
                "Foreign key column '{}' can not be added to the existing table '{table}'",
                column.name
            )));
        }
        tracing::debug!(table = %table, column = %column.name, "adding column");
        self.executor.fetch_all(&format!(
            "ALTER TABLE {} ADD COLUMN {}",
            quote_identifier(table),
            column.to_sql()?
        ))?;
        Ok(())
    }

    pub fn rename_column(&mut self, table: &str, column: &str, new_name: &str) -> Result<()> {
        self.require_table(table)?;
        self.require_column(table, column)?;
        tracing::debug!(table = %table, column = %column, new_name = %new_name, "renaming column");
        self.executor.fetch_all(&format!(
            "ALTER TABLE {} RENAME COLUMN {} TO {}",
            quote_identifier(table),
            quote_identifier(column),
            quote_identifier(new_name)
        ))?;
        Ok(())
    }

    pub fn drop_column(&mut self, table: &str, column: &str) -> Result<()> {
        self.require_table(table)?;
        self.require_column(table, column)?;
        tracing::debug!(table = %table, column = %column, "dropping column");
        self.executor.fetch_all(&format!(
            "ALTER TABLE {} DROP COLUMN {}",
            quote_identifier(table),
            quote_identifier(column)
        ))?;
        Ok(())
    }

    /// Whether both databases hold the same tables, columns and rows
    pub fn same_contents(&mut self, other: &mut Database) -> Result<bool> {
        let mut tables = self.tables()?;
        let mut other_tables = other.tables()?;
        tables.sort();
        other_tables.sort();
        if tables != other_tables {
            return Ok(false);
        }

        for table in &tables {
            if self.columns(table)? != other.columns(table)? {
                return Ok(false);
            }
            if self.get_table_raw(table, None)? != other.get_table_raw(table, None)? {
                return Ok(false);
            }
        }
        Ok(true)
    }
}

fn key_value(entry: &Record, key: &str) -> Result<Value> {
    match entry.get(key) {
        Some(value) if !value.is_null() => Ok(value.clone()),
        _ => Err(Error::schema(format!(
            "Entry has no value for the primary key '{key}' of table '{}'",
            entry.table()
        ))),
    }
}

/// Reduce an identity lookup to its single match
fn single_entry(mut entries: Vec<Record>, table: &str, key: &str, id: &Value) -> Result<Record> {
    if entries.len() > 1 {
        return Err(Error::ambiguous(table, key, id.to_string(), entries.len()));
    }
    entries
        .pop()
        .ok_or_else(|| Error::not_found(table, key, id.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use entrydb_core::NoopMonitor;
    use serde_json::json;
    use std::collections::HashMap;
    use std::sync::Arc;

    fn quiet() -> OpenOptions {
        OpenOptions::new().monitor(Arc::new(NoopMonitor))
    }

    fn people_db() -> Database {
        let mut db = Database::in_memory_with(&quiet()).unwrap();
        db.create_table(
            "people",
            &[
                Column::new("id", "INTEGER").primary_key().unwrap(),
                Column::new("name", "TEXT"),
            ],
        )
        .unwrap();
        db
    }

    fn person(name: &str) -> Record {
        Record::from_fields("people", [("name", name)])
    }

    fn temp_path(name: &str) -> String {
        let path = std::env::temp_dir().join(format!("entrydb-{name}-{}.db", std::process::id()));
        let path = path.to_str().unwrap().to_string();
        let _ = std::fs::remove_file(&path);
        path
    }

    #[test]
    fn test_people_scenario() {
        let mut db = people_db();
        for i in 0..10 {
            let id = db.add_entry(person(&format!("name{i}")), None, false).unwrap();
            assert_eq!(id, Some(i + 1));
        }

        db.delete_entry_by_id("people", 3).unwrap();

        let entries = db.get_table("people").unwrap();
        assert_eq!(entries.len(), 9);
        assert!(entries.iter().all(|e| e.get("id") != Some(&Value::from(3))));
    }

    #[test]
    fn test_add_then_get_round_trip() {
        let mut db = people_db();
        let id = db.add_entry(person("Tom"), None, false).unwrap().unwrap();
        let entry = db.get_entry_by_id("people", id).unwrap();
        assert_eq!(
            entry,
            Record::from_fields("people", [("id", Value::from(id)), ("name", Value::from("Tom"))])
        );
    }

    #[test]
    fn test_add_entry_replaces_given_key() {
        let mut db = people_db();
        db.add_entry(person("a"), None, false).unwrap();
        let entry = Record::from_fields("people", [("id", Value::from(1)), ("name", Value::from("b"))]);
        assert_eq!(db.add_entry(entry, None, false).unwrap(), Some(2));
    }

    #[test]
    fn test_add_entry_untagged_mappings() {
        let mut db = people_db();
        let mut fields = HashMap::new();
        fields.insert("name".to_string(), Value::from("Ann"));
        assert!(matches!(
            db.add_entry(fields.clone(), None, false),
            Err(Error::Schema { .. })
        ));
        assert_eq!(db.add_entry(fields, Some("people"), false).unwrap(), Some(1));

        let json = json!({ "name": "Bob" }).as_object().cloned().unwrap();
        assert_eq!(db.add_entry(json, Some("people"), false).unwrap(), Some(2));
        assert_eq!(
            db.get_entry_by_id("people", 2).unwrap().get("name"),
            Some(&Value::from("Bob"))
        );
    }

    #[test]
    fn test_add_entry_unknown_table_lists_tables() {
        let mut db = people_db();
        let err = db
            .add_entry(Record::from_fields("ghosts", [("name", "x")]), None, false)
            .unwrap_err();
        assert!(matches!(err, Error::Schema { .. }));
        assert!(err.to_string().contains("Available tables: [people]"));
    }

    #[test]
    fn test_add_entry_key_set_must_match() {
        let mut db = Database::in_memory_with(&quiet()).unwrap();
        db.run_raw_sql("CREATE TABLE t (id INTEGER PRIMARY KEY, a TEXT, b TEXT)")
            .unwrap();

        let partial = Record::from_fields("t", [("a", "x")]);
        let err = db.add_entry(partial.clone(), None, false).unwrap_err();
        assert!(err.to_string().contains("Missing keys: [b]"));

        let extra = Record::from_fields("t", [("a", "x"), ("b", "y"), ("c", "z")]);
        let err = db.add_entry(extra, None, false).unwrap_err();
        assert!(err.to_string().contains("Unknown keys: [c]"));

        let id = db.add_entry(partial, None, true).unwrap().unwrap();
        assert_eq!(db.get_entry_by_id("t", id).unwrap().get("b"), Some(&Value::Null));
    }

    #[test]
    fn test_add_entry_without_primary_key_returns_none() {
        let mut db = Database::in_memory_with(&quiet()).unwrap();
        db.run_raw_sql("CREATE TABLE tags (label TEXT)").unwrap();
        let id = db
            .add_entry(Record::from_fields("tags", [("label", "red")]), None, false)
            .unwrap();
        assert_eq!(id, None);
        assert_eq!(db.get_table("tags").unwrap().len(), 1);
    }

    #[test]
    fn test_update_part_and_fill_null() {
        let mut db = Database::in_memory_with(&quiet()).unwrap();
        db.run_raw_sql("CREATE TABLE t (id INTEGER PRIMARY KEY, a TEXT, b TEXT)")
            .unwrap();
        db.run_raw_sql("INSERT INTO t VALUES (5, 'x', 'y')").unwrap();
        let change = Record::from_fields("t", [("id", Value::from(5)), ("a", Value::from("z"))]);

        let err = db.update_entry(change.clone(), None, false, false).unwrap_err();
        assert!(matches!(err, Error::Schema { .. }));

        db.update_entry(change.clone(), None, true, false).unwrap();
        assert_eq!(
            db.get_entry_by_id("t", 5).unwrap(),
            Record::from_fields(
                "t",
                [("id", Value::from(5)), ("a", Value::from("z")), ("b", Value::from("y"))]
            )
        );

        db.update_entry(change, None, false, true).unwrap();
        assert_eq!(
            db.get_entry_by_id("t", 5).unwrap(),
            Record::from_fields(
                "t",
                [("id", Value::from(5)), ("a", Value::from("z")), ("b", Value::Null)]
            )
        );
    }

    #[test]
    fn test_update_requires_key_value() {
        let mut db = people_db();
        db.add_entry(person("Tom"), None, false).unwrap();
        let err = db
            .update_entry(person("Tim"), None, true, false)
            .unwrap_err();
        assert!(err.to_string().contains("primary key 'id'"));
    }

    #[test]
    fn test_delete_entry() {
        let mut db = people_db();
        db.add_entry(person("a"), None, false).unwrap();
        db.add_entry(person("b"), None, false).unwrap();

        let entry = db.get_entry_by_id("people", 1).unwrap();
        db.delete_entry(&entry).unwrap();
        assert_eq!(db.get_table("people").unwrap(), vec![
            Record::from_fields("people", [("id", Value::from(2)), ("name", Value::from("b"))])
        ]);
    }

    #[test]
    fn test_delete_missing_entry_is_not_found() {
        let mut db = people_db();
        db.add_entry(person("a"), None, false).unwrap();

        let err = db.delete_entry_by_id("people", 42).unwrap_err();
        match err {
            Error::NotFound { table, column, id } => {
                assert_eq!(table, "people");
                assert_eq!(column, "id");
                assert_eq!(id, "42");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(db.get_table("people").unwrap().len(), 1);
    }

    #[test]
    fn test_get_entry_by_id_not_found() {
        let mut db = people_db();
        assert!(matches!(
            db.get_entry_by_id("people", 1),
            Err(Error::NotFound { .. })
        ));
    }

    #[test]
    fn test_identity_operations_need_primary_key() {
        let mut db = Database::in_memory_with(&quiet()).unwrap();
        db.run_raw_sql("CREATE TABLE tags (label TEXT)").unwrap();
        assert!(matches!(db.get_entry_by_id("tags", 1), Err(Error::Schema { .. })));
        assert!(matches!(db.delete_entry_by_id("tags", 1), Err(Error::Schema { .. })));
    }

    #[test]
    fn test_text_primary_key_table_is_left_unchanged() {
        let mut db = Database::in_memory_with(&quiet()).unwrap();
        db.run_raw_sql("CREATE TABLE codes (code TEXT PRIMARY KEY, label TEXT)")
            .unwrap();
        db.run_raw_sql("INSERT INTO codes VALUES ('old', 'kept')").unwrap();
        let before = db.get_table_raw("codes", None).unwrap();

        let entry = Record::from_fields("codes", [("code", "abc"), ("label", "x")]);
        let err = db.add_entry(entry.clone(), None, false).unwrap_err();
        assert!(matches!(err, Error::Schema { .. }));
        assert!(matches!(
            db.update_entry(entry.clone(), None, false, false),
            Err(Error::Schema { .. })
        ));
        assert!(matches!(db.delete_entry(&entry), Err(Error::Schema { .. })));
        assert!(matches!(
            db.get_entry_by_id("codes", "old"),
            Err(Error::Schema { .. })
        ));
        assert_eq!(db.get_table_raw("codes", None).unwrap(), before);
    }

    #[test]
    fn test_composite_primary_key_is_rejected() {
        let mut db = Database::in_memory_with(&quiet()).unwrap();
        db.run_raw_sql("CREATE TABLE pairs (a INTEGER, b INTEGER, PRIMARY KEY (a, b))")
            .unwrap();
        let err = db.get_entry_by_id("pairs", 1).unwrap_err();
        assert!(err.to_string().contains("composite primary key"));
    }

    #[test]
    fn test_single_entry() {
        let entry = person("a");
        let id = Value::from(1);
        assert_eq!(
            single_entry(vec![entry.clone()], "people", "id", &id).unwrap(),
            entry
        );
        assert!(matches!(
            single_entry(Vec::new(), "people", "id", &id),
            Err(Error::NotFound { .. })
        ));
        match single_entry(vec![entry.clone(), entry], "people", "id", &id) {
            Err(Error::AmbiguousResult { count, .. }) => assert_eq!(count, 2),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_select_star_matches_columns() {
        let mut db = people_db();
        for name in ["a", "b", "c"] {
            db.add_entry(person(name), None, false).unwrap();
        }
        let columns = db.column_names("people").unwrap();

        let entries = db.select("*").unwrap().from("people").unwrap().run().unwrap();
        assert_eq!(entries.len(), 3);
        for entry in entries {
            assert_eq!(entry.keys().collect::<Vec<_>>(), columns);
        }
    }

    #[test]
    fn test_builder_delete_removes_one_row() {
        let mut db = people_db();
        for name in ["a", "b", "c"] {
            db.add_entry(person(name), None, false).unwrap();
        }
        db.delete_from("people")
            .unwrap()
            .where_("id", 2)
            .unwrap()
            .run()
            .unwrap();
        let ids: Vec<_> = db
            .get_table("people")
            .unwrap()
            .iter()
            .filter_map(|e| e.get("id").and_then(Value::as_i64))
            .collect();
        assert_eq!(ids, vec![1, 3]);
    }

    #[test]
    fn test_decoded_rows_reinsert_unchanged() {
        let mut db = people_db();
        db.add_entry(person("O'Brien"), None, false).unwrap();
        db.add_entry(person("Ann"), None, false).unwrap();
        let before = db.get_table("people").unwrap();

        db.run_raw_sql("DELETE FROM people").unwrap();
        for entry in &before {
            db.insert_into("people")
                .unwrap()
                .values(entry)
                .unwrap()
                .run()
                .unwrap();
        }
        assert_eq!(db.get_table("people").unwrap(), before);
    }

    #[test]
    fn test_get_table_raw_projection() {
        let mut db = people_db();
        db.add_entry(person("Tom"), None, false).unwrap();

        assert_eq!(
            db.get_table_raw("people", None).unwrap(),
            vec![vec![Value::from(1), Value::from("Tom")]]
        );
        assert_eq!(
            db.get_table_raw("people", Some(&["name"][..])).unwrap(),
            vec![vec![Value::from("Tom")]]
        );
        let err = db.get_table_raw("people", Some(&["age"][..])).unwrap_err();
        assert!(matches!(err, Error::Schema { .. }));
        assert!(err.to_string().contains("Available columns: [id, name]"));
    }

    #[test]
    fn test_schema_management() {
        let mut db = people_db();
        db.add_column("people", &Column::new("age", "INTEGER").default_value(0))
            .unwrap();
        assert_eq!(db.column_names("people").unwrap(), vec!["id", "name", "age"]);

        db.rename_column("people", "age", "years").unwrap();
        assert!(db.is_column("people", "years").unwrap());
        db.drop_column("people", "years").unwrap();
        assert!(!db.is_column("people", "years").unwrap());
        assert!(matches!(
            db.drop_column("people", "years"),
            Err(Error::Schema { .. })
        ));

        db.rename_table("people", "persons").unwrap();
        assert_eq!(db.tables().unwrap(), vec!["persons"]);
        db.drop_table("persons").unwrap();
        assert!(db.tables().unwrap().is_empty());
        assert!(matches!(db.drop_table("persons"), Err(Error::Schema { .. })));
    }

    #[test]
    fn test_add_column_rejects_foreign_key() {
        let mut db = people_db();
        let owner = Column::new("owner", "INTEGER").references(ForeignKey::new("people", "id"));
        assert!(matches!(
            db.add_column("people", &owner),
            Err(Error::Schema { .. })
        ));
        assert!(matches!(
            db.add_column("ghosts", &Column::new("x", "TEXT")),
            Err(Error::Schema { .. })
        ));
    }

    #[test]
    fn test_foreign_keys_are_created_and_enforced() {
        let mut db = people_db();
        db.create_table(
            "pets",
            &[
                Column::new("id", "INTEGER").primary_key().unwrap(),
                Column::new("owner", "INTEGER")
                    .references(ForeignKey::new("people", "id").on_delete("CASCADE")),
            ],
        )
        .unwrap();

        let keys = db.foreign_keys("pets").unwrap();
        assert_eq!(keys.len(), 1);
        assert_eq!(keys[0].table, "people");
        assert_eq!(keys[0].from_column, "owner");
        assert_eq!(keys[0].on_delete.as_deref(), Some("CASCADE"));

        let orphan = Record::from_fields("pets", [("owner", 99)]);
        assert!(matches!(
            db.add_entry(orphan, None, false),
            Err(Error::QueryExecution { .. })
        ));
    }

    #[test]
    fn test_create_table_rejects_existing() {
        let mut db = people_db();
        assert!(matches!(
            db.create_table("people", &[Column::new("x", "TEXT")]),
            Err(Error::Schema { .. })
        ));
    }

    #[test]
    fn test_same_contents() {
        let mut first = people_db();
        let mut second = people_db();
        first.add_entry(person("a"), None, false).unwrap();
        second.add_entry(person("a"), None, false).unwrap();
        assert!(first.same_contents(&mut second).unwrap());

        second.add_entry(person("b"), None, false).unwrap();
        assert!(!first.same_contents(&mut second).unwrap());
    }

    #[test]
    fn test_raw_transaction_control_then_save() {
        let mut db = people_db();
        db.run_raw_sql("COMMIT").unwrap();
        db.add_entry(person("Tom"), None, false).unwrap();
        db.save().unwrap();

        let mut fresh = Database::in_memory_with(&quiet()).unwrap();
        fresh.run_raw_sql("BEGIN").unwrap();
        fresh.run_raw_sql("CREATE TABLE tags (label TEXT)").unwrap();
        fresh.save().unwrap();
        assert_eq!(fresh.tables().unwrap(), vec!["tags"]);
    }

    #[test]
    fn test_open_missing_file() {
        let path = temp_path("facade-missing");
        assert!(matches!(
            Database::open(&path),
            Err(Error::MissingDatabase { .. })
        ));
    }

    #[test]
    fn test_close_persists_changes() {
        let path = temp_path("facade-close");
        let mut db = Database::open_with(&path, &quiet().create(true)).unwrap();
        assert_eq!(db.path(), Some(path.as_str()));
        db.create_table(
            "people",
            &[
                Column::new("id", "INTEGER").primary_key().unwrap(),
                Column::new("name", "TEXT"),
            ],
        )
        .unwrap();
        db.add_entry(person("Tom"), None, false).unwrap();
        db.close().unwrap();

        let mut db = Database::open_with(&path, &quiet()).unwrap();
        assert_eq!(db.get_table("people").unwrap(), vec![
            Record::from_fields("people", [("id", Value::from(1)), ("name", Value::from("Tom"))])
        ]);
        db.close().unwrap();
        let _ = std::fs::remove_file(&path);
    }
}
