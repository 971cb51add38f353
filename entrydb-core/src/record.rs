//! Table-tagged records

use crate::{Error, Result, Value};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// One row keyed by column name and tagged with the table it belongs to
///
/// Fields keep insertion order. Setting a key that is already present
/// replaces its value in place.
#[derive(Debug, Clone, Serialize)]
pub struct Record {
    table: String,
    fields: Vec<(String, Value)>,
}

impl Record {
    /// Create an empty record for the given table
    pub fn new(table: &str) -> Self {
        Self {
            table: table.to_string(),
            fields: Vec::new(),
        }
    }

    /// Create a record from column/value pairs
    ///
    /// # Examples
    /// ```
    /// use entrydb_core::{Record, Value};
    ///
    /// let person = Record::from_fields("people", [("name", "Tom"), ("city", "Oslo")]);
    /// assert_eq!(person.get("name"), Some(&Value::from("Tom")));
    /// ```
    pub fn from_fields<K, V, I>(table: &str, fields: I) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
        I: IntoIterator<Item = (K, V)>,
    {
        let mut record = Self::new(table);
        for (key, value) in fields {
            record.set(key, value);
        }
        record
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Set a field, returning the previous value if the key existed
    pub fn set<K, V>(&mut self, key: K, value: V) -> Option<Value>
    where
        K: Into<String>,
        V: Into<Value>,
    {
        let key = key.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(k, _)| *k == key) {
            Some((_, slot)) => Some(std::mem::replace(slot, value)),
            None => {
                self.fields.push((key, value));
                None
            }
        }
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        let index = self.fields.iter().position(|(k, _)| k == key)?;
        Some(self.fields.remove(index).1)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.fields.iter().any(|(k, _)| k == key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(k, _)| k.as_str())
    }

    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.fields.iter().map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn key_set(&self) -> BTreeSet<&str> {
        self.keys().collect()
    }

    pub fn into_fields(self) -> Vec<(String, Value)> {
        self.fields
    }
}

// Mapping semantics: field order does not take part in equality.
impl PartialEq for Record {
    fn eq(&self, other: &Self) -> bool {
        self.table == other.table
            && self.len() == other.len()
            && self.iter().all(|(k, v)| other.get(k) == Some(v))
    }
}

/// Trait for inputs the write operations accept as an entry
///
/// A [`Record`] carries its own table; untagged mappings need one supplied.
pub trait IntoRecord {
    fn into_record(self, table: Option<&str>) -> Result<Record>;
}

fn require_table(table: Option<&str>) -> Result<&str> {
    table.ok_or_else(|| Error::schema("Please provide the table the data belongs to"))
}

impl IntoRecord for Record {
    fn into_record(self, table: Option<&str>) -> Result<Record> {
        match table {
            Some(table) if table != self.table => Err(Error::schema(format!(
                "Entry belongs to table '{}', not '{}'",
                self.table, table
            ))),
            _ => Ok(self),
        }
    }
}

impl IntoRecord for HashMap<String, Value> {
    fn into_record(self, table: Option<&str>) -> Result<Record> {
        Ok(Record::from_fields(require_table(table)?, self))
    }
}

impl IntoRecord for BTreeMap<String, Value> {
    fn into_record(self, table: Option<&str>) -> Result<Record> {
        Ok(Record::from_fields(require_table(table)?, self))
    }
}

impl IntoRecord for Vec<(String, Value)> {
    fn into_record(self, table: Option<&str>) -> Result<Record> {
        Ok(Record::from_fields(require_table(table)?, self))
    }
}

impl IntoRecord for serde_json::Map<String, serde_json::Value> {
    fn into_record(self, table: Option<&str>) -> Result<Record> {
        let mut record = Record::new(require_table(table)?);
        for (key, value) in self {
            record.set(key, Value::try_from(value)?);
        }
        Ok(record)
    }
}

/// Trait for column/value collections accepted by SET and VALUES
pub trait IntoFields {
    fn into_fields(self) -> Vec<(String, Value)>;
}

impl IntoFields for Record {
    fn into_fields(self) -> Vec<(String, Value)> {
        Record::into_fields(self)
    }
}

impl IntoFields for &Record {
    fn into_fields(self) -> Vec<(String, Value)> {
        self.fields.clone()
    }
}

impl IntoFields for HashMap<String, Value> {
    fn into_fields(self) -> Vec<(String, Value)> {
        self.into_iter().collect()
    }
}

impl IntoFields for BTreeMap<String, Value> {
    fn into_fields(self) -> Vec<(String, Value)> {
        self.into_iter().collect()
    }
}

impl IntoFields for Vec<(String, Value)> {
    fn into_fields(self) -> Vec<(String, Value)> {
        self
    }
}

impl IntoFields for Vec<(&str, Value)> {
    fn into_fields(self) -> Vec<(String, Value)> {
        self.into_iter().map(|(k, v)| (k.to_string(), v)).collect()
    }
}

impl<const N: usize> IntoFields for [(&str, Value); N] {
    fn into_fields(self) -> Vec<(String, Value)> {
        self.into_iter().map(|(k, v)| (k.to_string(), v)).collect()
    }
}
