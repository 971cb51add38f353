//! Conversion between positional rows, records and SQL literals

use crate::{Error, Record, Result, Row, Value};

/// Convert one positional row into a record tagged with `table`
///
/// # Examples
/// ```
/// use entrydb_core::{mapper, Value};
///
/// let row = vec![Value::from(2), Value::from("Tom")];
/// let fields = vec!["id".to_string(), "name".to_string()];
/// let entry = mapper::decode(&row, &fields, "people").unwrap();
/// assert_eq!(entry.get("name"), Some(&Value::from("Tom")));
/// ```
pub fn decode(row: &[Value], fields: &[String], table: &str) -> Result<Record> {
    if row.len() != fields.len() {
        return Err(Error::shape(fields.len(), row.len()));
    }
    Ok(Record::from_fields(
        table,
        fields.iter().cloned().zip(row.iter().cloned()),
    ))
}

/// Lazily decode rows into records
///
/// Calling it again over the same rows restarts the sequence.
pub fn decode_many<'a>(rows: &'a [Row], fields: &'a [String], table: &'a str) -> Records<'a> {
    Records {
        rows: rows.iter(),
        fields,
        table,
    }
}

/// Iterator returned by [`decode_many`]
#[derive(Debug, Clone)]
pub struct Records<'a> {
    rows: std::slice::Iter<'a, Row>,
    fields: &'a [String],
    table: &'a str,
}

impl Iterator for Records<'_> {
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        self.rows
            .next()
            .map(|row| decode(row, self.fields, self.table))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.rows.size_hint()
    }
}

/// Render a value as an escaped SQL literal
pub fn encode_value(value: &Value) -> Result<String> {
    match value {
        Value::Null => Ok("null".to_string()),
        Value::Integer(i) => Ok(i.to_string()),
        // `{:?}` keeps the fractional marker so 1.0 is not read back as an integer
        Value::Real(r) if r.is_finite() => Ok(format!("{r:?}")),
        Value::Real(r) => Err(Error::type_error(format!(
            "Cannot convert non-finite number {r} to sql"
        ))),
        Value::Text(s) => Ok(quote(s)),
        Value::TextList(items) => Ok(quote(&items.join(","))),
        Value::Blob(_) => Err(Error::type_error("Cannot convert value of type BLOB to sql")),
    }
}

/// Render `a = 1, b = 'x'` for a SET clause
pub fn assignments(fields: &[(String, Value)]) -> Result<String> {
    let parts = fields
        .iter()
        .map(|(column, value)| Ok(format!("{} = {}", column, encode_value(value)?)))
        .collect::<Result<Vec<_>>>()?;
    Ok(parts.join(", "))
}

fn quote(text: &str) -> String {
    format!("'{}'", text.replace('\'', "''"))
}
