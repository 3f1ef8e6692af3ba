//! Conversions between SQLite rows/binds and JSON records
//!
//! Every table is read generically: the storage class of each value decides
//! the JSON type, refined by the table's JSON and boolean column lists.

use serde_json::Value;
use sqlx::query::Query;
use sqlx::sqlite::{Sqlite, SqliteArguments, SqliteRow};
use sqlx::{Column, Row, TypeInfo, ValueRef};

use crate::{error::Result as HrOpsResult, models::Record, scope::TableSpec};

/// Bind one JSON value to a query
///
/// Arrays and objects are stored as JSON text, booleans as 0/1.
pub fn bind_value<'q>(
    query: Query<'q, Sqlite, SqliteArguments<'q>>,
    value: &Value,
) -> Query<'q, Sqlite, SqliteArguments<'q>> {
    match value {
        Value::Null => query.bind(None::<String>),
        Value::Bool(flag) => query.bind(*flag),
        Value::Number(number) => {
            if let Some(int) = number.as_i64() {
                query.bind(int)
            } else {
                query.bind(number.as_f64().unwrap_or_default())
            }
        }
        Value::String(text) => query.bind(text.clone()),
        other => query.bind(other.to_string()),
    }
}

/// Bind every value in order
pub fn bind_all<'q>(
    mut query: Query<'q, Sqlite, SqliteArguments<'q>>,
    values: &[Value],
) -> Query<'q, Sqlite, SqliteArguments<'q>> {
    for value in values {
        query = bind_value(query, value);
    }
    query
}

/// Map a database row to a [`Record`]
///
/// # Errors
///
/// Returns an error if a column cannot be read from the row
pub fn map_record_row(row: &SqliteRow, table: &TableSpec) -> HrOpsResult<Record> {
    let mut record = Record::new();
    for (index, column) in row.columns().iter().enumerate() {
        let name = column.name();
        let raw = row.try_get_raw(index)?;
        let value = if raw.is_null() {
            Value::Null
        } else {
            let storage = raw.type_info().name().to_string();
            match storage.as_str() {
                "INTEGER" => {
                    let int: i64 = row.try_get_unchecked(index)?;
                    if table.is_bool(name) {
                        Value::Bool(int != 0)
                    } else {
                        Value::from(int)
                    }
                }
                "REAL" => Value::from(row.try_get_unchecked::<f64, _>(index)?),
                "BLOB" => {
                    let bytes: Vec<u8> = row.try_get_unchecked(index)?;
                    Value::from(String::from_utf8_lossy(&bytes).into_owned())
                }
                _ => {
                    let text: String = row.try_get_unchecked(index)?;
                    text_value(text, table.is_json(name))
                }
            }
        };
        record.insert(name.to_string(), value);
    }
    Ok(record)
}

/// JSON columns hold serialized arrays/objects; anything unparsable stays text
fn text_value(text: String, is_json: bool) -> Value {
    if is_json {
        serde_json::from_str(&text).unwrap_or(Value::String(text))
    } else {
        Value::String(text)
    }
}
