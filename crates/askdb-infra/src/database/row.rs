//! Decoding native driver rows into JSON scalars.
//!
//! Each backend reports its own column type names, so every dialect gets a
//! decoder keyed on them. NUMERIC and DECIMAL become numbers when they
//! survive the trip through `f64` unchanged and strings otherwise; date and
//! time values are rendered the way the database prints them.

use std::str::FromStr;

use serde_json::{Number, Value};
use sqlx::mysql::MySqlRow;
use sqlx::postgres::{PgRow, PgTypeKind};
use sqlx::sqlite::SqliteRow;
use sqlx::types::chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use sqlx::types::{Decimal, Uuid};
use sqlx::{Column, Row, TypeInfo, ValueRef};

use askdb_types::query::QueryResult;

/// Column names come from the first row; an empty result has none.
pub(crate) fn to_query_result<R: Row>(rows: &[R], decode: fn(&R, usize) -> Value) -> QueryResult {
    let columns = rows
        .first()
        .map(|r| r.columns().iter().map(|c| c.name().to_string()).collect())
        .unwrap_or_default();

    let rows = rows
        .iter()
        .map(|row| (0..row.len()).map(|i| decode(row, i)).collect())
        .collect();

    QueryResult::new(columns, rows)
}

/// SQLite values carry their storage class, so integer, float, text and
/// bytes are tried in turn.
pub(crate) fn sqlite_value(row: &SqliteRow, index: usize) -> Value {
    if let Ok(v) = row.try_get::<Option<i64>, _>(index) {
        return v.map(Value::from).unwrap_or(Value::Null);
    }
    if let Ok(v) = row.try_get::<f64, _>(index) {
        return float(v);
    }
    if let Ok(v) = row.try_get::<String, _>(index) {
        return Value::String(v);
    }
    if let Ok(v) = row.try_get::<bool, _>(index) {
        return Value::Bool(v);
    }
    if let Ok(v) = row.try_get::<Vec<u8>, _>(index) {
        return Value::String(hex(&v));
    }
    Value::Null
}

pub(crate) fn postgres_value(row: &PgRow, index: usize) -> Value {
    let info = match row.try_get_raw(index) {
        Ok(raw) if raw.is_null() => return Value::Null,
        Ok(raw) => raw.type_info().into_owned(),
        Err(_) => return Value::Null,
    };

    let decoded = match info.name() {
        "BOOL" => row.try_get::<bool, _>(index).map(Value::Bool),
        "INT2" => row.try_get::<i16, _>(index).map(Value::from),
        "INT4" => row.try_get::<i32, _>(index).map(Value::from),
        "INT8" => row.try_get::<i64, _>(index).map(Value::from),
        "FLOAT4" => row.try_get::<f32, _>(index).map(float32),
        "FLOAT8" => row.try_get::<f64, _>(index).map(float),
        "NUMERIC" => row.try_get::<Decimal, _>(index).map(decimal),
        "DATE" => row.try_get::<NaiveDate, _>(index).map(display),
        "TIME" => row.try_get::<NaiveTime, _>(index).map(display),
        "TIMESTAMP" => row.try_get::<NaiveDateTime, _>(index).map(display),
        "TIMESTAMPTZ" => row.try_get::<DateTime<Utc>, _>(index).map(timestamptz),
        "UUID" => row.try_get::<Uuid, _>(index).map(display),
        "JSON" | "JSONB" => row.try_get::<Value, _>(index).map(display),
        "BYTEA" => row.try_get::<Vec<u8>, _>(index).map(|b| Value::String(hex(&b))),
        _ if matches!(info.kind(), PgTypeKind::Enum(_)) => {
            row.try_get_unchecked::<String, _>(index).map(Value::String)
        }
        _ => row.try_get::<String, _>(index).map(Value::String),
    };
    decoded.unwrap_or_else(|e| undecodable(info.name(), e))
}

pub(crate) fn mysql_value(row: &MySqlRow, index: usize) -> Value {
    let info = match row.try_get_raw(index) {
        Ok(raw) if raw.is_null() => return Value::Null,
        Ok(raw) => raw.type_info().into_owned(),
        Err(_) => return Value::Null,
    };

    let decoded = match info.name() {
        "BOOLEAN" => row.try_get::<bool, _>(index).map(Value::Bool),
        "TINYINT" | "SMALLINT" | "MEDIUMINT" | "INT" | "BIGINT" => {
            row.try_get::<i64, _>(index).map(Value::from)
        }
        name if name.ends_with(" UNSIGNED") => row.try_get::<u64, _>(index).map(Value::from),
        "YEAR" | "BIT" => row
            .try_get::<u64, _>(index)
            .map(Value::from)
            .or_else(|_| row.try_get::<i64, _>(index).map(Value::from)),
        "FLOAT" => row.try_get::<f32, _>(index).map(float32),
        "DOUBLE" => row.try_get::<f64, _>(index).map(float),
        "DECIMAL" => row.try_get::<Decimal, _>(index).map(decimal),
        "DATE" => row.try_get::<NaiveDate, _>(index).map(display),
        "TIME" => row.try_get::<NaiveTime, _>(index).map(display),
        "DATETIME" | "TIMESTAMP" => row.try_get::<NaiveDateTime, _>(index).map(display),
        "JSON" => row.try_get::<Value, _>(index).map(display),
        "BINARY" | "VARBINARY" | "TINYBLOB" | "BLOB" | "MEDIUMBLOB" | "LONGBLOB" | "GEOMETRY" => {
            row.try_get::<Vec<u8>, _>(index).map(|b| Value::String(hex(&b)))
        }
        _ => row.try_get::<String, _>(index).map(Value::String).or_else(|_| {
            row.try_get_unchecked::<Vec<u8>, _>(index)
                .map(|b| Value::String(String::from_utf8_lossy(&b).into_owned()))
        }),
    };
    decoded.unwrap_or_else(|e| undecodable(info.name(), e))
}

/// Types outside the tables above (arrays, intervals, ranges) render as null.
fn undecodable(type_name: &str, e: sqlx::Error) -> Value {
    tracing::debug!(column_type = type_name, error = %e, "column value not decodable");
    Value::Null
}

fn float(v: f64) -> Value {
    Number::from_f64(v).map(Value::Number).unwrap_or(Value::Null)
}

/// Widen through the shortest decimal form so `0.1f32` stays `0.1`.
fn float32(v: f32) -> Value {
    v.to_string().parse::<f64>().map(float).unwrap_or(Value::Null)
}

/// Exact decimals that an `f64` would alter stay strings.
fn decimal(d: Decimal) -> Value {
    let text = d.normalize().to_string();
    match Number::from_str(&text) {
        Ok(n) if n.to_string() == text => Value::Number(n),
        _ => Value::String(text),
    }
}

fn timestamptz(ts: DateTime<Utc>) -> Value {
    Value::String(ts.format("%Y-%m-%d %H:%M:%S%.f%:z").to_string())
}

fn display(v: impl std::fmt::Display) -> Value {
    Value::String(v.to_string())
}

fn hex(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(2 + bytes.len() * 2);
    out.push_str("0x");
    for b in bytes {
        out.push_str(&format!("{b:02x}"));
    }
    out
}

/// Read a text cell that may be NULL or carry a non-text affinity.
pub(crate) fn text_at(row: &[Value], index: usize) -> Option<String> {
    match row.get(index)? {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

pub(crate) fn int_at(row: &[Value], index: usize) -> Option<i64> {
    match row.get(index)? {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}
