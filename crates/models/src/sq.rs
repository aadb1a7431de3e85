//! Run sea-query output against rusqlite.

use rusqlite::types::Value as SqlValue;
use rusqlite::{Connection, OptionalExtension, Row, params_from_iter};
use tasklane_api::db::Built;

/// Convert `sea_query::Values` into rusqlite bind params.
fn bind_values(values: &sea_query::Values) -> Vec<SqlValue> {
    values
        .0
        .iter()
        .map(|v| match v {
            sea_query::Value::Bool(Some(b)) => SqlValue::Integer(i64::from(*b)),
            sea_query::Value::TinyInt(Some(i)) => SqlValue::Integer(i64::from(*i)),
            sea_query::Value::SmallInt(Some(i)) => SqlValue::Integer(i64::from(*i)),
            sea_query::Value::Int(Some(i)) => SqlValue::Integer(i64::from(*i)),
            sea_query::Value::BigInt(Some(i)) => SqlValue::Integer(*i),
            sea_query::Value::TinyUnsigned(Some(u)) => SqlValue::Integer(i64::from(*u)),
            sea_query::Value::SmallUnsigned(Some(u)) => SqlValue::Integer(i64::from(*u)),
            sea_query::Value::Unsigned(Some(u)) => SqlValue::Integer(i64::from(*u)),
            sea_query::Value::BigUnsigned(Some(u)) => SqlValue::Integer(*u as i64),
            sea_query::Value::Float(Some(f)) => SqlValue::Real(f64::from(*f)),
            sea_query::Value::Double(Some(f)) => SqlValue::Real(*f),
            sea_query::Value::String(Some(s)) => SqlValue::Text(s.to_string()),
            sea_query::Value::Char(Some(c)) => SqlValue::Text(c.to_string()),
            sea_query::Value::Bytes(Some(b)) => SqlValue::Blob(b.to_vec()),
            _ => SqlValue::Null,
        })
        .collect()
}

/// Execute a statement, returning the number of affected rows.
pub fn execute(conn: &Connection, (sql, values): Built) -> rusqlite::Result<usize> {
    conn.execute(&sql, params_from_iter(bind_values(&values)))
}

/// Execute an INSERT and return the new row id.
pub fn insert(conn: &Connection, built: Built) -> rusqlite::Result<i64> {
    execute(conn, built)?;
    Ok(conn.last_insert_rowid())
}

/// Exactly one row.
pub fn query_row<T>(
    conn: &Connection,
    (sql, values): Built,
    f: impl FnOnce(&Row<'_>) -> rusqlite::Result<T>,
) -> rusqlite::Result<T> {
    conn.query_row(&sql, params_from_iter(bind_values(&values)), f)
}

/// At most one row.
pub fn query_opt<T>(
    conn: &Connection,
    built: Built,
    f: impl FnOnce(&Row<'_>) -> rusqlite::Result<T>,
) -> rusqlite::Result<Option<T>> {
    query_row(conn, built, f).optional()
}

/// Every row, mapped.
pub fn query_map<T>(
    conn: &Connection,
    (sql, values): Built,
    f: impl FnMut(&Row<'_>) -> rusqlite::Result<T>,
) -> rusqlite::Result<Vec<T>> {
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params_from_iter(bind_values(&values)), f)?;
    rows.collect()
}

/// First column of a single-row aggregate such as `COUNT(*)`.
pub fn count(conn: &Connection, built: Built) -> rusqlite::Result<i64> {
    query_row(conn, built, |row| row.get(0))
}

/// `MAX(right)` style aggregates that yield NULL on no rows.
pub fn max_opt(conn: &Connection, built: Built) -> rusqlite::Result<Option<i64>> {
    query_row(conn, built, |row| row.get(0))
}
