//! Shared test fixtures: an in-memory SQLite executor.

#![allow(dead_code)]

use rusqlite::types::{Value as SqliteValue, ValueRef};
use rusqlite::{params_from_iter, Connection};
use sea_query::Value;
use std::cell::RefCell;
use std::sync::Arc;
use tidemark::{Db, Executor, MappingConfig, MappingRegistry, Result, Row, TideError};

/// Runs statements on an in-memory SQLite database and records the SQL.
pub struct SqliteExecutor {
    conn: Connection,
    statements: RefCell<Vec<String>>,
}

impl SqliteExecutor {
    pub fn open() -> Self {
        Self {
            conn: Connection::open_in_memory().expect("open in-memory sqlite"),
            statements: RefCell::new(Vec::new()),
        }
    }

    /// Every statement executed so far, in order.
    pub fn statements(&self) -> Vec<String> {
        self.statements.borrow().clone()
    }

    fn record(&self, sql: &str) {
        self.statements.borrow_mut().push(sql.to_string());
    }
}

fn to_sqlite(value: &Value) -> SqliteValue {
    let converted = match value {
        Value::Bool(v) => v.map(|b| SqliteValue::Integer(i64::from(b))),
        Value::TinyInt(v) => v.map(|x| SqliteValue::Integer(i64::from(x))),
        Value::SmallInt(v) => v.map(|x| SqliteValue::Integer(i64::from(x))),
        Value::Int(v) => v.map(|x| SqliteValue::Integer(i64::from(x))),
        Value::BigInt(v) => v.map(SqliteValue::Integer),
        Value::TinyUnsigned(v) => v.map(|x| SqliteValue::Integer(i64::from(x))),
        Value::SmallUnsigned(v) => v.map(|x| SqliteValue::Integer(i64::from(x))),
        Value::Unsigned(v) => v.map(|x| SqliteValue::Integer(i64::from(x))),
        Value::Float(v) => v.map(|x| SqliteValue::Real(f64::from(x))),
        Value::Double(v) => v.map(SqliteValue::Real),
        Value::String(v) => v.clone().map(SqliteValue::Text),
        Value::Char(v) => v.map(|c| SqliteValue::Text(c.to_string())),
        Value::Bytes(v) => v.clone().map(SqliteValue::Blob),
        Value::BigUnsigned(v) => v.and_then(|x| i64::try_from(x).ok()).map(SqliteValue::Integer),
        Value::Json(v) => v.as_ref().map(|doc| SqliteValue::Text(doc.to_string())),
        // bound as text; coercion parses them back
        Value::ChronoDate(v) => v.as_ref().map(|d| SqliteValue::Text(d.to_string())),
        Value::ChronoTime(v) => v.as_ref().map(|t| SqliteValue::Text(t.to_string())),
        Value::ChronoDateTime(v) => v.as_ref().map(|dt| SqliteValue::Text(dt.to_string())),
        Value::Uuid(v) => v.as_ref().map(|id| SqliteValue::Text(id.to_string())),
        Value::Decimal(v) => v.as_ref().map(|d| SqliteValue::Text(d.to_string())),
        other => panic!("value not supported by the test executor: {other:?}"),
    };
    converted.unwrap_or(SqliteValue::Null)
}

fn from_sqlite(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::String(None),
        ValueRef::Integer(i) => Value::BigInt(Some(i)),
        ValueRef::Real(f) => Value::Double(Some(f)),
        ValueRef::Text(t) => Value::String(Some(String::from_utf8_lossy(t).into_owned())),
        ValueRef::Blob(b) => Value::Bytes(Some(b.to_vec())),
    }
}

fn driver_error(e: rusqlite::Error) -> TideError {
    TideError::Execution(e.to_string())
}

impl Executor for SqliteExecutor {
    fn product_name(&self) -> String {
        "SQLite".to_string()
    }

    fn execute(&self, sql: &str, params: &[Value]) -> Result<u64> {
        self.record(sql);
        let affected = self
            .conn
            .execute(sql, params_from_iter(params.iter().map(to_sqlite)))
            .map_err(driver_error)?;
        Ok(affected as u64)
    }

    fn execute_insert(&self, sql: &str, params: &[Value]) -> Result<i64> {
        self.execute(sql, params)?;
        Ok(self.conn.last_insert_rowid())
    }

    fn query(&self, sql: &str, params: &[Value]) -> Result<Vec<Row>> {
        self.record(sql);
        let mut stmt = self.conn.prepare(sql).map_err(driver_error)?;
        let width = stmt.column_count();
        let rows = stmt
            .query_map(params_from_iter(params.iter().map(to_sqlite)), |row| {
                (0..width).map(|i| row.get_ref(i).map(from_sqlite)).collect::<rusqlite::Result<Row>>()
            })
            .map_err(driver_error)?;
        rows.collect::<rusqlite::Result<Vec<Row>>>().map_err(driver_error)
    }
}

/// A session over a fresh in-memory database with default configuration.
pub fn session() -> Db<SqliteExecutor> {
    Db::open(SqliteExecutor::open(), Arc::new(MappingRegistry::new()), MappingConfig::default())
}
