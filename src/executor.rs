//! Execution seam.
//!
//! The mapping core renders statements; running them belongs to an
//! [`Executor`] supplied by the caller. Drivers report failures as text, so
//! this module also classifies driver messages into the crate's error codes.

use sea_query::Value;

use crate::error::{Result, TideError};

/// One result row, values in select-list order.
pub type Row = Vec<Value>;

/// Runs rendered statements against a connection.
///
/// Implementations report driver failures as [`TideError::Execution`] with
/// the driver's message; the session classifies them.
///
/// # Examples
///
/// ```no_run
/// use tidemark::{Executor, Row, Result};
/// use sea_query::Value;
///
/// struct Recording;
///
/// impl Executor for Recording {
///     fn product_name(&self) -> String {
///         "H2".to_string()
///     }
///
///     fn execute(&self, sql: &str, _params: &[Value]) -> Result<u64> {
///         println!("{sql}");
///         Ok(1)
///     }
///
///     fn execute_insert(&self, sql: &str, params: &[Value]) -> Result<i64> {
///         self.execute(sql, params).map(|_| 1)
///     }
///
///     fn query(&self, _sql: &str, _params: &[Value]) -> Result<Vec<Row>> {
///         Ok(Vec::new())
///     }
/// }
/// ```
pub trait Executor {
    /// Database product name as reported by the driver, used to pick a dialect.
    fn product_name(&self) -> String;

    /// Execute a statement and return the number of rows affected.
    fn execute(&self, sql: &str, params: &[Value]) -> Result<u64>;

    /// Execute an INSERT and return the generated key.
    ///
    /// When the statement ends with a `RETURNING` clause the key is the first
    /// column of the first returned row.
    fn execute_insert(&self, sql: &str, params: &[Value]) -> Result<i64>;

    /// Run a query and return all rows.
    fn query(&self, sql: &str, params: &[Value]) -> Result<Vec<Row>>;
}

fn message_matches(message: &str, patterns: &[&str]) -> bool {
    let lower = message.to_lowercase();
    patterns.iter().any(|p| lower.contains(p))
}

/// Whether a driver message reports a primary key or unique violation.
pub(crate) fn is_duplicate_key_message(message: &str) -> bool {
    message_matches(
        message,
        &[
            "unique constraint",
            "unique index",
            "primary key violation",
            "duplicate key",
            "duplicate entry",
            "constraint failed: unique",
            "constraint failed: primary",
        ],
    )
}

/// Whether a driver message reports a missing table.
pub(crate) fn is_table_not_found_message(message: &str) -> bool {
    message_matches(
        message,
        &["no such table", "doesn't exist", "does not exist", "table not found", "not found; sql statement"],
    ) && !message_matches(message, &["column"])
}

/// Whether a driver message reports that an object already exists.
pub(crate) fn is_already_exists_message(message: &str) -> bool {
    message_matches(message, &["already exists", "duplicate key name"])
}

/// Map an execution failure onto the specific error case it describes.
pub(crate) fn classify(error: TideError, table: &str) -> TideError {
    match error {
        TideError::Execution(message) if is_duplicate_key_message(&message) => TideError::DuplicateKey(message),
        TideError::Execution(message) if is_table_not_found_message(&message) => {
            log::debug!("Classified as missing table {table}: {message}");
            TideError::TableNotFound(table.to_string())
        }
        other => other,
    }
}
