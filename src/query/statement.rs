//! SQL statement buffers.

use sea_query::Value;

use crate::dialect::Dialect;

/// A finished statement: SQL text plus its bound parameters in order.
#[derive(Debug, Clone, PartialEq)]
pub struct SqlStatement {
    pub sql: String,
    pub params: Vec<Value>,
}

impl SqlStatement {
    /// A statement without parameters.
    pub fn raw(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            params: Vec::new(),
        }
    }
}

impl std::fmt::Display for SqlStatement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.sql)
    }
}

/// Accumulates SQL text and parameters for one statement.
///
/// Placeholders are rendered by the dialect, so positional styles such as
/// `$1, $2` stay consistent with the parameter list.
#[derive(Debug)]
pub struct StatementBuilder {
    dialect: Dialect,
    sql: String,
    params: Vec<Value>,
    count: usize,
}

impl StatementBuilder {
    pub fn new(dialect: Dialect) -> Self {
        Self {
            dialect,
            sql: String::new(),
            params: Vec::new(),
            count: 0,
        }
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    pub fn append(&mut self, text: &str) -> &mut Self {
        self.sql.push_str(text);
        self
    }

    /// Append `text` on every call after the first since the last reset.
    /// Used for list separators.
    pub fn append_except_first(&mut self, text: &str) -> &mut Self {
        if self.count > 0 {
            self.sql.push_str(text);
        }
        self.count += 1;
        self
    }

    pub fn reset_count(&mut self) -> &mut Self {
        self.count = 0;
        self
    }

    /// Append a quoted column name.
    pub fn append_column(&mut self, column: &str) -> &mut Self {
        let prepared = self.dialect.prepare_column_name(column);
        self.sql.push_str(&prepared);
        self
    }

    /// Append a qualified, quoted table name.
    pub fn append_table(&mut self, schema: Option<&str>, table: &str) -> &mut Self {
        let prepared = self.dialect.prepare_table_name(schema, table);
        self.sql.push_str(&prepared);
        self
    }

    /// Append a placeholder and record its value.
    pub fn push_param(&mut self, value: Value) -> &mut Self {
        self.params.push(value);
        let placeholder = self.dialect.placeholder(self.params.len());
        self.sql.push_str(&placeholder);
        self
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn build(self) -> SqlStatement {
        SqlStatement {
            sql: self.sql,
            params: self.params,
        }
    }
}
