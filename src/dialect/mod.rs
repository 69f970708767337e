//! SQL dialects.
//!
//! The set of supported engines is closed: [`Dialect`] names one of them and
//! dereferences to its [`SqlDialect`] capabilities. Statement synthesis only
//! talks to the trait.

mod ansi;
mod h2;
mod mysql;
mod postgres;
mod sqlite;

use std::ops::Deref;

use crate::model::{IndexDefinition, IndexType};
use crate::query::SqlStatement;

pub use ansi::AnsiDialect;
pub use h2::H2Dialect;
pub use mysql::MySqlDialect;
pub use postgres::PostgresDialect;
pub use sqlite::SqliteDialect;

/// How an engine performs insert-or-update by primary key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeStrategy {
    /// `MERGE INTO t (cols) KEY(pk) VALUES (...)`
    MergeKey,
    /// `INSERT OR REPLACE INTO t ...`
    InsertOrReplace,
    /// `INSERT ... ON DUPLICATE KEY UPDATE c = VALUES(c)`
    OnDuplicateKeyUpdate,
    /// `INSERT ... ON CONFLICT (pk) DO UPDATE SET c = EXCLUDED.c`
    OnConflictDoUpdate,
    /// Count by key, then update or insert
    Emulated,
}

/// Statements implementing one merge.
#[derive(Debug, Clone, PartialEq)]
pub enum MergeStatement {
    Native(SqlStatement),
    Emulated {
        /// `SELECT COUNT(*)` by primary key
        probe: SqlStatement,
        update: SqlStatement,
        insert: SqlStatement,
    },
}

/// Column type and trailing clause of an auto-increment column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AutoIncrement {
    pub data_type: String,
    pub clause: Option<&'static str>,
}

/// Capabilities and rendering rules of one engine.
pub trait SqlDialect: Send + Sync {
    fn name(&self) -> &'static str;

    /// Quote an identifier if the engine needs it.
    fn quote_identifier(&self, name: &str) -> String {
        name.to_string()
    }

    fn prepare_table_name(&self, schema: Option<&str>, table: &str) -> String {
        match schema.filter(|s| !s.is_empty()) {
            Some(schema) => format!("{}.{}", self.quote_identifier(schema), self.quote_identifier(table)),
            None => self.quote_identifier(table),
        }
    }

    fn prepare_column_name(&self, name: &str) -> String {
        self.quote_identifier(name)
    }

    /// Placeholder for the parameter at the given 1-based position.
    fn placeholder(&self, _position: usize) -> String {
        "?".to_string()
    }

    /// Convert a neutral data type to this engine's spelling.
    fn convert_sql_type(&self, data_type: &str, _max_length: usize) -> String {
        data_type.to_string()
    }

    /// Type and clause for an auto-increment column.
    fn auto_increment(&self, data_type: &str) -> AutoIncrement {
        AutoIncrement {
            data_type: data_type.to_string(),
            clause: Some("AUTO_INCREMENT"),
        }
    }

    /// Keyword sequence that opens a CREATE TABLE statement.
    fn create_table_prefix(&self, _memory_table: bool) -> &'static str {
        "CREATE TABLE IF NOT EXISTS"
    }

    fn supports_memory_tables(&self) -> bool {
        false
    }

    fn supports_save_points(&self) -> bool {
        true
    }

    /// Whether the engine pages with `LIMIT`/`OFFSET`.
    fn supports_limit_offset(&self) -> bool {
        true
    }

    fn merge_strategy(&self) -> MergeStrategy;

    /// Render CREATE INDEX for a table's index.
    fn prepare_create_index(&self, schema: Option<&str>, table: &str, index: &IndexDefinition) -> String {
        let keyword = match index.kind {
            IndexType::Unique | IndexType::UniqueHash => "CREATE UNIQUE INDEX IF NOT EXISTS",
            IndexType::Standard | IndexType::Hash => "CREATE INDEX IF NOT EXISTS",
        };
        if matches!(index.kind, IndexType::Hash | IndexType::UniqueHash) {
            log::warn!(
                "{} does not support hash indexes; creating {} as a regular index",
                self.name(),
                index.name
            );
        }
        format!(
            "{keyword} {} ON {}({})",
            self.quote_identifier(&index.name),
            self.prepare_table_name(schema, table),
            self.column_list(&index.column_names)
        )
    }

    /// Append paging clauses to a SELECT.
    fn append_limit_offset(&self, sql: &mut String, limit: Option<u64>, offset: Option<u64>) {
        if let Some(limit) = limit {
            sql.push_str(&format!(" LIMIT {limit}"));
        }
        if let Some(offset) = offset {
            sql.push_str(&format!(" OFFSET {offset}"));
        }
    }

    fn column_list(&self, columns: &[String]) -> String {
        columns
            .iter()
            .map(|c| self.prepare_column_name(c))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

static ANSI: AnsiDialect = AnsiDialect;
static H2: H2Dialect = H2Dialect;
static MYSQL: MySqlDialect = MySqlDialect;
static POSTGRES: PostgresDialect = PostgresDialect;
static SQLITE: SqliteDialect = SqliteDialect;

/// The supported engines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Dialect {
    #[default]
    Ansi,
    H2,
    MySql,
    Postgres,
    Sqlite,
}

impl Dialect {
    /// Pick a dialect from the product name reported by the driver.
    pub fn detect(product_name: &str) -> Self {
        let product = product_name.to_ascii_lowercase();
        if product.contains("h2") {
            Dialect::H2
        } else if product.contains("mysql") || product.contains("mariadb") {
            Dialect::MySql
        } else if product.contains("postgres") {
            Dialect::Postgres
        } else if product.contains("sqlite") {
            Dialect::Sqlite
        } else {
            Dialect::Ansi
        }
    }

    pub fn capabilities(&self) -> &'static dyn SqlDialect {
        match self {
            Dialect::Ansi => &ANSI,
            Dialect::H2 => &H2,
            Dialect::MySql => &MYSQL,
            Dialect::Postgres => &POSTGRES,
            Dialect::Sqlite => &SQLITE,
        }
    }
}

impl Deref for Dialect {
    type Target = dyn SqlDialect;

    fn deref(&self) -> &Self::Target {
        self.capabilities()
    }
}

impl std::fmt::Display for Dialect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_from_product_name() {
        assert_eq!(Dialect::detect("H2"), Dialect::H2);
        assert_eq!(Dialect::detect("MySQL"), Dialect::MySql);
        assert_eq!(Dialect::detect("MariaDB"), Dialect::MySql);
        assert_eq!(Dialect::detect("PostgreSQL"), Dialect::Postgres);
        assert_eq!(Dialect::detect("SQLite"), Dialect::Sqlite);
        assert_eq!(Dialect::detect("Apache Derby"), Dialect::Ansi);
    }

    #[test]
    fn test_table_names_are_qualified() {
        assert_eq!(Dialect::H2.prepare_table_name(Some("APP"), "PRODUCT"), "APP.PRODUCT");
        assert_eq!(Dialect::H2.prepare_table_name(Some(""), "PRODUCT"), "PRODUCT");
        assert_eq!(Dialect::MySql.prepare_table_name(Some("app"), "product"), "`app`.`product`");
        assert_eq!(Dialect::Postgres.prepare_column_name("id"), "\"id\"");
    }

    #[test]
    fn test_capability_flags() {
        assert!(Dialect::H2.supports_memory_tables());
        assert!(!Dialect::Postgres.supports_memory_tables());
        assert!(!Dialect::Sqlite.supports_save_points());
        assert!(!Dialect::Ansi.supports_limit_offset());
        assert_eq!(Dialect::Ansi.merge_strategy(), MergeStrategy::Emulated);
    }
}
