//! MySQL and MariaDB dialect.

use super::{MergeStrategy, SqlDialect};
use crate::model::{IndexDefinition, IndexType};

#[derive(Debug, Clone, Copy, Default)]
pub struct MySqlDialect;

impl SqlDialect for MySqlDialect {
    fn name(&self) -> &'static str {
        "MySQL"
    }

    fn quote_identifier(&self, name: &str) -> String {
        format!("`{}`", name.replace('`', "``"))
    }

    fn convert_sql_type(&self, data_type: &str, max_length: usize) -> String {
        match data_type {
            // VARCHAR needs a length in MySQL
            "VARCHAR" if max_length == 0 => "TEXT".to_string(),
            "UUID" => "CHAR(36)".to_string(),
            other => other.to_string(),
        }
    }

    fn merge_strategy(&self) -> MergeStrategy {
        MergeStrategy::OnDuplicateKeyUpdate
    }

    fn prepare_create_index(&self, schema: Option<&str>, table: &str, index: &IndexDefinition) -> String {
        let (keyword, using) = match index.kind {
            IndexType::Standard => ("CREATE INDEX", ""),
            IndexType::Unique => ("CREATE UNIQUE INDEX", ""),
            IndexType::Hash => ("CREATE INDEX", " USING HASH"),
            IndexType::UniqueHash => ("CREATE UNIQUE INDEX", " USING HASH"),
        };
        format!(
            "{keyword} {}{using} ON {}({})",
            self.quote_identifier(&index.name),
            self.prepare_table_name(schema, table),
            self.column_list(&index.column_names)
        )
    }

    fn append_limit_offset(&self, sql: &mut String, limit: Option<u64>, offset: Option<u64>) {
        match (limit, offset) {
            (Some(limit), Some(offset)) => sql.push_str(&format!(" LIMIT {limit} OFFSET {offset}")),
            (Some(limit), None) => sql.push_str(&format!(" LIMIT {limit}")),
            (None, Some(offset)) => sql.push_str(&format!(" LIMIT {} OFFSET {offset}", u64::MAX)),
            (None, None) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_conversion() {
        assert_eq!(MySqlDialect.convert_sql_type("VARCHAR", 0), "TEXT");
        assert_eq!(MySqlDialect.convert_sql_type("VARCHAR", 40), "VARCHAR");
        assert_eq!(MySqlDialect.convert_sql_type("BIGINT", 0), "BIGINT");
    }

    #[test]
    fn test_hash_index_uses_hash() {
        let index = IndexDefinition {
            kind: IndexType::Hash,
            name: "ix".to_string(),
            column_names: vec!["a".to_string(), "b".to_string()],
        };
        assert_eq!(
            MySqlDialect.prepare_create_index(None, "t", &index),
            "CREATE INDEX `ix` USING HASH ON `t`(`a`, `b`)"
        );
    }
}
