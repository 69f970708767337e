//! H2 dialect.

use super::{MergeStrategy, SqlDialect};
use crate::model::{IndexDefinition, IndexType};

#[derive(Debug, Clone, Copy, Default)]
pub struct H2Dialect;

impl SqlDialect for H2Dialect {
    fn name(&self) -> &'static str {
        "H2"
    }

    fn create_table_prefix(&self, memory_table: bool) -> &'static str {
        if memory_table {
            "CREATE MEMORY TABLE IF NOT EXISTS"
        } else {
            "CREATE CACHED TABLE IF NOT EXISTS"
        }
    }

    fn supports_memory_tables(&self) -> bool {
        true
    }

    fn merge_strategy(&self) -> MergeStrategy {
        MergeStrategy::MergeKey
    }

    fn prepare_create_index(&self, schema: Option<&str>, table: &str, index: &IndexDefinition) -> String {
        let keyword = match index.kind {
            IndexType::Standard => "CREATE INDEX IF NOT EXISTS",
            IndexType::Unique => "CREATE UNIQUE INDEX IF NOT EXISTS",
            IndexType::Hash => "CREATE HASH INDEX IF NOT EXISTS",
            IndexType::UniqueHash => "CREATE UNIQUE HASH INDEX IF NOT EXISTS",
        };
        format!(
            "{keyword} {} ON {}({})",
            index.name,
            self.prepare_table_name(schema, table),
            self.column_list(&index.column_names)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_index() {
        let index = IndexDefinition {
            kind: IndexType::UniqueHash,
            name: "ix_code".to_string(),
            column_names: vec!["code".to_string()],
        };
        assert_eq!(
            H2Dialect.prepare_create_index(None, "ITEM", &index),
            "CREATE UNIQUE HASH INDEX IF NOT EXISTS ix_code ON ITEM(code)"
        );
    }

    #[test]
    fn test_memory_table_prefix() {
        assert_eq!(H2Dialect.create_table_prefix(true), "CREATE MEMORY TABLE IF NOT EXISTS");
    }
}
