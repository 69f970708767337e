//! PostgreSQL dialect.

use super::{AutoIncrement, MergeStrategy, SqlDialect};
use crate::model::{IndexDefinition, IndexType};

#[derive(Debug, Clone, Copy, Default)]
pub struct PostgresDialect;

impl SqlDialect for PostgresDialect {
    fn name(&self) -> &'static str {
        "PostgreSQL"
    }

    fn quote_identifier(&self, name: &str) -> String {
        format!("\"{}\"", name.replace('"', "\"\""))
    }

    fn placeholder(&self, position: usize) -> String {
        format!("${position}")
    }

    fn convert_sql_type(&self, data_type: &str, _max_length: usize) -> String {
        match data_type {
            "DOUBLE" => "DOUBLE PRECISION",
            "TINYINT" => "SMALLINT",
            "BLOB" => "BYTEA",
            other => other,
        }
        .to_string()
    }

    fn auto_increment(&self, data_type: &str) -> AutoIncrement {
        let serial = match data_type {
            "BIGINT" => "BIGSERIAL",
            "SMALLINT" | "TINYINT" => "SMALLSERIAL",
            _ => "SERIAL",
        };
        AutoIncrement {
            data_type: serial.to_string(),
            clause: None,
        }
    }

    fn merge_strategy(&self) -> MergeStrategy {
        MergeStrategy::OnConflictDoUpdate
    }

    fn prepare_create_index(&self, schema: Option<&str>, table: &str, index: &IndexDefinition) -> String {
        let unique = matches!(index.kind, IndexType::Unique | IndexType::UniqueHash);
        // hash access method: single column, not unique
        let hash = index.kind == IndexType::Hash && index.column_names.len() == 1;
        if matches!(index.kind, IndexType::Hash | IndexType::UniqueHash) && !hash {
            log::warn!(
                "PostgreSQL hash indexes must be single-column and non-unique; creating {} as a btree index",
                index.name
            );
        }
        format!(
            "CREATE {}INDEX IF NOT EXISTS {} ON {}{}({})",
            if unique { "UNIQUE " } else { "" },
            self.quote_identifier(&index.name),
            self.prepare_table_name(schema, table),
            if hash { " USING HASH " } else { "" },
            self.column_list(&index.column_names)
        )
    }
}
