//! SQLite dialect.

use super::{AutoIncrement, MergeStrategy, SqlDialect};

#[derive(Debug, Clone, Copy, Default)]
pub struct SqliteDialect;

impl SqlDialect for SqliteDialect {
    fn name(&self) -> &'static str {
        "SQLite"
    }

    // An INTEGER PRIMARY KEY column aliases the rowid and is generated on insert.
    fn auto_increment(&self, _data_type: &str) -> AutoIncrement {
        AutoIncrement {
            data_type: "INTEGER".to_string(),
            clause: None,
        }
    }

    fn supports_save_points(&self) -> bool {
        false
    }

    fn merge_strategy(&self) -> MergeStrategy {
        MergeStrategy::InsertOrReplace
    }

    fn append_limit_offset(&self, sql: &mut String, limit: Option<u64>, offset: Option<u64>) {
        match (limit, offset) {
            (Some(limit), Some(offset)) => sql.push_str(&format!(" LIMIT {limit} OFFSET {offset}")),
            (Some(limit), None) => sql.push_str(&format!(" LIMIT {limit}")),
            (None, Some(offset)) => sql.push_str(&format!(" LIMIT -1 OFFSET {offset}")),
            (None, None) => {}
        }
    }
}
