//! Generic SQL:2008 dialect, used when the engine is not recognized.

use super::{AutoIncrement, MergeStrategy, SqlDialect};

#[derive(Debug, Clone, Copy, Default)]
pub struct AnsiDialect;

impl SqlDialect for AnsiDialect {
    fn name(&self) -> &'static str {
        "ANSI"
    }

    fn auto_increment(&self, data_type: &str) -> AutoIncrement {
        AutoIncrement {
            data_type: data_type.to_string(),
            clause: Some("GENERATED BY DEFAULT AS IDENTITY"),
        }
    }

    fn supports_limit_offset(&self) -> bool {
        false
    }

    fn merge_strategy(&self) -> MergeStrategy {
        MergeStrategy::Emulated
    }

    fn append_limit_offset(&self, sql: &mut String, limit: Option<u64>, offset: Option<u64>) {
        if let Some(offset) = offset {
            sql.push_str(&format!(" OFFSET {offset} ROWS"));
        }
        if let Some(limit) = limit {
            sql.push_str(&format!(" FETCH FIRST {limit} ROWS ONLY"));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_first_paging() {
        let mut sql = String::from("SELECT a FROM t");
        AnsiDialect.append_limit_offset(&mut sql, Some(10), Some(20));
        assert_eq!(sql, "SELECT a FROM t OFFSET 20 ROWS FETCH FIRST 10 ROWS ONLY");
    }
}
