//! WHERE clause conditions.
//!
//! Conditions form a flat chain: each one after the first carries the
//! boolean joiner that links it to its predecessor.

use sea_query::Value;

use super::statement::StatementBuilder;

/// Comparison operator of a condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareType {
    Equal,
    NotEqual,
    GreaterThan,
    GreaterEqual,
    LessThan,
    LessEqual,
    Like,
    Between,
    IsNull,
    IsNotNull,
}

impl CompareType {
    pub fn sql(&self) -> &'static str {
        match self {
            CompareType::Equal => "=",
            CompareType::NotEqual => "<>",
            CompareType::GreaterThan => ">",
            CompareType::GreaterEqual => ">=",
            CompareType::LessThan => "<",
            CompareType::LessEqual => "<=",
            CompareType::Like => "LIKE",
            CompareType::Between => "BETWEEN",
            CompareType::IsNull => "IS NULL",
            CompareType::IsNotNull => "IS NOT NULL",
        }
    }

    /// Whether the operator takes a right-hand operand.
    pub fn has_right_expression(&self) -> bool {
        !matches!(self, CompareType::IsNull | CompareType::IsNotNull)
    }
}

/// Boolean joiner between consecutive conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConditionAndOr {
    And,
    Or,
}

impl ConditionAndOr {
    pub fn sql(&self) -> &'static str {
        match self {
            ConditionAndOr::And => " AND ",
            ConditionAndOr::Or => " OR ",
        }
    }
}

/// Right-hand side of a condition.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    None,
    Value(Value),
    Column(String),
    Range(Value, Value),
}

/// One comparison in a WHERE chain.
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    /// Joiner to the previous condition; ignored on the first one
    pub joiner: Option<ConditionAndOr>,
    /// Left-hand column name, unquoted
    pub column: String,
    pub compare: CompareType,
    pub right: Operand,
}

impl Condition {
    pub fn new(column: impl Into<String>, compare: CompareType, right: Operand) -> Self {
        Self {
            joiner: None,
            column: column.into(),
            compare,
            right,
        }
    }

    pub fn joined(mut self, joiner: ConditionAndOr) -> Self {
        self.joiner = Some(joiner);
        self
    }

    pub fn append_sql(&self, stat: &mut StatementBuilder) {
        stat.append_column(&self.column).append(" ").append(self.compare.sql());
        if !self.compare.has_right_expression() {
            return;
        }
        match &self.right {
            Operand::None => {}
            Operand::Value(value) => {
                stat.append(" ").push_param(value.clone());
            }
            Operand::Column(column) => {
                stat.append(" ").append_column(column);
            }
            Operand::Range(low, high) => {
                stat.append(" ").push_param(low.clone());
                stat.append(" AND ").push_param(high.clone());
            }
        }
    }
}

/// Append ` WHERE <chain>` when the chain is not empty.
pub fn append_where(stat: &mut StatementBuilder, conditions: &[Condition]) {
    if conditions.is_empty() {
        return;
    }
    stat.append(" WHERE ");
    for (i, condition) in conditions.iter().enumerate() {
        if i > 0 {
            stat.append(condition.joiner.unwrap_or(ConditionAndOr::And).sql());
        }
        condition.append_sql(stat);
    }
}
