//! Fluent SELECT builder over an alias.
//!
//! Columns are named with the sentinels of an [`Alias`], never with strings.
//!
//! # Example
//!
//! ```no_run
//! use tidemark::{Alias, Dialect, Entity, MappingRegistry, Query};
//! # use tidemark::{FieldKey, FieldSpec, ModelSchema};
//! # #[derive(Default)]
//! # struct Product { name: String, units_in_stock: i32 }
//! # impl Product {
//! #     const NAME: FieldKey<Self> = FieldKey::new(0);
//! #     const UNITS_IN_STOCK: FieldKey<Self> = FieldKey::new(1);
//! # }
//! # impl Entity for Product {
//! #     fn schema() -> ModelSchema<Self> { ModelSchema::new("Product") }
//! # }
//! # fn main() -> tidemark::Result<()> {
//! let registry = MappingRegistry::new();
//! let p = Alias::<Product>::of(&registry)?;
//! let query = Query::from(&p)
//!     .where_(p.field(Product::UNITS_IN_STOCK))?
//!     .exceeds(10)?
//!     .and(p.field(Product::NAME))?
//!     .like("Ch%")?
//!     .order_by(p.field(Product::NAME))?;
//! let statement = query.to_select(Dialect::H2);
//! # Ok(())
//! # }
//! ```

use sea_query::Value;

use super::condition::{append_where, CompareType, Condition, ConditionAndOr, Operand};
use super::statement::{SqlStatement, StatementBuilder};
use crate::alias::{Alias, SelectAlias, Sentinel};
use crate::dialect::Dialect;
use crate::error::Result;
use crate::model::{FieldDefinition, TableDefinition};
use crate::value::{to_storage, DbEnum, EnumValue, FieldValue};

/// A SELECT over one model's table.
pub struct Query<M> {
    select: SelectAlias<M>,
    conditions: Vec<Condition>,
    order: Vec<(String, bool)>,
    limit: Option<u64>,
    offset: Option<u64>,
    distinct: bool,
}

impl<M> Query<M> {
    /// Start a query whose handles come from `alias`.
    pub fn from(alias: &Alias<M>) -> Self {
        Self {
            select: alias.bind_select(),
            conditions: Vec::new(),
            order: Vec::new(),
            limit: None,
            offset: None,
            distinct: false,
        }
    }

    fn condition(self, field: Sentinel, joiner: Option<ConditionAndOr>) -> Result<QueryCondition<M>> {
        let field_index = self.select.resolve(field)?.field_index();
        Ok(QueryCondition {
            query: self,
            field_index,
            joiner,
        })
    }

    /// Open the first condition of the WHERE chain.
    ///
    /// # Errors
    ///
    /// Fails when the handle does not resolve against this query's alias or
    /// names an unmapped field.
    pub fn where_(self, field: Sentinel) -> Result<QueryCondition<M>> {
        self.condition(field, None)
    }

    /// Add a condition joined with AND.
    pub fn and(self, field: Sentinel) -> Result<QueryCondition<M>> {
        self.condition(field, Some(ConditionAndOr::And))
    }

    /// Add a condition joined with OR.
    pub fn or(self, field: Sentinel) -> Result<QueryCondition<M>> {
        self.condition(field, Some(ConditionAndOr::Or))
    }

    pub fn order_by(mut self, field: Sentinel) -> Result<Self> {
        let column = self.select.resolve_field(field)?.column_name.clone();
        self.order.push((column, false));
        Ok(self)
    }

    pub fn order_by_desc(mut self, field: Sentinel) -> Result<Self> {
        let column = self.select.resolve_field(field)?.column_name.clone();
        self.order.push((column, true));
        Ok(self)
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }

    pub fn distinct(mut self) -> Self {
        self.distinct = true;
        self
    }

    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    pub fn definition(&self) -> &TableDefinition<M> {
        self.select.definition()
    }

    /// The query-bound view rows are read into.
    pub fn select_alias(&self) -> &SelectAlias<M> {
        &self.select
    }

    fn append_from(&self, stat: &mut StatementBuilder) {
        let def = self.definition();
        stat.append(" FROM ")
            .append_table(def.schema_name.as_deref(), &def.table_name);
        append_where(stat, &self.conditions);
    }

    /// `SELECT <mapped columns> FROM ... WHERE ... ORDER BY ...` plus paging.
    pub fn to_select(&self, dialect: Dialect) -> SqlStatement {
        let mut stat = StatementBuilder::new(dialect);
        stat.append(if self.distinct { "SELECT DISTINCT " } else { "SELECT " })
            .reset_count();
        for column in self.select.columns() {
            let name = &self.definition().fields()[column.field_index()].column_name;
            stat.append_except_first(", ").append_column(name);
        }
        self.append_from(&mut stat);
        if !self.order.is_empty() {
            stat.append(" ORDER BY ").reset_count();
            for (column, descending) in &self.order {
                stat.append_except_first(", ").append_column(column);
                if *descending {
                    stat.append(" DESC");
                }
            }
        }
        let mut paging = String::new();
        dialect.append_limit_offset(&mut paging, self.limit, self.offset);
        stat.append(&paging);
        stat.build()
    }

    /// `SELECT COUNT(*) FROM ... WHERE ...`.
    pub fn to_count(&self, dialect: Dialect) -> SqlStatement {
        let mut stat = StatementBuilder::new(dialect);
        stat.append("SELECT COUNT(*)");
        self.append_from(&mut stat);
        stat.build()
    }
}

/// A pending condition on one column, waiting for its comparator.
pub struct QueryCondition<M> {
    query: Query<M>,
    field_index: usize,
    joiner: Option<ConditionAndOr>,
}

impl<M> QueryCondition<M> {
    fn field(&self) -> &FieldDefinition<M> {
        &self.query.definition().fields()[self.field_index]
    }

    fn storage(&self, value: FieldValue) -> Result<Value> {
        to_storage(value, self.field())
    }

    fn push(mut self, compare: CompareType, right: Operand) -> Query<M> {
        let mut condition = Condition::new(self.field().column_name.clone(), compare, right);
        if let Some(joiner) = self.joiner.filter(|_| !self.query.conditions.is_empty()) {
            condition = condition.joined(joiner);
        }
        self.query.conditions.push(condition);
        self.query
    }

    fn compare(self, compare: CompareType, value: impl Into<Value>) -> Result<Query<M>> {
        let value = self.storage(FieldValue::Plain(value.into()))?;
        Ok(self.push(compare, Operand::Value(value)))
    }

    pub fn is(self, value: impl Into<Value>) -> Result<Query<M>> {
        self.compare(CompareType::Equal, value)
    }

    pub fn is_not(self, value: impl Into<Value>) -> Result<Query<M>> {
        self.compare(CompareType::NotEqual, value)
    }

    pub fn exceeds(self, value: impl Into<Value>) -> Result<Query<M>> {
        self.compare(CompareType::GreaterThan, value)
    }

    pub fn at_least(self, value: impl Into<Value>) -> Result<Query<M>> {
        self.compare(CompareType::GreaterEqual, value)
    }

    pub fn less_than(self, value: impl Into<Value>) -> Result<Query<M>> {
        self.compare(CompareType::LessThan, value)
    }

    pub fn at_most(self, value: impl Into<Value>) -> Result<Query<M>> {
        self.compare(CompareType::LessEqual, value)
    }

    /// Compare an enum field with a member, encoded the way the field stores it.
    pub fn is_enum<E: DbEnum>(self, member: &E) -> Result<Query<M>> {
        let value = self.storage(FieldValue::Enum(Some(EnumValue::of(member)?)))?;
        Ok(self.push(CompareType::Equal, Operand::Value(value)))
    }

    /// Pattern match; the pattern is bound as given.
    pub fn like(self, pattern: &str) -> Result<Query<M>> {
        Ok(self.push(CompareType::Like, Operand::Value(Value::String(Some(pattern.to_string())))))
    }

    pub fn between(self, low: impl Into<Value>, high: impl Into<Value>) -> Result<Query<M>> {
        let low = self.storage(FieldValue::Plain(low.into()))?;
        let high = self.storage(FieldValue::Plain(high.into()))?;
        Ok(self.push(CompareType::Between, Operand::Range(low, high)))
    }

    pub fn is_null(self) -> Result<Query<M>> {
        Ok(self.push(CompareType::IsNull, Operand::None))
    }

    pub fn is_not_null(self) -> Result<Query<M>> {
        Ok(self.push(CompareType::IsNotNull, Operand::None))
    }

    /// Compare with another column of the same query.
    pub fn is_column(self, other: Sentinel) -> Result<Query<M>> {
        let column = self.query.select.resolve_field(other)?.column_name.clone();
        Ok(self.push(CompareType::Equal, Operand::Column(column)))
    }
}
