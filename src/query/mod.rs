//! Statement synthesis.
//!
//! - **Statement**: SQL text plus ordered parameters (`SqlStatement`, `StatementBuilder`)
//! - **Condition**: the WHERE tree (`Condition`, `CompareType`)
//! - **Select**: alias-driven SELECT and COUNT queries (`Query`)
//! - **Builder**: INSERT, UPDATE, DELETE, MERGE and DDL for one object or table
//!
//! # Examples
//!
//! ```no_run
//! use tidemark::{Alias, Dialect, Entity, FieldKey, FieldSpec, MappingRegistry, ModelSchema, Query};
//!
//! #[derive(Default)]
//! struct Product {
//!     id: i64,
//!     name: String,
//! }
//!
//! impl Product {
//!     const NAME: FieldKey<Self> = FieldKey::new(1);
//! }
//!
//! impl Entity for Product {
//!     fn schema() -> ModelSchema<Self> {
//!         ModelSchema::new("Product")
//!             .field(FieldSpec::value("id", |p: &Product| &p.id, |p: &mut Product, v| p.id = v))
//!             .field(FieldSpec::value("name", |p: &Product| &p.name, |p: &mut Product, v| p.name = v))
//!     }
//! }
//!
//! let registry = MappingRegistry::new();
//! let p = Alias::<Product>::of(&registry)?;
//! let statement = Query::from(&p)
//!     .where_(p.field(Product::NAME))?
//!     .like("Ch%")?
//!     .to_select(Dialect::Postgres);
//! println!("{statement}");
//! # Ok::<(), tidemark::TideError>(())
//! ```

pub mod builder;
pub mod condition;
pub mod select;
pub mod statement;

pub use builder::{
    build_create, build_create_index, build_create_table, build_delete, build_insert, build_merge, build_update,
};
pub use condition::{append_where, CompareType, Condition, ConditionAndOr, Operand};
pub use select::{Query, QueryCondition};
pub use statement::{SqlStatement, StatementBuilder};
