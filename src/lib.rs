//! # Tidemark
//!
//! Model-driven table mapping and dialect-aware SQL statement synthesis.
//!
//! A model describes its table through [`Entity::schema`] (usually generated by
//! `#[derive(Entity)]`). The first use builds a [`TableDefinition`] that is
//! cached in a [`MappingRegistry`]. Queries name fields through an [`Alias`],
//! and a [`Db`] session renders and runs statements through a caller-supplied
//! [`Executor`], picking the [`Dialect`] from the product name.
//!
//! See the README for a walkthrough.

extern crate self as tidemark;

pub mod alias;
pub mod config;
pub mod db;
pub mod dialect;
pub mod error;
pub mod executor;
pub mod model;
pub mod query;
pub mod upgrade;
pub mod value;

pub use alias::{Alias, SelectAlias, SelectColumn, Sentinel};
pub use config::MappingConfig;
pub use db::Db;
pub use dialect::{AutoIncrement, Dialect, MergeStatement, MergeStrategy, SqlDialect};
pub use error::{ErrorCode, Result, TideError};
pub use executor::{Executor, Row};
pub use model::{
    ColumnOptions, Entity, FieldDefinition, FieldKey, FieldSpec, IndexDefinition, IndexOptions, IndexType,
    MappingRegistry, ModelSchema, TableDefinition, TableOptions,
};
pub use query::{CompareType, Condition, ConditionAndOr, Operand, Query, QueryCondition, SqlStatement, StatementBuilder};
pub use upgrade::{DbUpgrader, DbVersion, VERSION_TABLE};
pub use value::{
    AdapterFactory, DbEnum, EnumDescriptor, EnumMember, EnumType, EnumValue, FieldType, FieldValue, JsonTextAdapter,
    TypeAdapter, ValueType,
};

pub use tidemark_derive::{DbEnum, Entity};

/// Re-exported so generated code and callers share one `Value` type.
pub use sea_query;
