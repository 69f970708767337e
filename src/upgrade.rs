//! Table version records and the upgrade callback.
//!
//! A model declaring a version above 0 is compared against the record stored
//! in `_tide_versions` the first time a session uses it. The record table is
//! itself a mapped model.

use crate::error::Result;
use crate::executor::Executor;
use crate::dialect::Dialect;
use crate::model::{ColumnOptions, Entity, FieldKey, FieldSpec, ModelSchema, TableOptions};

/// Name of the version record table.
pub const VERSION_TABLE: &str = "_tide_versions";

/// Stored version of one table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DbVersion {
    /// Schema name, empty when the table is unqualified
    pub schema_name: String,
    pub table_name: String,
    pub version: i32,
}

impl DbVersion {
    pub const SCHEMA_NAME: FieldKey<Self> = FieldKey::new(0);
    pub const TABLE_NAME: FieldKey<Self> = FieldKey::new(1);
    pub const VERSION: FieldKey<Self> = FieldKey::new(2);
}

impl Entity for DbVersion {
    fn schema() -> ModelSchema<Self> {
        let key = |name: &str| ColumnOptions {
            name: Some(name.to_string()),
            length: 255,
            nullable: false,
            ..Default::default()
        };
        ModelSchema::new("DbVersion")
            .table(TableOptions {
                name: Some(VERSION_TABLE.to_string()),
                primary_key: Some("schemaName, tableName".to_string()),
                ..Default::default()
            })
            .field(
                FieldSpec::value("schema_name", |m: &DbVersion| &m.schema_name, |m: &mut DbVersion, v| {
                    m.schema_name = v
                })
                .column(key("schemaName")),
            )
            .field(
                FieldSpec::value("table_name", |m: &DbVersion| &m.table_name, |m: &mut DbVersion, v| {
                    m.table_name = v
                })
                .column(key("tableName")),
            )
            .field(
                FieldSpec::value("version", |m: &DbVersion| &m.version, |m: &mut DbVersion, v| m.version = v)
                    .column(ColumnOptions {
                        nullable: false,
                        ..Default::default()
                    }),
            )
    }
}

/// Callback that migrates a table between declared versions.
pub trait DbUpgrader {
    /// Bring `table` from `from` to `to`. Return `false` to report failure.
    fn upgrade_table(
        &self,
        executor: &dyn Executor,
        dialect: Dialect,
        schema: Option<&str>,
        table: &str,
        from: i32,
        to: i32,
    ) -> Result<bool>;
}
