//! Statement synthesis for mapped models.
//!
//! Every function here is purely textual: it renders SQL plus ordered
//! parameters for one dialect and never touches a connection.

use sea_query::Value;
use std::sync::Arc;

use super::condition::{append_where, CompareType, Condition, ConditionAndOr, Operand};
use super::statement::{SqlStatement, StatementBuilder};
use crate::alias::Alias;
use crate::dialect::{Dialect, MergeStatement, MergeStrategy};
use crate::error::{Result, TideError};
use crate::model::type_mapping::{is_properly_formatted_default_value, is_valid_default_value};
use crate::model::{FieldDefinition, IndexDefinition, TableDefinition};
use crate::value::{conversion::as_i64, is_null};

fn require_primary_key<M>(def: &TableDefinition<M>, operation: &'static str) -> Result<()> {
    if def.has_primary_key() {
        Ok(())
    } else {
        Err(TideError::NoPrimaryKey {
            table: def.table_name.clone(),
            operation,
        })
    }
}

/// An auto-increment column left for the engine to generate.
fn is_generated(field: &FieldDefinition<impl Sized>, value: &Value) -> bool {
    field.is_auto_increment && (is_null(value) || as_i64(value) == Some(0))
}

/// Equality conditions on every primary key column, joined by AND.
///
/// The columns are resolved through a fresh alias over the definition, the
/// same way a caller-composed query resolves its field handles.
fn primary_key_conditions<M>(def: &Arc<TableDefinition<M>>, obj: &M) -> Result<Vec<Condition>> {
    let alias = Alias::materialize(Arc::clone(def));
    let mut conditions = Vec::new();
    for key in def.primary_key_fields() {
        let field = alias.resolve(alias.sentinel_of(key))?;
        let condition = Condition::new(
            field.column_name.clone(),
            CompareType::Equal,
            Operand::Value(field.storage_value(obj)?),
        );
        conditions.push(if conditions.is_empty() {
            condition
        } else {
            condition.joined(ConditionAndOr::And)
        });
    }
    Ok(conditions)
}

fn append_values(stat: &mut StatementBuilder, values: Vec<Value>) {
    stat.append(" VALUES(").reset_count();
    for value in values {
        stat.append_except_first(", ").push_param(value);
    }
    stat.append(")");
}

/// Columns and values of an INSERT, skipping generated keys.
fn insert_columns<'a, M>(def: &'a TableDefinition<M>, obj: &M) -> Result<(Vec<&'a str>, Vec<Value>)> {
    let mut columns = Vec::with_capacity(def.fields().len());
    let mut values = Vec::with_capacity(def.fields().len());
    for field in def.fields() {
        let value = field.storage_value(obj)?;
        if is_generated(field, &value) {
            continue;
        }
        columns.push(field.column_name.as_str());
        values.push(value);
    }
    Ok((columns, values))
}

fn append_insert_into(stat: &mut StatementBuilder, def: &TableDefinition<impl Sized>, keyword: &str, columns: &[&str]) {
    stat.append(keyword)
        .append(" ")
        .append_table(def.schema_name.as_deref(), &def.table_name)
        .append(" (")
        .reset_count();
    for column in columns {
        stat.append_except_first(", ").append_column(column);
    }
    stat.append(")");
}

/// `INSERT INTO t (cols) VALUES(...)`.
pub fn build_insert<M>(def: &TableDefinition<M>, obj: &M, dialect: Dialect) -> Result<SqlStatement> {
    let (columns, values) = insert_columns(def, obj)?;
    let mut stat = StatementBuilder::new(dialect);
    append_insert_into(&mut stat, def, "INSERT INTO", &columns);
    append_values(&mut stat, values);
    Ok(stat.build())
}

/// `UPDATE t SET c = ? ... WHERE pk = ? AND ...`.
pub fn build_update<M>(def: &Arc<TableDefinition<M>>, obj: &M, dialect: Dialect) -> Result<SqlStatement> {
    require_primary_key(def, "update")?;
    let mut stat = StatementBuilder::new(dialect);
    stat.append("UPDATE ")
        .append_table(def.schema_name.as_deref(), &def.table_name)
        .append(" SET ")
        .reset_count();
    let non_key: Vec<_> = def.fields().iter().filter(|f| !f.is_primary_key).collect();
    // a key-only table rewrites its own key values
    let set_fields: Vec<_> = if non_key.is_empty() {
        def.primary_key_fields().collect()
    } else {
        non_key
    };
    for field in set_fields {
        let value = field.storage_value(obj)?;
        stat.append_except_first(", ")
            .append_column(&field.column_name)
            .append(" = ")
            .push_param(value);
    }
    append_where(&mut stat, &primary_key_conditions(def, obj)?);
    Ok(stat.build())
}

/// `DELETE FROM t WHERE pk = ? AND ...`.
pub fn build_delete<M>(def: &Arc<TableDefinition<M>>, obj: &M, dialect: Dialect) -> Result<SqlStatement> {
    require_primary_key(def, "delete")?;
    let mut stat = StatementBuilder::new(dialect);
    stat.append("DELETE FROM ")
        .append_table(def.schema_name.as_deref(), &def.table_name);
    append_where(&mut stat, &primary_key_conditions(def, obj)?);
    Ok(stat.build())
}

/// Insert-or-update by primary key, in the dialect's merge strategy.
pub fn build_merge<M>(def: &Arc<TableDefinition<M>>, obj: &M, dialect: Dialect) -> Result<MergeStatement> {
    require_primary_key(def, "merge")?;
    let mut columns = Vec::with_capacity(def.fields().len());
    let mut values = Vec::with_capacity(def.fields().len());
    for field in def.fields() {
        columns.push(field.column_name.as_str());
        values.push(field.storage_value(obj)?);
    }
    let non_key: Vec<&str> = def
        .fields()
        .iter()
        .filter(|f| !f.is_primary_key)
        .map(|f| f.column_name.as_str())
        .collect();

    let mut stat = StatementBuilder::new(dialect);
    match dialect.merge_strategy() {
        MergeStrategy::Emulated => return emulated_merge(def, obj, dialect),
        MergeStrategy::MergeKey => {
            append_insert_into(&mut stat, def, "MERGE INTO", &columns);
            stat.append(" KEY(").reset_count();
            for key in def.primary_key_columns() {
                stat.append_except_first(", ").append_column(key);
            }
            stat.append(")");
            append_values(&mut stat, values);
        }
        MergeStrategy::InsertOrReplace => {
            append_insert_into(&mut stat, def, "INSERT OR REPLACE INTO", &columns);
            append_values(&mut stat, values);
        }
        MergeStrategy::OnDuplicateKeyUpdate => {
            append_insert_into(&mut stat, def, "INSERT INTO", &columns);
            append_values(&mut stat, values);
            stat.append(" ON DUPLICATE KEY UPDATE ").reset_count();
            let updated: Vec<&str> = if non_key.is_empty() {
                def.primary_key_columns().iter().map(String::as_str).collect()
            } else {
                non_key
            };
            for column in updated {
                let prepared = dialect.prepare_column_name(column);
                stat.append_except_first(", ")
                    .append(&format!("{prepared} = VALUES({prepared})"));
            }
        }
        MergeStrategy::OnConflictDoUpdate => {
            append_insert_into(&mut stat, def, "INSERT INTO", &columns);
            append_values(&mut stat, values);
            stat.append(" ON CONFLICT(").reset_count();
            for key in def.primary_key_columns() {
                stat.append_except_first(", ").append_column(key);
            }
            stat.append(")");
            if non_key.is_empty() {
                stat.append(" DO NOTHING");
            } else {
                stat.append(" DO UPDATE SET ").reset_count();
                for column in non_key {
                    let prepared = dialect.prepare_column_name(column);
                    stat.append_except_first(", ")
                        .append(&format!("{prepared} = EXCLUDED.{prepared}"));
                }
            }
        }
    }
    Ok(MergeStatement::Native(stat.build()))
}

fn emulated_merge<M>(def: &Arc<TableDefinition<M>>, obj: &M, dialect: Dialect) -> Result<MergeStatement> {
    let mut probe = StatementBuilder::new(dialect);
    probe
        .append("SELECT COUNT(*) FROM ")
        .append_table(def.schema_name.as_deref(), &def.table_name);
    append_where(&mut probe, &primary_key_conditions(def, obj)?);
    Ok(MergeStatement::Emulated {
        probe: probe.build(),
        update: build_update(def, obj, dialect)?,
        insert: build_insert(def, obj, dialect)?,
    })
}

fn append_column_definition<M>(stat: &mut StatementBuilder, def: &TableDefinition<M>, field: &FieldDefinition<M>) {
    let dialect = stat.dialect();
    let data_type = dialect.convert_sql_type(&field.data_type, field.max_length);
    let (data_type, auto_clause) = if field.is_auto_increment {
        let auto = dialect.auto_increment(&data_type);
        (auto.data_type, auto.clause)
    } else {
        (data_type, None)
    };
    stat.append_column(&field.column_name).append(" ").append(&data_type);
    if field.max_length > 0 && !field.is_auto_increment {
        stat.append(&format!("({})", field.max_length));
    }
    if let Some(clause) = auto_clause {
        stat.append(" ").append(clause);
    }
    if !field.allow_null {
        stat.append(" NOT NULL");
    }
    if field.is_auto_increment || field.is_primary_key {
        return;
    }
    if let Some(default_value) = &field.default_value {
        if !is_properly_formatted_default_value(default_value) {
            log::warn!(
                "Ignoring improperly formatted default value {default_value} for {}.{}",
                def.table_name,
                field.column_name
            );
        } else if !is_valid_default_value(&field.field_type, field.enum_type, default_value) {
            log::warn!(
                "Ignoring default value {default_value} for {}.{}: not a valid {}",
                def.table_name,
                field.column_name,
                field.field_type.type_name()
            );
        } else {
            stat.append(" DEFAULT ").append(default_value);
        }
    }
}

/// `CREATE TABLE IF NOT EXISTS t(...)` with a composite primary key clause.
pub fn build_create_table<M>(def: &TableDefinition<M>, dialect: Dialect) -> SqlStatement {
    let mut stat = StatementBuilder::new(dialect);
    let memory = def.memory_table && dialect.supports_memory_tables();
    stat.append(dialect.create_table_prefix(memory))
        .append(" ")
        .append_table(def.schema_name.as_deref(), &def.table_name)
        .append("(")
        .reset_count();
    for field in def.fields() {
        stat.append_except_first(", ");
        append_column_definition(&mut stat, def, field);
    }
    if def.has_primary_key() {
        stat.append(", PRIMARY KEY(").reset_count();
        for key in def.primary_key_columns() {
            stat.append_except_first(", ").append_column(key);
        }
        stat.append(")");
    }
    stat.append(")");
    stat.build()
}

/// `CREATE INDEX` for one index, in the dialect's syntax.
pub fn build_create_index<M>(def: &TableDefinition<M>, index: &IndexDefinition, dialect: Dialect) -> SqlStatement {
    SqlStatement::raw(dialect.prepare_create_index(def.schema_name.as_deref(), &def.table_name, index))
}

/// The table followed by each of its indexes.
pub fn build_create<M>(def: &TableDefinition<M>, dialect: Dialect) -> Vec<SqlStatement> {
    std::iter::once(build_create_table(def, dialect))
        .chain(def.indexes().iter().map(|index| build_create_index(def, index, dialect)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ColumnOptions, FieldSpec, IndexOptions, IndexType, ModelSchema, TableOptions};

    #[derive(Default)]
    struct Item {
        id: i64,
        code: String,
        qty: i32,
        note: Option<String>,
    }

    fn item_schema() -> ModelSchema<Item> {
        ModelSchema::new("Item")
            .table(TableOptions {
                name: Some("ITEM".into()),
                ..Default::default()
            })
            .field(
                FieldSpec::value("id", |m: &Item| &m.id, |m: &mut Item, v| m.id = v).column(ColumnOptions {
                    primary_key: true,
                    auto_increment: true,
                    ..Default::default()
                }),
            )
            .field(
                FieldSpec::value("code", |m: &Item| &m.code, |m: &mut Item, v| m.code = v).column(ColumnOptions {
                    length: 4,
                    trim: true,
                    nullable: false,
                    ..Default::default()
                }),
            )
            .field(
                FieldSpec::value("qty", |m: &Item| &m.qty, |m: &mut Item, v| m.qty = v).column(ColumnOptions {
                    default_value: Some("0".into()),
                    ..Default::default()
                }),
            )
            .field(
                FieldSpec::value("note", |m: &Item| &m.note, |m: &mut Item, v| m.note = v).column(ColumnOptions {
                    default_value: Some("'none".into()),
                    ..Default::default()
                }),
            )
            .index(IndexOptions::new(IndexType::Unique, &["code"]))
    }

    fn item_def() -> Arc<TableDefinition<Item>> {
        Arc::new(TableDefinition::from_schema(item_schema()).unwrap())
    }

    fn item() -> Item {
        Item {
            id: 7,
            code: "ABCDEF".into(),
            qty: 3,
            note: None,
        }
    }

    #[test]
    fn test_insert_binds_converted_values() {
        let stat = build_insert(&item_def(), &item(), Dialect::H2).unwrap();
        assert_eq!(stat.sql, "INSERT INTO ITEM (id, code, qty, note) VALUES(?, ?, ?, ?)");
        assert_eq!(stat.params[1], Value::String(Some("ABCD".into())));
        assert_eq!(stat.params[3], Value::String(None));
    }

    #[test]
    fn test_insert_skips_unset_auto_increment_key() {
        let mut obj = item();
        obj.id = 0;
        let stat = build_insert(&item_def(), &obj, Dialect::Postgres).unwrap();
        assert_eq!(
            stat.sql,
            "INSERT INTO \"ITEM\" (\"code\", \"qty\", \"note\") VALUES($1, $2, $3)"
        );
        assert_eq!(stat.params.len(), 3);
    }

    #[test]
    fn test_update_sets_non_key_columns_and_filters_by_key() {
        let stat = build_update(&item_def(), &item(), Dialect::H2).unwrap();
        assert_eq!(stat.sql, "UPDATE ITEM SET code = ?, qty = ?, note = ? WHERE id = ?");
        assert_eq!(stat.params.last(), Some(&Value::BigInt(Some(7))));
    }

    #[test]
    fn test_delete_by_key() {
        let stat = build_delete(&item_def(), &item(), Dialect::MySql).unwrap();
        assert_eq!(stat.sql, "DELETE FROM `ITEM` WHERE `id` = ?");
        assert_eq!(stat.params, vec![Value::BigInt(Some(7))]);
    }

    #[test]
    fn test_update_without_primary_key_fails() {
        let schema = ModelSchema::new("Loose")
            .field(FieldSpec::value("qty", |m: &Item| &m.qty, |m: &mut Item, v| m.qty = v));
        let def = Arc::new(TableDefinition::from_schema(schema).unwrap());
        let err = build_update(&def, &item(), Dialect::H2).unwrap_err();
        assert_eq!(err.code(), crate::ErrorCode::NoPrimaryKey);
        assert!(build_delete(&def, &item(), Dialect::H2).is_err());
        assert!(build_merge(&def, &item(), Dialect::H2).is_err());
    }

    #[test]
    fn test_merge_per_dialect() {
        let def = item_def();
        let MergeStatement::Native(h2) = build_merge(&def, &item(), Dialect::H2).unwrap() else {
            panic!("expected native merge");
        };
        assert_eq!(h2.sql, "MERGE INTO ITEM (id, code, qty, note) KEY(id) VALUES(?, ?, ?, ?)");

        let MergeStatement::Native(sqlite) = build_merge(&def, &item(), Dialect::Sqlite).unwrap() else {
            panic!("expected native merge");
        };
        assert!(sqlite.sql.starts_with("INSERT OR REPLACE INTO ITEM"));

        let MergeStatement::Native(pg) = build_merge(&def, &item(), Dialect::Postgres).unwrap() else {
            panic!("expected native merge");
        };
        assert!(pg.sql.ends_with(
            "ON CONFLICT(\"id\") DO UPDATE SET \"code\" = EXCLUDED.\"code\", \"qty\" = EXCLUDED.\"qty\", \"note\" = EXCLUDED.\"note\""
        ));

        let MergeStatement::Native(mysql) = build_merge(&def, &item(), Dialect::MySql).unwrap() else {
            panic!("expected native merge");
        };
        assert!(mysql.sql.contains("ON DUPLICATE KEY UPDATE `code` = VALUES(`code`)"));

        match build_merge(&def, &item(), Dialect::Ansi).unwrap() {
            MergeStatement::Emulated { probe, update, insert } => {
                assert_eq!(probe.sql, "SELECT COUNT(*) FROM ITEM WHERE id = ?");
                assert!(update.sql.starts_with("UPDATE ITEM SET"));
                assert!(insert.sql.starts_with("INSERT INTO ITEM"));
            }
            MergeStatement::Native(_) => panic!("expected emulated merge"),
        }
    }

    #[test]
    fn test_create_table() {
        let stat = build_create_table(&item_def(), Dialect::H2);
        assert_eq!(
            stat.sql,
            "CREATE CACHED TABLE IF NOT EXISTS ITEM(id BIGINT AUTO_INCREMENT, code VARCHAR(4) NOT NULL, \
             qty INT DEFAULT 0, note VARCHAR, PRIMARY KEY(id))"
        );
        let stat = build_create_table(&item_def(), Dialect::Sqlite);
        assert!(stat.sql.starts_with("CREATE TABLE IF NOT EXISTS ITEM(id INTEGER, code VARCHAR(4) NOT NULL"));
    }

    #[test]
    fn test_create_emits_indexes_after_table() {
        let statements = build_create(&item_def(), Dialect::H2);
        assert_eq!(statements.len(), 2);
        assert_eq!(statements[1].sql, "CREATE UNIQUE INDEX IF NOT EXISTS ITEM_0 ON ITEM(code)");
    }
}
