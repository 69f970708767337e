//! Table definitions built from model descriptors.
//!
//! A [`TableDefinition`] is the mapping of one model type: its table name,
//! ordered field definitions, primary key and indexes. It is built once per
//! model by [`TableDefinition::from_schema`] and never mutated afterwards.

use sea_query::Value;
use std::collections::HashSet;
use std::sync::Mutex;

use super::schema::{Entity, FieldSpec, Getter, IndexOptions, IndexType, ModelSchema, Setter};
use super::type_mapping;
use crate::error::{Result, TideError};
use crate::value::{from_storage, to_storage, EnumType, FieldType, FieldValue, TypeAdapter};

/// Mapping of one field to one column.
pub struct FieldDefinition<M> {
    pub column_name: String,
    pub field_name: &'static str,
    pub field_type: FieldType,
    /// SQL data type before dialect conversion
    pub data_type: String,
    /// Maximum length; 0 means unbounded
    pub max_length: usize,
    pub is_primary_key: bool,
    pub is_auto_increment: bool,
    pub trim_string: bool,
    pub allow_null: bool,
    pub default_value: Option<String>,
    /// Effective encoding for enum fields
    pub enum_type: Option<EnumType>,
    pub(crate) declared_index: usize,
    adapter: Option<Mutex<Box<dyn TypeAdapter>>>,
    getter: Getter<M>,
    setter: Setter<M>,
}

impl<M> FieldDefinition<M> {
    pub fn adapter(&self) -> Option<&Mutex<Box<dyn TypeAdapter>>> {
        self.adapter.as_ref()
    }

    /// Read the field from a model instance, before any storage conversion.
    pub fn get_value(&self, obj: &M) -> Result<FieldValue> {
        (self.getter)(obj)
    }

    /// Read the field and convert it to the value bound for its column.
    pub fn storage_value(&self, obj: &M) -> Result<Value> {
        to_storage(self.get_value(obj)?, self)
    }

    /// Convert a raw column value and write it into the model instance.
    pub fn set_value(&self, obj: &mut M, raw: Value) -> Result<()> {
        let value = from_storage(raw, self)?;
        (self.setter)(obj, value)
    }
}

impl<M> std::fmt::Debug for FieldDefinition<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FieldDefinition")
            .field("column_name", &self.column_name)
            .field("field_name", &self.field_name)
            .field("data_type", &self.data_type)
            .field("max_length", &self.max_length)
            .field("is_primary_key", &self.is_primary_key)
            .field("is_auto_increment", &self.is_auto_increment)
            .field("allow_null", &self.allow_null)
            .field("enum_type", &self.enum_type)
            .finish()
    }
}

/// A named secondary index over mapped columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexDefinition {
    pub kind: IndexType,
    pub name: String,
    pub column_names: Vec<String>,
}

/// Mapping of one model type to one table.
pub struct TableDefinition<M> {
    pub model_name: &'static str,
    pub schema_name: Option<String>,
    pub table_name: String,
    /// Declared model version; 0 when unversioned
    pub version: i32,
    pub create_if_required: bool,
    pub memory_table: bool,
    fields: Vec<FieldDefinition<M>>,
    primary_key: Vec<String>,
    indexes: Vec<IndexDefinition>,
    /// Declared field names in declaration order, mapped or not
    declared: Vec<&'static str>,
}

impl<M> std::fmt::Debug for TableDefinition<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TableDefinition")
            .field("schema_name", &self.schema_name)
            .field("table_name", &self.table_name)
            .field("version", &self.version)
            .field("fields", &self.fields)
            .field("primary_key", &self.primary_key)
            .field("indexes", &self.indexes)
            .finish()
    }
}

fn split_columns(list: &str) -> Vec<String> {
    list.split(|c: char| c == ',' || c.is_whitespace())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

impl<M: Entity> TableDefinition<M> {
    /// Build the definition from the model's own descriptor.
    pub fn build() -> Result<Self> {
        Self::from_schema(M::schema())
    }
}

impl<M: 'static> TableDefinition<M> {
    /// Build a definition from a model descriptor.
    ///
    /// With table options present, fields are mapped per those options;
    /// without them every public declared field is mapped and type mapping
    /// is lenient.
    pub fn from_schema(schema: ModelSchema<M>) -> Result<Self> {
        let ModelSchema {
            model_name,
            table,
            schema_name,
            version,
            indexes,
            fields,
            parent_fields,
        } = schema;

        let (annotations_only, inherit_columns, strict) = match &table {
            Some(options) => (options.annotations_only, options.inherit_columns, options.strict_type_mapping),
            None => (false, false, false),
        };
        let table_name = table
            .as_ref()
            .and_then(|t| t.name.clone())
            .unwrap_or_else(|| model_name.to_string());

        let mut def = TableDefinition {
            model_name,
            schema_name,
            table_name,
            version,
            create_if_required: table.as_ref().map_or(true, |t| t.create_if_required),
            memory_table: table.as_ref().is_some_and(|t| t.memory_table),
            fields: Vec::new(),
            primary_key: Vec::new(),
            indexes: Vec::new(),
            declared: Vec::new(),
        };

        let own_len = fields.len();
        let mut seen = HashSet::new();
        for (declared_index, spec) in fields.into_iter().chain(parent_fields).enumerate() {
            def.declared.push(spec.name);
            if declared_index >= own_len && !inherit_columns {
                continue;
            }
            let mapped = if annotations_only {
                spec.column.is_some()
            } else {
                spec.public || spec.column.is_some()
            };
            if !mapped {
                continue;
            }
            let field = def.map_field(spec, declared_index, strict)?;
            if !seen.insert(field.column_name.to_ascii_lowercase()) {
                return Err(TideError::DuplicateColumn {
                    table: def.table_name.clone(),
                    column: field.column_name,
                });
            }
            def.fields.push(field);
        }

        let flagged: Vec<String> = def
            .fields
            .iter()
            .filter(|f| f.is_primary_key)
            .map(|f| f.column_name.clone())
            .collect();
        match table.as_ref().and_then(|t| t.primary_key.as_deref()) {
            Some(list) if !split_columns(list).is_empty() => def.set_primary_key(&split_columns(list))?,
            _ => def.set_primary_key(&flagged)?,
        }

        for index in indexes {
            def.add_index(index)?;
        }

        log::debug!(
            "Mapped {} to {} ({} columns, {} indexes)",
            def.model_name,
            def.table_name,
            def.fields.len(),
            def.indexes.len()
        );
        Ok(def)
    }

    fn map_field(&self, spec: FieldSpec<M>, declared_index: usize, strict: bool) -> Result<FieldDefinition<M>> {
        let options = spec.column.clone().unwrap_or_default();
        let enum_type = match spec.field_type {
            FieldType::Enum(descriptor) => Some(spec.enum_type.or(descriptor.default_encoding).unwrap_or_default()),
            _ => None,
        };
        let adapter = spec.adapter.map(|factory| factory());
        let data_type = match &adapter {
            Some(adapter) => adapter.data_type().to_string(),
            None => match type_mapping::sql_type(&spec.field_type, enum_type) {
                Some(data_type) => data_type.to_string(),
                None if strict => {
                    return Err(TideError::UnsupportedType {
                        table: self.table_name.clone(),
                        field: spec.name.to_string(),
                        type_name: spec.field_type.type_name().to_string(),
                    })
                }
                None => type_mapping::FALLBACK_TYPE.to_string(),
            },
        };
        Ok(FieldDefinition {
            column_name: options.name.unwrap_or_else(|| spec.name.to_string()),
            field_name: spec.name,
            field_type: spec.field_type,
            data_type,
            max_length: options.length,
            is_primary_key: options.primary_key,
            is_auto_increment: options.auto_increment,
            trim_string: options.trim,
            allow_null: options.nullable,
            default_value: options.default_value.filter(|d| !d.trim().is_empty()),
            enum_type,
            declared_index,
            adapter: adapter.map(Mutex::new),
            getter: spec.getter,
            setter: spec.setter,
        })
    }

    /// Replace the primary key with the given columns.
    ///
    /// Every name must match a mapped column; the primary key flag of each
    /// field is updated to agree with the new key.
    fn set_primary_key(&mut self, columns: &[String]) -> Result<()> {
        let mut key = Vec::with_capacity(columns.len());
        for column in columns {
            let field = self.find_field(column).ok_or_else(|| TideError::UnknownColumn {
                table: self.table_name.clone(),
                column: column.clone(),
                context: "primary key",
            })?;
            key.push(field.column_name.clone());
        }
        for field in &mut self.fields {
            field.is_primary_key = key.iter().any(|k| k.eq_ignore_ascii_case(&field.column_name));
        }
        self.primary_key = key;
        Ok(())
    }

    fn add_index(&mut self, options: IndexOptions) -> Result<()> {
        let name = options
            .name
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| format!("{}_{}", self.table_name, self.indexes.len()));
        if self.indexes.iter().any(|i| i.name.eq_ignore_ascii_case(&name)) {
            return Err(TideError::DuplicateIndex {
                table: self.table_name.clone(),
                index: name,
            });
        }
        let mut column_names = Vec::with_capacity(options.columns.len());
        for column in &options.columns {
            let field = self.find_field(column).ok_or_else(|| TideError::UnknownColumn {
                table: self.table_name.clone(),
                column: column.clone(),
                context: "index",
            })?;
            column_names.push(field.column_name.clone());
        }
        self.indexes.push(IndexDefinition {
            kind: options.kind,
            name,
            column_names,
        });
        Ok(())
    }
}

impl<M> TableDefinition<M> {
    /// Mapped fields in declaration order.
    pub fn fields(&self) -> &[FieldDefinition<M>] {
        &self.fields
    }

    /// Mapped field by column name, case-insensitively.
    pub fn find_field(&self, column: &str) -> Option<&FieldDefinition<M>> {
        self.fields.iter().find(|f| f.column_name.eq_ignore_ascii_case(column))
    }

    /// Declared field names, mapped and unmapped.
    pub fn declared_fields(&self) -> &[&'static str] {
        &self.declared
    }

    pub fn primary_key_columns(&self) -> &[String] {
        &self.primary_key
    }

    pub fn has_primary_key(&self) -> bool {
        !self.primary_key.is_empty()
    }

    pub fn primary_key_fields(&self) -> impl Iterator<Item = &FieldDefinition<M>> {
        self.fields.iter().filter(|f| f.is_primary_key)
    }

    pub fn indexes(&self) -> &[IndexDefinition] {
        &self.indexes
    }
}

impl<M: Default> TableDefinition<M> {
    /// Build a model instance from a row whose values follow field order.
    pub fn read_row(&self, row: Vec<Value>) -> Result<M> {
        let mut obj = M::default();
        for (field, raw) in self.fields.iter().zip(row) {
            field.set_value(&mut obj, raw)?;
        }
        Ok(obj)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ColumnOptions, TableOptions};

    #[derive(Default)]
    struct Note {
        id: i64,
        title: String,
        body: Option<String>,
        cached: bool,
    }

    fn note_fields() -> ModelSchema<Note> {
        ModelSchema::new("Note")
            .field(FieldSpec::value("id", |m: &Note| &m.id, |m: &mut Note, v| m.id = v))
            .field(FieldSpec::value("title", |m: &Note| &m.title, |m: &mut Note, v| m.title = v))
            .field(FieldSpec::value("body", |m: &Note| &m.body, |m: &mut Note, v| m.body = v))
            .field(FieldSpec::value("cached", |m: &Note| &m.cached, |m: &mut Note, v| m.cached = v).private())
    }

    #[test]
    fn test_reflective_mapping_maps_public_fields() {
        let def = TableDefinition::from_schema(note_fields()).unwrap();
        assert_eq!(def.table_name, "Note");
        let columns: Vec<_> = def.fields().iter().map(|f| f.column_name.as_str()).collect();
        assert_eq!(columns, vec!["id", "title", "body"]);
        assert!(!def.has_primary_key());
        assert_eq!(def.declared_fields().len(), 4);
    }

    #[test]
    fn test_annotations_only_maps_annotated_fields() {
        let schema = ModelSchema::new("Note")
            .table(TableOptions {
                name: Some("NOTES".into()),
                ..Default::default()
            })
            .field(
                FieldSpec::value("id", |m: &Note| &m.id, |m: &mut Note, v| m.id = v).column(ColumnOptions {
                    primary_key: true,
                    ..Default::default()
                }),
            )
            .field(FieldSpec::value("title", |m: &Note| &m.title, |m: &mut Note, v| m.title = v));
        let def = TableDefinition::from_schema(schema).unwrap();
        assert_eq!(def.table_name, "NOTES");
        assert_eq!(def.fields().len(), 1);
        assert_eq!(def.primary_key_columns(), ["id".to_string()]);
    }

    #[test]
    fn test_table_primary_key_overrides_field_flags() {
        let schema = note_fields()
            .table(TableOptions {
                primary_key: Some("title, body".into()),
                annotations_only: false,
                ..Default::default()
            })
            .field(FieldSpec::value("id2", |m: &Note| &m.id, |m: &mut Note, v| m.id = v).column(ColumnOptions {
                primary_key: true,
                ..Default::default()
            }));
        let def = TableDefinition::from_schema(schema).unwrap();
        assert_eq!(def.primary_key_columns(), ["title".to_string(), "body".to_string()]);
        assert!(!def.find_field("id2").unwrap().is_primary_key);
        assert!(def.find_field("TITLE").unwrap().is_primary_key);
    }

    #[test]
    fn test_unknown_primary_key_column() {
        let schema = note_fields().table(TableOptions {
            primary_key: Some("missing".into()),
            annotations_only: false,
            ..Default::default()
        });
        let err = TableDefinition::from_schema(schema).unwrap_err();
        assert_eq!(err.code(), crate::ErrorCode::UnknownColumn);
    }

    #[test]
    fn test_duplicate_column_rejected() {
        let schema = note_fields().field(
            FieldSpec::value("title2", |m: &Note| &m.title, |m: &mut Note, v| m.title = v).column(ColumnOptions {
                name: Some("TITLE".into()),
                ..Default::default()
            }),
        );
        let err = TableDefinition::from_schema(schema).unwrap_err();
        assert_eq!(err.code(), crate::ErrorCode::DuplicateColumn);
    }

    #[test]
    fn test_index_names_and_validation() {
        let schema = note_fields()
            .table(TableOptions {
                annotations_only: false,
                ..Default::default()
            })
            .index(IndexOptions::new(IndexType::Standard, &["title"]))
            .index(IndexOptions::new(IndexType::Unique, &["title", "body"]));
        let def = TableDefinition::from_schema(schema).unwrap();
        let names: Vec<_> = def.indexes().iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["Note_0", "Note_1"]);

        let schema = note_fields()
            .index(IndexOptions::new(IndexType::Standard, &["title"]).named("ix"))
            .index(IndexOptions::new(IndexType::Hash, &["body"]).named("IX"));
        let err = TableDefinition::from_schema(schema).unwrap_err();
        assert_eq!(err.code(), crate::ErrorCode::DuplicateIndex);

        let schema = note_fields().index(IndexOptions::new(IndexType::Standard, &["nope"]));
        let err = TableDefinition::from_schema(schema).unwrap_err();
        assert_eq!(err.code(), crate::ErrorCode::UnknownColumn);
    }

    #[test]
    fn test_read_row_sets_fields() {
        let def = TableDefinition::from_schema(note_fields()).unwrap();
        let note = def
            .read_row(vec![
                Value::BigInt(Some(4)),
                Value::String(Some("hello".into())),
                Value::String(None),
            ])
            .unwrap();
        assert_eq!(note.id, 4);
        assert_eq!(note.title, "hello");
        assert_eq!(note.body, None);
    }

    #[test]
    fn test_strict_mapping_rejects_unknown_types() {
        #[derive(Default)]
        struct Link {
            grade: char,
        }

        let schema = || {
            ModelSchema::new("Link").field(
                FieldSpec::text("grade", "char", |m: &Link| &m.grade, |m: &mut Link, v| m.grade = v)
                    .column(ColumnOptions::default()),
            )
        };
        let err = TableDefinition::from_schema(schema().table(TableOptions::default())).unwrap_err();
        assert_eq!(err.code(), crate::ErrorCode::UnsupportedType);

        let lenient = TableDefinition::from_schema(schema()).unwrap();
        assert_eq!(lenient.fields()[0].data_type, "VARCHAR");
    }

    #[test]
    fn test_json_serialization_failure_is_reported() {
        use std::collections::HashMap;

        #[derive(Default)]
        struct Grid {
            cells: HashMap<(i32, i32), String>,
        }

        let schema = ModelSchema::new("Grid").field(FieldSpec::json(
            "cells",
            |m: &Grid| &m.cells,
            |m: &mut Grid, v| m.cells = v,
        ));
        let def = TableDefinition::from_schema(schema).unwrap();
        let mut grid = Grid::default();
        grid.cells.insert((1, 2), "x".into());
        let err = def.fields()[0].storage_value(&grid).unwrap_err();
        assert_eq!(err.code(), crate::ErrorCode::Conversion);
    }
}
