//! Model descriptors.
//!
//! A model describes itself once through [`Entity::schema`]: table-level
//! options, indexes, and one [`FieldSpec`] per declared field carrying the
//! column options plus accessor and mutator closures. The metadata build
//! turns this description into a [`TableDefinition`](super::TableDefinition).
//!
//! # Example
//!
//! ```no_run
//! use tidemark::{ColumnOptions, Entity, FieldSpec, ModelSchema, TableOptions};
//!
//! #[derive(Default)]
//! pub struct Product {
//!     pub id: i64,
//!     pub name: String,
//! }
//!
//! impl Entity for Product {
//!     fn schema() -> ModelSchema<Self> {
//!         ModelSchema::new("Product")
//!             .table(TableOptions { primary_key: Some("id".into()), ..Default::default() })
//!             .field(
//!                 FieldSpec::value("id", |m: &Product| &m.id, |m: &mut Product, v| m.id = v)
//!                     .column(ColumnOptions { auto_increment: true, ..Default::default() }),
//!             )
//!             .field(
//!                 FieldSpec::value("name", |m: &Product| &m.name, |m: &mut Product, v| m.name = v)
//!                     .column(ColumnOptions::default()),
//!             )
//!     }
//! }
//! ```

use sea_query::Value;
use serde::{de::DeserializeOwned, Serialize};
use std::fmt::Display;
use std::marker::PhantomData;
use std::str::FromStr;
use std::sync::Arc;

use crate::error::{Result, TideError};
use crate::value::{AdapterFactory, DbEnum, EnumType, EnumValue, FieldType, FieldValue, ValueType};

/// A model type mapped to a table.
pub trait Entity: Default + Send + Sync + 'static {
    fn schema() -> ModelSchema<Self>;
}

/// Typed handle naming one declared field of a model.
///
/// The index counts the model's own declared fields first, then the fields
/// of an embedded parent.
pub struct FieldKey<M> {
    index: usize,
    _model: PhantomData<fn() -> M>,
}

impl<M> FieldKey<M> {
    pub const fn new(index: usize) -> Self {
        Self {
            index,
            _model: PhantomData,
        }
    }

    pub const fn index(&self) -> usize {
        self.index
    }
}

impl<M> Clone for FieldKey<M> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<M> Copy for FieldKey<M> {}

impl<M> std::fmt::Debug for FieldKey<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("FieldKey").field(&self.index).finish()
    }
}

/// Kind of a secondary index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum IndexType {
    #[default]
    Standard,
    Unique,
    Hash,
    UniqueHash,
}

/// Table-level options. Presence switches the model from reflective mapping
/// to option-driven mapping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableOptions {
    /// Table name; defaults to the model name
    pub name: Option<String>,
    /// Primary key columns separated by commas or whitespace; overrides field flags
    pub primary_key: Option<String>,
    /// Also map the declared fields of the embedded parent (one level only)
    pub inherit_columns: bool,
    /// Whether table and indexes are created on first use
    pub create_if_required: bool,
    /// Whether unmappable field types fail the build instead of becoming VARCHAR
    pub strict_type_mapping: bool,
    /// Whether only fields with column options are mapped
    pub annotations_only: bool,
    /// Create as a memory table where the dialect supports it
    pub memory_table: bool,
}

impl Default for TableOptions {
    fn default() -> Self {
        Self {
            name: None,
            primary_key: None,
            inherit_columns: false,
            create_if_required: true,
            strict_type_mapping: true,
            annotations_only: true,
            memory_table: false,
        }
    }
}

/// Column-level options attached to a field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnOptions {
    /// Column name; defaults to the field name
    pub name: Option<String>,
    pub primary_key: bool,
    pub auto_increment: bool,
    /// Maximum length; 0 means unbounded
    pub length: usize,
    /// Truncate strings longer than `length` on write
    pub trim: bool,
    pub nullable: bool,
    /// Literal or function used in the DEFAULT clause
    pub default_value: Option<String>,
}

impl Default for ColumnOptions {
    fn default() -> Self {
        Self {
            name: None,
            primary_key: false,
            auto_increment: false,
            length: 0,
            trim: false,
            nullable: true,
            default_value: None,
        }
    }
}

/// Declared secondary index.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct IndexOptions {
    /// Index name; generated as `<table>_<ordinal>` when absent
    pub name: Option<String>,
    pub kind: IndexType,
    pub columns: Vec<String>,
}

impl IndexOptions {
    pub fn new(kind: IndexType, columns: &[&str]) -> Self {
        Self {
            name: None,
            kind,
            columns: columns.iter().map(|c| c.to_string()).collect(),
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

pub(crate) type Getter<M> = Arc<dyn Fn(&M) -> Result<FieldValue> + Send + Sync>;
pub(crate) type Setter<M> = Arc<dyn Fn(&mut M, FieldValue) -> Result<()> + Send + Sync>;

/// Description of one declared field.
pub struct FieldSpec<M> {
    pub(crate) name: &'static str,
    pub(crate) public: bool,
    pub(crate) field_type: FieldType,
    pub(crate) column: Option<ColumnOptions>,
    pub(crate) enum_type: Option<EnumType>,
    pub(crate) adapter: Option<AdapterFactory>,
    pub(crate) getter: Getter<M>,
    pub(crate) setter: Setter<M>,
}

impl<M: 'static> FieldSpec<M> {
    fn with_accessors(name: &'static str, field_type: FieldType, getter: Getter<M>, setter: Setter<M>) -> Self {
        Self {
            name,
            public: true,
            field_type,
            column: None,
            enum_type: None,
            adapter: None,
            getter,
            setter,
        }
    }

    /// A field whose Rust type is in the type table.
    pub fn value<T, G, S>(name: &'static str, get: G, set: S) -> Self
    where
        T: ValueType + Clone + 'static,
        G: Fn(&M) -> &T + Send + Sync + 'static,
        S: Fn(&mut M, T) + Send + Sync + 'static,
    {
        Self::with_accessors(
            name,
            T::field_type(),
            Arc::new(move |m| Ok(FieldValue::Plain(get(m).clone().into_value()))),
            Arc::new(move |m, v| {
                set(m, v.into_typed::<T>(name)?);
                Ok(())
            }),
        )
    }

    /// An enum field; the encoding comes from the enum type unless overridden
    /// with [`FieldSpec::enum_type`].
    pub fn enumeration<E, G, S>(name: &'static str, get: G, set: S) -> Self
    where
        E: DbEnum,
        G: Fn(&M) -> &E + Send + Sync + 'static,
        S: Fn(&mut M, E) + Send + Sync + 'static,
    {
        Self::with_accessors(
            name,
            FieldType::Enum(E::descriptor()),
            Arc::new(move |m| Ok(FieldValue::Enum(Some(EnumValue::of(get(m))?)))),
            Arc::new(move |m, v| match v {
                FieldValue::Enum(Some(member)) => {
                    set(m, member.into_enum::<E>()?);
                    Ok(())
                }
                FieldValue::Enum(None) => Ok(()),
                FieldValue::Plain(other) => Err(TideError::conversion(
                    name,
                    format!("{other:?} is not a member of {}", E::descriptor().name),
                )),
            }),
        )
    }

    /// A field of a type outside the type table, written through `Display`
    /// and read back through `FromStr`. Strict type mapping rejects it.
    pub fn text<T, G, S>(name: &'static str, type_name: &'static str, get: G, set: S) -> Self
    where
        T: Display + FromStr + 'static,
        G: Fn(&M) -> &T + Send + Sync + 'static,
        S: Fn(&mut M, T) + Send + Sync + 'static,
    {
        Self::with_accessors(
            name,
            FieldType::Other(type_name),
            Arc::new(move |m| Ok(FieldValue::Plain(Value::String(Some(get(m).to_string()))))),
            Arc::new(move |m, v| {
                if let Some(text) = v.into_typed::<Option<String>>(name)? {
                    let parsed = text
                        .parse::<T>()
                        .map_err(|_| TideError::conversion(name, format!("'{text}' is not a valid {type_name}")))?;
                    set(m, parsed);
                }
                Ok(())
            }),
        )
    }

    /// A serde-serializable field carried as a JSON document. Usually paired
    /// with a type adapter that picks the storage form.
    pub fn json<T, G, S>(name: &'static str, get: G, set: S) -> Self
    where
        T: Serialize + DeserializeOwned + 'static,
        G: Fn(&M) -> &T + Send + Sync + 'static,
        S: Fn(&mut M, T) + Send + Sync + 'static,
    {
        Self::with_accessors(
            name,
            FieldType::Json,
            Arc::new(move |m| {
                let doc = serde_json::to_value(get(m)).map_err(|e| TideError::conversion(name, e.to_string()))?;
                Ok(FieldValue::Plain(Value::Json(Some(Box::new(doc)))))
            }),
            Arc::new(move |m, v| {
                if let Some(doc) = v.into_typed::<Option<serde_json::Value>>(name)? {
                    let parsed = serde_json::from_value(doc).map_err(|e| TideError::conversion(name, e.to_string()))?;
                    set(m, parsed);
                }
                Ok(())
            }),
        )
    }

    /// Mark the field as not public; reflective mapping skips it.
    pub fn private(mut self) -> Self {
        self.public = false;
        self
    }

    /// Attach column options (the field becomes explicitly mapped).
    pub fn column(mut self, options: ColumnOptions) -> Self {
        self.column = Some(options);
        self
    }

    /// Override the enum encoding for this field only.
    pub fn enum_type(mut self, encoding: EnumType) -> Self {
        self.enum_type = Some(encoding);
        self
    }

    /// Serialize this field through a type adapter.
    pub fn adapter(mut self, factory: AdapterFactory) -> Self {
        self.adapter = Some(factory);
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Lift a field of an embedded struct `M` into the enclosing model `P`.
    pub fn project<P: 'static>(self, get: fn(&P) -> &M, get_mut: fn(&mut P) -> &mut M) -> FieldSpec<P> {
        let getter = self.getter;
        let setter = self.setter;
        FieldSpec {
            name: self.name,
            public: self.public,
            field_type: self.field_type,
            column: self.column,
            enum_type: self.enum_type,
            adapter: self.adapter,
            getter: Arc::new(move |p| getter(get(p))),
            setter: Arc::new(move |p, v| setter(get_mut(p), v)),
        }
    }
}

/// Per-model description consumed by the metadata build.
pub struct ModelSchema<M> {
    pub(crate) model_name: &'static str,
    pub(crate) table: Option<TableOptions>,
    pub(crate) schema_name: Option<String>,
    pub(crate) version: i32,
    pub(crate) indexes: Vec<IndexOptions>,
    pub(crate) fields: Vec<FieldSpec<M>>,
    pub(crate) parent_fields: Vec<FieldSpec<M>>,
}

impl<M: 'static> ModelSchema<M> {
    pub fn new(model_name: &'static str) -> Self {
        Self {
            model_name,
            table: None,
            schema_name: None,
            version: 0,
            indexes: Vec::new(),
            fields: Vec::new(),
            parent_fields: Vec::new(),
        }
    }

    pub fn table(mut self, options: TableOptions) -> Self {
        self.table = Some(options);
        self
    }

    pub fn schema_name(mut self, name: impl Into<String>) -> Self {
        self.schema_name = Some(name.into());
        self
    }

    /// Declared model version; 0 disables upgrade checks.
    pub fn version(mut self, version: i32) -> Self {
        self.version = version;
        self
    }

    pub fn index(mut self, index: IndexOptions) -> Self {
        self.indexes.push(index);
        self
    }

    pub fn field(mut self, field: FieldSpec<M>) -> Self {
        self.fields.push(field);
        self
    }

    /// Declare the embedded parent whose own declared fields are mapped when
    /// the table options set `inherit_columns`. The parent's parent is never
    /// consulted.
    pub fn inherit<P: Entity>(mut self, get: fn(&M) -> &P, get_mut: fn(&mut M) -> &mut P) -> Self {
        self.parent_fields = P::schema()
            .fields
            .into_iter()
            .map(|field| field.project(get, get_mut))
            .collect();
        self
    }

    pub fn model_name(&self) -> &'static str {
        self.model_name
    }

    /// Number of declared fields, own and inherited.
    pub fn declared_len(&self) -> usize {
        self.fields.len() + self.parent_fields.len()
    }
}
