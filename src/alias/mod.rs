//! Alias resolution.
//!
//! Query expressions name columns through field handles instead of strings.
//! An [`Alias`] is one handle space over a model: it hands out a [`Sentinel`]
//! per declared field and maps each sentinel back to the mapped field.
//! Resolution is by alias identity: a sentinel from another alias, even of the
//! same model, does not resolve.
//!
//! A [`SelectAlias`] shares the sentinels of the alias it was bound from and
//! pairs each one with a [`SelectColumn`] that holds the value of the most
//! recently read row.

use sea_query::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::error::{Result, TideError};
use crate::model::{Entity, FieldDefinition, FieldKey, MappingRegistry, TableDefinition};

static NEXT_ALIAS: AtomicU64 = AtomicU64::new(1);

/// Handle standing for one declared field of one alias.
///
/// Carries the identity of the alias that issued it, so a handle from one
/// alias never resolves against another, even of the same model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Sentinel {
    alias: u64,
    index: usize,
}

#[derive(Debug, Clone, Copy)]
enum Target {
    /// Index into the definition's mapped fields
    Mapped(usize),
    /// Declared but not mapped
    Unmapped(&'static str),
}

fn targets<M>(definition: &TableDefinition<M>) -> Arc<[Target]> {
    definition
        .declared_fields()
        .iter()
        .enumerate()
        .map(|(declared_index, name)| {
            definition
                .fields()
                .iter()
                .position(|f| f.declared_index == declared_index)
                .map_or(Target::Unmapped(*name), Target::Mapped)
        })
        .collect()
}

fn resolve_target<M>(definition: &TableDefinition<M>, alias: u64, targets: &[Target], sentinel: Sentinel) -> Result<usize> {
    let target = if sentinel.alias == alias {
        targets.get(sentinel.index).copied()
    } else {
        None
    };
    match target {
        Some(Target::Mapped(index)) => Ok(index),
        Some(Target::Unmapped(field)) => Err(TideError::UnmappedField {
            table: definition.table_name.clone(),
            field: field.to_string(),
        }),
        None => Err(TideError::UnresolvableField {
            table: definition.table_name.clone(),
        }),
    }
}

/// A materialized sample of a model: the handle space for one query.
pub struct Alias<M> {
    id: u64,
    definition: Arc<TableDefinition<M>>,
    targets: Arc<[Target]>,
}

impl<M: Entity> Alias<M> {
    /// Materialize an alias for `M` using the registry's definition.
    pub fn of(registry: &MappingRegistry) -> Result<Self> {
        Ok(Self::materialize(registry.definition::<M>()?))
    }
}

impl<M> Alias<M> {
    /// Issue a fresh handle space over every declared field of the definition.
    pub fn materialize(definition: Arc<TableDefinition<M>>) -> Self {
        Self {
            id: NEXT_ALIAS.fetch_add(1, Ordering::Relaxed),
            targets: targets(&definition),
            definition,
        }
    }

    pub fn definition(&self) -> &Arc<TableDefinition<M>> {
        &self.definition
    }

    /// The sentinel of a declared field.
    pub fn field(&self, key: FieldKey<M>) -> Sentinel {
        Sentinel {
            alias: self.id,
            index: key.index(),
        }
    }

    /// The sentinel standing for a mapped field of this alias.
    pub(crate) fn sentinel_of(&self, field: &FieldDefinition<M>) -> Sentinel {
        Sentinel {
            alias: self.id,
            index: field.declared_index,
        }
    }

    /// Resolve a sentinel to the field it stands for.
    ///
    /// # Errors
    ///
    /// `UnmappedField` when the sentinel belongs to this alias but its field
    /// is not mapped; `UnresolvableField` when it belongs to no field of this
    /// alias.
    pub fn resolve(&self, sentinel: Sentinel) -> Result<&FieldDefinition<M>> {
        let index = resolve_target(&self.definition, self.id, &self.targets, sentinel)?;
        Ok(&self.definition.fields()[index])
    }

    /// Bind a query-bound view over the same sentinels.
    pub fn bind_select(&self) -> SelectAlias<M> {
        SelectAlias {
            id: self.id,
            definition: Arc::clone(&self.definition),
            targets: Arc::clone(&self.targets),
            columns: (0..self.definition.fields().len())
                .map(|field_index| SelectColumn {
                    field_index,
                    current: None,
                })
                .collect(),
        }
    }
}

/// One selected column and the value it held in the last row read.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectColumn {
    field_index: usize,
    current: Option<Value>,
}

impl SelectColumn {
    pub fn field_index(&self) -> usize {
        self.field_index
    }

    /// Raw value from the last row read, if any row has been read.
    pub fn current(&self) -> Option<&Value> {
        self.current.as_ref()
    }
}

/// Query-bound view of an alias.
pub struct SelectAlias<M> {
    id: u64,
    definition: Arc<TableDefinition<M>>,
    targets: Arc<[Target]>,
    columns: Vec<SelectColumn>,
}

impl<M> Clone for SelectAlias<M> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            definition: Arc::clone(&self.definition),
            targets: Arc::clone(&self.targets),
            columns: self.columns.clone(),
        }
    }
}

impl<M> SelectAlias<M> {
    pub fn definition(&self) -> &Arc<TableDefinition<M>> {
        &self.definition
    }

    /// Selected columns in field order.
    pub fn columns(&self) -> &[SelectColumn] {
        &self.columns
    }

    /// Resolve a sentinel to its select column.
    pub fn resolve(&self, sentinel: Sentinel) -> Result<&SelectColumn> {
        let index = resolve_target(&self.definition, self.id, &self.targets, sentinel)?;
        Ok(&self.columns[index])
    }

    /// Resolve a sentinel to the field behind its select column.
    pub fn resolve_field(&self, sentinel: Sentinel) -> Result<&FieldDefinition<M>> {
        let column = self.resolve(sentinel)?;
        Ok(&self.definition.fields()[column.field_index])
    }

    /// Record a row whose values follow field order.
    ///
    /// The row must carry exactly one value per select column.
    pub fn read_row(&mut self, row: Vec<Value>) -> Result<()> {
        if row.len() != self.columns.len() {
            return Err(TideError::conversion(
                &self.definition.table_name,
                format!("row has {} values for {} columns", row.len(), self.columns.len()),
            ));
        }
        for (column, value) in self.columns.iter_mut().zip(row) {
            column.current = Some(value);
        }
        Ok(())
    }
}

impl<M: Default> SelectAlias<M> {
    /// Copy the current row values into a fresh model instance.
    pub fn copy_attribute_values(&self) -> Result<M> {
        let mut obj = M::default();
        for column in &self.columns {
            if let Some(value) = &column.current {
                self.definition.fields()[column.field_index].set_value(&mut obj, value.clone())?;
            }
        }
        Ok(obj)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ColumnOptions, FieldSpec, ModelSchema, TableOptions};
    use crate::ErrorCode;

    #[derive(Default)]
    struct Pair {
        key: String,
        value: i32,
        scratch: i32,
    }

    impl Pair {
        const KEY: FieldKey<Self> = FieldKey::new(0);
        const VALUE: FieldKey<Self> = FieldKey::new(1);
        const SCRATCH: FieldKey<Self> = FieldKey::new(2);
    }

    impl Entity for Pair {
        fn schema() -> ModelSchema<Self> {
            ModelSchema::new("Pair")
                .table(TableOptions::default())
                .field(
                    FieldSpec::value("key", |m: &Pair| &m.key, |m: &mut Pair, v| m.key = v)
                        .column(ColumnOptions::default()),
                )
                .field(
                    FieldSpec::value("value", |m: &Pair| &m.value, |m: &mut Pair, v| m.value = v)
                        .column(ColumnOptions::default()),
                )
                .field(FieldSpec::value("scratch", |m: &Pair| &m.scratch, |m: &mut Pair, v| m.scratch = v))
        }
    }

    #[test]
    fn test_sentinels_resolve_to_their_field() {
        let registry = MappingRegistry::new();
        let alias = Alias::<Pair>::of(&registry).unwrap();
        assert_eq!(alias.resolve(alias.field(Pair::KEY)).unwrap().column_name, "key");
        assert_eq!(alias.resolve(alias.field(Pair::VALUE)).unwrap().column_name, "value");
        assert_ne!(alias.field(Pair::KEY), alias.field(Pair::VALUE));
    }

    #[test]
    fn test_unmapped_and_foreign_sentinels() {
        let registry = MappingRegistry::new();
        let alias = Alias::<Pair>::of(&registry).unwrap();
        let other = Alias::<Pair>::of(&registry).unwrap();

        let err = alias.resolve(alias.field(Pair::SCRATCH)).unwrap_err();
        assert_eq!(err.code(), ErrorCode::UnmappedField);

        let err = alias.resolve(other.field(Pair::KEY)).unwrap_err();
        assert_eq!(err.code(), ErrorCode::UnresolvableField);
    }

    #[test]
    fn test_select_alias_tracks_last_row() {
        let registry = MappingRegistry::new();
        let alias = Alias::<Pair>::of(&registry).unwrap();
        let mut select = alias.bind_select();
        assert!(select.resolve(alias.field(Pair::VALUE)).unwrap().current().is_none());

        select.read_row(vec![Value::String(Some("a".into())), Value::BigInt(Some(3))]).unwrap();
        select.read_row(vec![Value::String(Some("b".into())), Value::BigInt(Some(7))]).unwrap();
        let column = select.resolve(alias.field(Pair::VALUE)).unwrap();
        assert_eq!(column.current(), Some(&Value::BigInt(Some(7))));

        let pair: Pair = select.copy_attribute_values().unwrap();
        assert_eq!(pair.key, "b");
        assert_eq!(pair.value, 7);
    }

    #[test]
    fn test_short_row_is_rejected() {
        let registry = MappingRegistry::new();
        let alias = Alias::<Pair>::of(&registry).unwrap();
        let mut select = alias.bind_select();
        select.read_row(vec![Value::String(Some("a".into())), Value::BigInt(Some(3))]).unwrap();

        let err = select.read_row(vec![Value::String(Some("b".into()))]).unwrap_err();
        assert_eq!(err.code(), ErrorCode::Conversion);
        let column = select.resolve(alias.field(Pair::VALUE)).unwrap();
        assert_eq!(column.current(), Some(&Value::BigInt(Some(3))));
    }
}
