//! Registry of built table definitions.
//!
//! Each model type is built at most once per registry and the definition is
//! shared afterwards. A registry is an ordinary value: sessions hold it
//! through an `Arc`, and tests can create as many isolated registries as they
//! need.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use super::definition::TableDefinition;
use super::schema::Entity;
use crate::error::{Result, TideError};

type Shared = Arc<dyn Any + Send + Sync>;

/// Cache of table definitions keyed by model type.
#[derive(Default)]
pub struct MappingRegistry {
    tables: RwLock<HashMap<TypeId, Shared>>,
}

impl MappingRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The definition of `M`, building it on first request.
    ///
    /// Concurrent first requests may each build a definition; the first one
    /// stored wins and every caller receives that one.
    ///
    /// # Errors
    ///
    /// Returns the metadata build error when the model descriptor is invalid.
    /// A failed build is not cached.
    pub fn definition<M: Entity>(&self) -> Result<Arc<TableDefinition<M>>> {
        let key = TypeId::of::<M>();
        {
            let tables = self.tables.read().map_err(|e| lock_error(&e))?;
            if let Some(found) = tables.get(&key) {
                return downcast::<M>(found.clone());
            }
        }

        let built: Shared = Arc::new(TableDefinition::<M>::build()?);
        let mut tables = self.tables.write().map_err(|e| lock_error(&e))?;
        let stored = tables.entry(key).or_insert(built).clone();
        downcast::<M>(stored)
    }

    /// Whether `M` has been built in this registry.
    pub fn contains<M: Entity>(&self) -> bool {
        self.tables
            .read()
            .map(|tables| tables.contains_key(&TypeId::of::<M>()))
            .unwrap_or(false)
    }

    pub fn len(&self) -> usize {
        self.tables.read().map(|tables| tables.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn lock_error(e: &dyn std::fmt::Display) -> TideError {
    TideError::Execution(format!("Failed to lock mapping registry: {e}"))
}

fn downcast<M: Entity>(shared: Shared) -> Result<Arc<TableDefinition<M>>> {
    shared
        .downcast::<TableDefinition<M>>()
        .map_err(|_| TideError::Execution(format!("registry entry for {} has the wrong type", std::any::type_name::<M>())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{FieldSpec, ModelSchema};

    #[derive(Default)]
    struct Counter {
        id: i32,
    }

    impl Entity for Counter {
        fn schema() -> ModelSchema<Self> {
            ModelSchema::new("Counter").field(FieldSpec::value("id", |m: &Counter| &m.id, |m: &mut Counter, v| m.id = v))
        }
    }

    #[test]
    fn test_definition_is_built_once() {
        let registry = MappingRegistry::new();
        assert!(registry.is_empty());
        let first = registry.definition::<Counter>().unwrap();
        let second = registry.definition::<Counter>().unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(registry.len(), 1);
        assert!(registry.contains::<Counter>());
    }

    #[test]
    fn test_registries_are_isolated() {
        let a = MappingRegistry::new();
        let b = MappingRegistry::new();
        let from_a = a.definition::<Counter>().unwrap();
        let from_b = b.definition::<Counter>().unwrap();
        assert!(!Arc::ptr_eq(&from_a, &from_b));
    }

    #[test]
    fn test_concurrent_first_use_agrees() {
        let registry = Arc::new(MappingRegistry::new());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let registry = Arc::clone(&registry);
                std::thread::spawn(move || registry.definition::<Counter>().unwrap())
            })
            .collect();
        let defs: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert!(defs.windows(2).all(|w| Arc::ptr_eq(&w[0], &w[1])));
    }
}
