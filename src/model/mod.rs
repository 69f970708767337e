//! Field and table metadata.
//!
//! Models describe themselves with a [`ModelSchema`]; the build turns that
//! description into a [`TableDefinition`], cached per model type in a
//! [`MappingRegistry`].

pub mod definition;
pub mod registry;
pub mod schema;
pub(crate) mod type_mapping;

pub use definition::{FieldDefinition, IndexDefinition, TableDefinition};
pub use registry::MappingRegistry;
pub use schema::{ColumnOptions, Entity, FieldKey, FieldSpec, IndexOptions, IndexType, ModelSchema, TableOptions};
