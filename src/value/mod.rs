//! Value type system for tidemark
//!
//! This module covers everything between a model field and a bound SQL
//! parameter:
//!
//! - **`ValueType`** - maps Rust types to `sea_query::Value` variants and field type tags
//! - **`EnumType` / `DbEnum`** - enum encoding by name, ordinal or identifier
//! - **`TypeAdapter`** - pluggable serializers for application types
//! - **`to_storage` / `from_storage`** - the write and read pipelines

pub mod adapter;
pub mod conversion;
pub mod enums;
pub mod types;

pub use adapter::{AdapterFactory, JsonTextAdapter, TypeAdapter};
pub use conversion::{coerce, from_storage, to_storage, FieldValue};
pub use enums::{DbEnum, EnumDescriptor, EnumMember, EnumType, EnumValue};
pub use types::{is_null, FieldType, ValueType};
