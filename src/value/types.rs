//! ValueType trait for type-safe value conversions
//!
//! The `ValueType` trait maps Rust field types to their corresponding
//! `sea_query::Value` variant and to the [`FieldType`] tag used by the
//! metadata build to pick an SQL data type.
//!
//! ## Implementation
//!
//! The trait is implemented for:
//!
//! - Integer types: `i8`, `i16`, `i32`, `i64`
//! - Floating point: `f32`, `f64`
//! - Boolean: `bool`
//! - String: `String`
//! - Binary: `Vec<u8>`
//! - Temporal: `chrono::NaiveDate`, `chrono::NaiveTime`, `chrono::NaiveDateTime`
//! - `uuid::Uuid`, `rust_decimal::Decimal`, `serde_json::Value`
//! - `Option<T>` for all above types

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal::Decimal;
use sea_query::Value;
use uuid::Uuid;

use super::enums::EnumDescriptor;

/// Declared type of a model field, as seen by the metadata build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    Bool,
    TinyInt,
    SmallInt,
    Int,
    BigInt,
    Float,
    Double,
    Decimal,
    String,
    Bytes,
    Date,
    Time,
    DateTime,
    Uuid,
    Json,
    /// An enumeration; the storage type depends on the encoding mode
    Enum(&'static EnumDescriptor),
    /// A type outside the type table, identified by its Rust type name
    Other(&'static str),
}

impl FieldType {
    /// The typed null for this field type.
    pub fn null_value(&self) -> Value {
        match self {
            FieldType::Bool => Value::Bool(None),
            FieldType::TinyInt => Value::TinyInt(None),
            FieldType::SmallInt => Value::SmallInt(None),
            FieldType::Int => Value::Int(None),
            FieldType::BigInt => Value::BigInt(None),
            FieldType::Float => Value::Float(None),
            FieldType::Double => Value::Double(None),
            FieldType::Decimal => Value::Decimal(None),
            FieldType::String | FieldType::Other(_) => Value::String(None),
            FieldType::Bytes => Value::Bytes(None),
            FieldType::Date => Value::ChronoDate(None),
            FieldType::Time => Value::ChronoTime(None),
            FieldType::DateTime => Value::ChronoDateTime(None),
            FieldType::Uuid => Value::Uuid(None),
            FieldType::Json => Value::Json(None),
            FieldType::Enum(_) => Value::String(None),
        }
    }

    /// Short name used in diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            FieldType::Bool => "bool",
            FieldType::TinyInt => "i8",
            FieldType::SmallInt => "i16",
            FieldType::Int => "i32",
            FieldType::BigInt => "i64",
            FieldType::Float => "f32",
            FieldType::Double => "f64",
            FieldType::Decimal => "Decimal",
            FieldType::String => "String",
            FieldType::Bytes => "Vec<u8>",
            FieldType::Date => "NaiveDate",
            FieldType::Time => "NaiveTime",
            FieldType::DateTime => "NaiveDateTime",
            FieldType::Uuid => "Uuid",
            FieldType::Json => "serde_json::Value",
            FieldType::Enum(descriptor) => descriptor.name,
            FieldType::Other(name) => name,
        }
    }
}

/// Returns `true` when the value is SQL NULL regardless of its variant.
pub fn is_null(value: &Value) -> bool {
    matches!(
        value,
        Value::Bool(None)
            | Value::TinyInt(None)
            | Value::SmallInt(None)
            | Value::Int(None)
            | Value::BigInt(None)
            | Value::TinyUnsigned(None)
            | Value::SmallUnsigned(None)
            | Value::Unsigned(None)
            | Value::BigUnsigned(None)
            | Value::Float(None)
            | Value::Double(None)
            | Value::String(None)
            | Value::Char(None)
            | Value::Bytes(None)
            | Value::Json(None)
            | Value::ChronoDate(None)
            | Value::ChronoTime(None)
            | Value::ChronoDateTime(None)
            | Value::Uuid(None)
            | Value::Decimal(None)
    )
}

/// Trait for mapping Rust types to their corresponding `sea_query::Value` variant.
///
/// ## Example
///
/// ```rust
/// use tidemark::ValueType;
/// use sea_query::Value;
///
/// let value = ValueType::into_value(42i32);
/// assert!(matches!(value, Value::Int(Some(42))));
///
/// let value = ValueType::into_value(None::<i32>);
/// assert!(matches!(value, Value::Int(None)));
/// ```
pub trait ValueType: Sized {
    /// The field type tag for this Rust type.
    fn field_type() -> FieldType;

    /// Convert this value into a `sea_query::Value`.
    fn into_value(self) -> Value;

    /// Convert a `sea_query::Value` into this type, if possible.
    ///
    /// Returns `None` if the value doesn't match the expected variant or is null.
    fn from_value(value: Value) -> Option<Self>;

    /// Return the null variant for this type.
    fn null_value() -> Value {
        Self::field_type().null_value()
    }
}

macro_rules! value_type {
    ($ty:ty, $tag:ident, $variant:ident) => {
        impl ValueType for $ty {
            fn field_type() -> FieldType {
                FieldType::$tag
            }

            fn into_value(self) -> Value {
                Value::$variant(Some(self))
            }

            fn from_value(value: Value) -> Option<Self> {
                match value {
                    Value::$variant(Some(v)) => Some(v),
                    _ => None,
                }
            }
        }
    };
}

value_type!(bool, Bool, Bool);
value_type!(i8, TinyInt, TinyInt);
value_type!(i16, SmallInt, SmallInt);
value_type!(i32, Int, Int);
value_type!(i64, BigInt, BigInt);
value_type!(f32, Float, Float);
value_type!(f64, Double, Double);
value_type!(String, String, String);
value_type!(Vec<u8>, Bytes, Bytes);

// chrono, uuid and decimal values go through sea-query's own conversions so the
// variant payload shape stays an implementation detail of sea-query.
macro_rules! sea_value_type {
    ($ty:ty, $tag:ident) => {
        impl ValueType for $ty {
            fn field_type() -> FieldType {
                FieldType::$tag
            }

            fn into_value(self) -> Value {
                Value::from(self)
            }

            fn from_value(value: Value) -> Option<Self> {
                if is_null(&value) {
                    return None;
                }
                <$ty as sea_query::ValueType>::try_from(value).ok()
            }
        }
    };
}

sea_value_type!(NaiveDate, Date);
sea_value_type!(NaiveTime, Time);
sea_value_type!(NaiveDateTime, DateTime);
sea_value_type!(Uuid, Uuid);
sea_value_type!(Decimal, Decimal);

impl ValueType for serde_json::Value {
    fn field_type() -> FieldType {
        FieldType::Json
    }

    fn into_value(self) -> Value {
        Value::Json(Some(Box::new(self)))
    }

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Json(Some(v)) => Some(*v),
            _ => None,
        }
    }
}

impl<T: ValueType> ValueType for Option<T> {
    fn field_type() -> FieldType {
        T::field_type()
    }

    fn into_value(self) -> Value {
        match self {
            Some(v) => v.into_value(),
            None => T::null_value(),
        }
    }

    fn from_value(value: Value) -> Option<Self> {
        if is_null(&value) {
            Some(None)
        } else {
            T::from_value(value).map(Some)
        }
    }

    fn null_value() -> Value {
        T::null_value()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_type_i32() {
        let value = 42i32.into_value();
        assert!(matches!(value, Value::Int(Some(42))));
        assert_eq!(i32::from_value(Value::Int(Some(42))), Some(42));
        assert_eq!(i32::from_value(Value::Int(None)), None);
    }

    #[test]
    fn test_value_type_string() {
        let value = "hello".to_string().into_value();
        assert!(matches!(value, Value::String(Some(ref s)) if s == "hello"));
        assert_eq!(String::field_type(), FieldType::String);
    }

    #[test]
    fn test_value_type_option_distinguishes_null() {
        assert_eq!(Option::<i64>::from_value(Value::BigInt(None)), Some(None));
        assert_eq!(Option::<i64>::from_value(Value::BigInt(Some(7))), Some(Some(7)));
        assert_eq!(Option::<i64>::from_value(Value::String(Some("x".into()))), None);
        assert!(is_null(&None::<String>.into_value()));
    }

    #[test]
    fn test_value_type_chrono() {
        let date = NaiveDate::from_ymd_opt(2011, 5, 30).expect("valid date");
        let value = date.into_value();
        assert!(!is_null(&value));
        assert_eq!(NaiveDate::from_value(value), Some(date));
    }

    #[test]
    fn test_value_type_json() {
        let doc = serde_json::json!({"a": 1});
        assert_eq!(serde_json::Value::from_value(doc.clone().into_value()), Some(doc));
    }
}
