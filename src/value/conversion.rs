//! Value conversion between model fields and stored column values.
//!
//! Writing applies, in order of precedence: the field's type adapter, enum
//! encoding, string truncation. Reading applies the inverse: the adapter's
//! deserializer, enum decoding, or coercion of the raw driver value to the
//! declared field type. Drivers commonly widen integers to 64 bits and return
//! temporal values as text, so coercion accepts those shapes.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal::Decimal;
use sea_query::Value;
use std::str::FromStr;

use super::enums::{EnumType, EnumValue};
use super::types::{is_null, FieldType, ValueType};
use crate::error::{Result, TideError};
use crate::model::FieldDefinition;

/// A field value on its way to or from storage.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Plain(Value),
    Enum(Option<EnumValue>),
}

impl FieldValue {
    /// Unwrap a plain value into a Rust type.
    pub fn into_typed<T: ValueType>(self, column: &str) -> Result<T> {
        match self {
            FieldValue::Plain(value) => {
                let shown = format!("{value:?}");
                T::from_value(value).ok_or_else(|| {
                    TideError::conversion(column, format!("{shown} is not a {}", T::field_type().type_name()))
                })
            }
            FieldValue::Enum(_) => Err(TideError::conversion(column, "enum value for a non-enum field")),
        }
    }
}

/// Convert a field value to the value bound for its column.
pub fn to_storage<M>(value: FieldValue, field: &FieldDefinition<M>) -> Result<Value> {
    if let Some(adapter) = field.adapter() {
        let plain = match value {
            FieldValue::Plain(v) => v,
            FieldValue::Enum(Some(e)) => Value::String(Some(e.name().to_string())),
            FieldValue::Enum(None) => Value::String(None),
        };
        let mut adapter = adapter
            .lock()
            .map_err(|_| TideError::conversion(&field.column_name, "type adapter lock poisoned"))?;
        return adapter.serialize(plain);
    }
    match value {
        FieldValue::Enum(Some(member)) => member.encode(
            field.enum_type.unwrap_or_default(),
            field.trim_string,
            field.max_length,
            &field.column_name,
        ),
        FieldValue::Enum(None) => Ok(match field.enum_type.unwrap_or_default() {
            EnumType::Name => Value::String(None),
            _ => Value::Int(None),
        }),
        FieldValue::Plain(Value::String(Some(s))) if field.trim_string && field.max_length > 0 => {
            Ok(Value::String(Some(truncate(s, field.max_length))))
        }
        FieldValue::Plain(v) => Ok(v),
    }
}

/// Convert a raw column value back into a field value.
pub fn from_storage<M>(raw: Value, field: &FieldDefinition<M>) -> Result<FieldValue> {
    if let Some(adapter) = field.adapter() {
        let mut adapter = adapter
            .lock()
            .map_err(|_| TideError::conversion(&field.column_name, "type adapter lock poisoned"))?;
        let value = adapter.deserialize(raw)?;
        return match field.field_type {
            FieldType::Enum(descriptor) => {
                EnumValue::decode(descriptor, EnumType::Name, &value).map(FieldValue::Enum)
            }
            _ => Ok(FieldValue::Plain(value)),
        };
    }
    if let FieldType::Enum(descriptor) = field.field_type {
        let encoding = field.enum_type.unwrap_or_default();
        return EnumValue::decode(descriptor, encoding, &raw).map(FieldValue::Enum);
    }
    coerce(raw, &field.field_type)
        .map(FieldValue::Plain)
        .map_err(|message| TideError::conversion(&field.column_name, message))
}

fn truncate(s: String, max_length: usize) -> String {
    if s.chars().count() > max_length {
        s.chars().take(max_length).collect()
    } else {
        s
    }
}

/// Integer payload of any integral variant.
pub(crate) fn as_i64(value: &Value) -> Option<i64> {
    match value {
        Value::TinyInt(Some(v)) => Some(i64::from(*v)),
        Value::SmallInt(Some(v)) => Some(i64::from(*v)),
        Value::Int(Some(v)) => Some(i64::from(*v)),
        Value::BigInt(Some(v)) => Some(*v),
        Value::TinyUnsigned(Some(v)) => Some(i64::from(*v)),
        Value::SmallUnsigned(Some(v)) => Some(i64::from(*v)),
        Value::Unsigned(Some(v)) => Some(i64::from(*v)),
        Value::BigUnsigned(Some(v)) => i64::try_from(*v).ok(),
        Value::Bool(Some(b)) => Some(i64::from(*b)),
        Value::String(Some(s)) => s.trim().parse().ok(),
        _ => None,
    }
}

fn as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Float(Some(v)) => Some(f64::from(*v)),
        Value::Double(Some(v)) => Some(*v),
        Value::String(Some(s)) => s.trim().parse().ok(),
        other => as_i64(other).map(|v| v as f64),
    }
}

fn as_text(value: &Value) -> Option<String> {
    match value {
        Value::String(Some(s)) => Some(s.clone()),
        Value::Char(Some(c)) => Some(c.to_string()),
        _ => None,
    }
}

fn parse_datetime(text: &str) -> Option<NaiveDateTime> {
    const FORMATS: [&str; 4] = [
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S",
    ];
    FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
}

fn ranged<T: TryFrom<i64>>(value: &Value, target: &FieldType) -> std::result::Result<T, String> {
    let wide = as_i64(value).ok_or_else(|| format!("{value:?} is not an integer"))?;
    T::try_from(wide).map_err(|_| format!("{wide} is out of range for {}", target.type_name()))
}

/// Coerce a raw driver value into the variant the field type expects.
pub fn coerce(value: Value, target: &FieldType) -> std::result::Result<Value, String> {
    if is_null(&value) {
        return Ok(target.null_value());
    }
    let shown = format!("cannot read {value:?} as {}", target.type_name());
    let mismatch = || shown.clone();
    let coerced = match target {
        FieldType::Bool => match &value {
            Value::Bool(Some(b)) => Value::Bool(Some(*b)),
            Value::String(Some(s)) => match s.trim().to_ascii_lowercase().as_str() {
                "true" | "t" | "1" | "y" | "yes" => Value::Bool(Some(true)),
                "false" | "f" | "0" | "n" | "no" => Value::Bool(Some(false)),
                _ => return Err(mismatch()),
            },
            other => Value::Bool(Some(as_i64(other).ok_or_else(mismatch)? != 0)),
        },
        FieldType::TinyInt => Value::TinyInt(Some(ranged::<i8>(&value, target)?)),
        FieldType::SmallInt => Value::SmallInt(Some(ranged::<i16>(&value, target)?)),
        FieldType::Int => Value::Int(Some(ranged::<i32>(&value, target)?)),
        FieldType::BigInt => Value::BigInt(Some(ranged::<i64>(&value, target)?)),
        FieldType::Float => Value::Float(Some(as_f64(&value).ok_or_else(mismatch)? as f32)),
        FieldType::Double => Value::Double(Some(as_f64(&value).ok_or_else(mismatch)?)),
        FieldType::Decimal => {
            if matches!(value, Value::Decimal(_)) {
                value
            } else if let Some(text) = as_text(&value) {
                Value::from(Decimal::from_str(text.trim()).map_err(|e| e.to_string())?)
            } else if let Value::Double(Some(d)) = value {
                Value::from(Decimal::from_str(&d.to_string()).map_err(|e| e.to_string())?)
            } else {
                Value::from(Decimal::from(as_i64(&value).ok_or_else(mismatch)?))
            }
        }
        FieldType::String | FieldType::Other(_) => match value {
            Value::String(s) => Value::String(s),
            Value::Char(Some(c)) => Value::String(Some(c.to_string())),
            Value::Double(Some(d)) => Value::String(Some(d.to_string())),
            Value::Bytes(Some(b)) => Value::String(Some(String::from_utf8(b).map_err(|e| e.to_string())?)),
            other => Value::String(Some(as_i64(&other).ok_or_else(mismatch)?.to_string())),
        },
        FieldType::Bytes => match value {
            Value::Bytes(_) => value,
            Value::String(Some(s)) => Value::Bytes(Some(s.into_bytes())),
            _ => return Err(mismatch()),
        },
        FieldType::Date => {
            if matches!(value, Value::ChronoDate(_)) {
                value
            } else if let Some(text) = as_text(&value) {
                let date = NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d")
                    .ok()
                    .or_else(|| parse_datetime(text.trim()).map(|dt| dt.date()))
                    .ok_or_else(mismatch)?;
                Value::from(date)
            } else {
                return Err(mismatch());
            }
        }
        FieldType::Time => {
            if matches!(value, Value::ChronoTime(_)) {
                value
            } else if let Some(text) = as_text(&value) {
                let time = NaiveTime::parse_from_str(text.trim(), "%H:%M:%S%.f")
                    .or_else(|_| NaiveTime::parse_from_str(text.trim(), "%H:%M:%S"))
                    .map_err(|e| e.to_string())?;
                Value::from(time)
            } else {
                return Err(mismatch());
            }
        }
        FieldType::DateTime => {
            if matches!(value, Value::ChronoDateTime(_)) {
                value
            } else if let Some(text) = as_text(&value) {
                Value::from(parse_datetime(text.trim()).ok_or_else(mismatch)?)
            } else {
                return Err(mismatch());
            }
        }
        FieldType::Uuid => {
            if matches!(value, Value::Uuid(_)) {
                value
            } else if let Some(text) = as_text(&value) {
                Value::from(uuid::Uuid::parse_str(text.trim()).map_err(|e| e.to_string())?)
            } else if let Value::Bytes(Some(b)) = &value {
                Value::from(uuid::Uuid::from_slice(b).map_err(|e| e.to_string())?)
            } else {
                return Err(mismatch());
            }
        }
        FieldType::Json => match value {
            Value::Json(_) => value,
            Value::String(Some(s)) => {
                Value::Json(Some(Box::new(serde_json::from_str(&s).map_err(|e| e.to_string())?)))
            }
            _ => return Err(mismatch()),
        },
        FieldType::Enum(_) => value,
    };
    Ok(coerced)
}
