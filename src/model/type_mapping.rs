//! Type mapping from field types to SQL data types.
//!
//! The data types produced here are dialect-neutral; each dialect converts
//! them when rendering DDL (see [`SqlDialect::convert_sql_type`](crate::dialect::SqlDialect::convert_sql_type)).

use sea_query::Value;

use crate::value::{coerce, EnumType, FieldType};

/// Fallback data type for types outside the table in lenient mode.
pub(crate) const FALLBACK_TYPE: &str = "VARCHAR";

/// Map a field type to its SQL data type.
///
/// Enum fields map by encoding: names become VARCHAR, ordinals and
/// identifiers become INT. Returns `None` for types outside the table.
pub(crate) fn sql_type(field_type: &FieldType, enum_type: Option<EnumType>) -> Option<&'static str> {
    let data_type = match field_type {
        FieldType::Bool => "BOOLEAN",
        FieldType::TinyInt => "TINYINT",
        FieldType::SmallInt => "SMALLINT",
        FieldType::Int => "INT",
        FieldType::BigInt => "BIGINT",
        FieldType::Float => "REAL",
        FieldType::Double => "DOUBLE",
        FieldType::Decimal => "DECIMAL",
        FieldType::String => "VARCHAR",
        FieldType::Bytes => "BLOB",
        FieldType::Date => "DATE",
        FieldType::Time => "TIME",
        FieldType::DateTime => "TIMESTAMP",
        FieldType::Uuid => "UUID",
        FieldType::Json => "JSON",
        FieldType::Enum(_) => match enum_type.unwrap_or_default() {
            EnumType::Name => "VARCHAR",
            EnumType::Ordinal | EnumType::EnumId => "INT",
        },
        FieldType::Other(_) => return None,
    };
    Some(data_type)
}

fn is_quoted(default_value: &str) -> bool {
    default_value.len() >= 2 && default_value.starts_with('\'') && default_value.ends_with('\'')
}

/// Whether a default value is either a quoted literal or an unquoted
/// function/keyword without stray quotes.
pub(crate) fn is_properly_formatted_default_value(default_value: &str) -> bool {
    let trimmed = default_value.trim();
    if trimmed.is_empty() {
        return true;
    }
    is_quoted(trimmed) || !trimmed.contains('\'')
}

/// Whether a default value is acceptable for the field type.
///
/// Quoted literals must parse as the field type. Unquoted numbers must parse
/// as numbers for numeric fields; other unquoted text is taken to be a
/// function or keyword and is not checked.
pub(crate) fn is_valid_default_value(field_type: &FieldType, enum_type: Option<EnumType>, default_value: &str) -> bool {
    let trimmed = default_value.trim();
    if trimmed.is_empty() {
        return true;
    }
    let numeric = matches!(
        field_type,
        FieldType::TinyInt
            | FieldType::SmallInt
            | FieldType::Int
            | FieldType::BigInt
            | FieldType::Float
            | FieldType::Double
            | FieldType::Decimal
    );
    if is_quoted(trimmed) {
        let literal = trimmed[1..trimmed.len() - 1].replace("''", "'");
        return match field_type {
            FieldType::Enum(descriptor) => match enum_type.unwrap_or_default() {
                EnumType::Name => descriptor.ordinal_of(&literal).is_some(),
                _ => literal.trim().parse::<i64>().is_ok(),
            },
            FieldType::String | FieldType::Other(_) | FieldType::Bytes => true,
            other => coerce(Value::String(Some(literal)), other).is_ok(),
        };
    }
    let starts_numeric = trimmed
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_digit() || c == '-' || c == '+' || c == '.');
    if numeric && starts_numeric {
        return coerce(Value::String(Some(trimmed.to_string())), field_type).is_ok();
    }
    true
}
