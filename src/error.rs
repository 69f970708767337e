//! Error types for mapping, statement synthesis and session operations.
//!
//! Every failure carries a stable [`ErrorCode`] so callers can branch on the
//! case without matching message text.

use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, TideError>;

/// Stable numeric codes for each error case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum ErrorCode {
    UnmappedField = 1,
    DuplicateKey = 2,
    UnsupportedType = 3,
    MissingEnumId = 4,
    UnknownEnumValue = 5,
    DuplicateColumn = 6,
    DuplicateIndex = 7,
    NoPrimaryKey = 8,
    UnknownColumn = 9,
    UnresolvableField = 10,
    Conversion = 11,
    TableNotFound = 12,
    UpgradeFailed = 13,
    Execution = 14,
    Config = 15,
}

impl ErrorCode {
    /// Numeric value of the code.
    pub fn as_u16(self) -> u16 {
        self as u16
    }
}

/// Error type for tidemark operations
#[derive(Debug, Error)]
pub enum TideError {
    /// A field was referenced in a query but is not part of the table mapping
    #[error("field '{field}' of {table} is not mapped to a column")]
    UnmappedField { table: String, field: String },

    /// Strict type mapping rejected a field type
    #[error("unsupported type {type_name} for field '{field}' of {table}")]
    UnsupportedType {
        table: String,
        field: String,
        type_name: String,
    },

    /// Identifier encoding requested for an enum member that has no identifier
    #[error("enum {enum_name} does not supply an identifier for member {member} (field '{field}')")]
    MissingEnumId {
        field: String,
        enum_name: String,
        member: String,
    },

    /// A stored value does not decode to any member of the enum
    #[error("value {value} does not match any member of enum {enum_name}")]
    UnknownEnumValue { enum_name: String, value: String },

    /// Insert violated the stored primary key or a unique index
    #[error("duplicate key: {0}")]
    DuplicateKey(String),

    /// Two fields resolved to the same column name
    #[error("duplicate column '{column}' in {table}")]
    DuplicateColumn { table: String, column: String },

    /// Two indexes share a name
    #[error("duplicate index '{index}' on {table}")]
    DuplicateIndex { table: String, index: String },

    /// Update, delete or merge attempted on a table without primary key columns
    #[error("no primary key columns defined for {table} - {operation} not possible")]
    NoPrimaryKey { table: String, operation: &'static str },

    /// Primary key or index references a column that is not mapped
    #[error("column '{column}' referenced by {context} is not mapped in {table}")]
    UnknownColumn {
        table: String,
        column: String,
        context: &'static str,
    },

    /// A field handle does not belong to the active alias
    #[error("field handle cannot be resolved against the active alias of {table}")]
    UnresolvableField { table: String },

    /// A value could not be converted to or from its storage representation
    #[error("cannot convert value for column '{column}': {message}")]
    Conversion { column: String, message: String },

    /// The target table does not exist
    #[error("table not found: {0}")]
    TableNotFound(String),

    /// The registered upgrader reported failure
    #[error("upgrade of {table} from version {from} to {to} failed")]
    UpgradeFailed { table: String, from: i32, to: i32 },

    /// Error reported by the execution layer
    #[error("execution error: {0}")]
    Execution(String),

    /// Configuration could not be loaded
    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),
}

impl TideError {
    /// The stable code identifying this case.
    pub fn code(&self) -> ErrorCode {
        match self {
            TideError::UnmappedField { .. } => ErrorCode::UnmappedField,
            TideError::UnsupportedType { .. } => ErrorCode::UnsupportedType,
            TideError::MissingEnumId { .. } => ErrorCode::MissingEnumId,
            TideError::UnknownEnumValue { .. } => ErrorCode::UnknownEnumValue,
            TideError::DuplicateKey(_) => ErrorCode::DuplicateKey,
            TideError::DuplicateColumn { .. } => ErrorCode::DuplicateColumn,
            TideError::DuplicateIndex { .. } => ErrorCode::DuplicateIndex,
            TideError::NoPrimaryKey { .. } => ErrorCode::NoPrimaryKey,
            TideError::UnknownColumn { .. } => ErrorCode::UnknownColumn,
            TideError::UnresolvableField { .. } => ErrorCode::UnresolvableField,
            TideError::Conversion { .. } => ErrorCode::Conversion,
            TideError::TableNotFound(_) => ErrorCode::TableNotFound,
            TideError::UpgradeFailed { .. } => ErrorCode::UpgradeFailed,
            TideError::Execution(_) => ErrorCode::Execution,
            TideError::Config(_) => ErrorCode::Config,
        }
    }

    pub(crate) fn conversion(column: &str, message: impl Into<String>) -> Self {
        TideError::Conversion {
            column: column.to_string(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_stable() {
        assert_eq!(ErrorCode::UnmappedField.as_u16(), 1);
        assert_eq!(ErrorCode::DuplicateKey.as_u16(), 2);
        let err = TideError::DuplicateKey("PRODUCT.ID".to_string());
        assert_eq!(err.code(), ErrorCode::DuplicateKey);
    }

    #[test]
    fn test_display_format() {
        let err = TideError::NoPrimaryKey {
            table: "Note".to_string(),
            operation: "update",
        };
        let display = err.to_string();
        assert!(display.contains("no primary key"));
        assert!(display.contains("update"));
    }
}
