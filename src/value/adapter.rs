//! Pluggable serialize/deserialize adapters.
//!
//! An adapter maps a field's application value to a storage value and back.
//! Adapters are created once per field when the table definition is built and
//! reused for every statement afterwards. They take `&mut self`, so an adapter
//! need not be safe for concurrent reuse; the table definition keeps each one
//! behind its own lock.

use sea_query::Value;

use crate::error::{Result, TideError};

/// Serializer/deserializer between an application value and its stored form.
pub trait TypeAdapter: Send {
    /// SQL data type of the storage column.
    fn data_type(&self) -> &str;

    fn serialize(&mut self, value: Value) -> Result<Value>;

    fn deserialize(&mut self, value: Value) -> Result<Value>;
}

/// Creates a fresh adapter instance for one field.
pub type AdapterFactory = fn() -> Box<dyn TypeAdapter>;

/// Stores JSON documents as text.
#[derive(Debug, Default)]
pub struct JsonTextAdapter;

impl JsonTextAdapter {
    pub fn boxed() -> Box<dyn TypeAdapter> {
        Box::new(JsonTextAdapter)
    }
}

impl TypeAdapter for JsonTextAdapter {
    fn data_type(&self) -> &str {
        "TEXT"
    }

    fn serialize(&mut self, value: Value) -> Result<Value> {
        match value {
            Value::Json(Some(doc)) => serde_json::to_string(&*doc)
                .map(|s| Value::String(Some(s)))
                .map_err(|e| TideError::conversion("json", e.to_string())),
            Value::Json(None) => Ok(Value::String(None)),
            other => Err(TideError::conversion("json", format!("expected a JSON value, got {other:?}"))),
        }
    }

    fn deserialize(&mut self, value: Value) -> Result<Value> {
        match value {
            Value::String(Some(text)) => serde_json::from_str(&text)
                .map(|doc| Value::Json(Some(Box::new(doc))))
                .map_err(|e| TideError::conversion("json", e.to_string())),
            Value::String(None) => Ok(Value::Json(None)),
            other => Err(TideError::conversion("json", format!("expected text, got {other:?}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_text_adapter_round_trip() {
        let mut adapter = JsonTextAdapter;
        let doc = serde_json::json!({"tags": ["a", "b"], "n": 3});
        let stored = adapter.serialize(Value::Json(Some(Box::new(doc.clone())))).unwrap();
        assert!(matches!(stored, Value::String(Some(_))));
        let restored = adapter.deserialize(stored).unwrap();
        assert_eq!(restored, Value::Json(Some(Box::new(doc))));
    }

    #[test]
    fn test_json_text_adapter_rejects_non_json() {
        let mut adapter = JsonTextAdapter;
        assert!(adapter.serialize(Value::Int(Some(1))).is_err());
        assert!(adapter.deserialize(Value::String(Some("{oops".into()))).is_err());
    }
}
