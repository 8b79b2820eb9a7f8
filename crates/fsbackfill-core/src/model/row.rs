use super::document::FieldValue;
use chrono::{DateTime, Utc};

/// A scalar destination value
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Timestamp(DateTime<Utc>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn text(s: impl Into<String>) -> Self {
        Value::Text(s.into())
    }

    /// Convert an optional source field, with absence mapping to `Null`
    pub fn from_field(field: Option<&FieldValue>) -> Self {
        field.map(Value::from).unwrap_or(Value::Null)
    }

    /// Short name of the variant, used in type-mismatch messages
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Text(_) => "text",
            Value::Timestamp(_) => "timestamp",
        }
    }
}

impl From<&FieldValue> for Value {
    fn from(field: &FieldValue) -> Self {
        match field {
            FieldValue::Null => Value::Null,
            FieldValue::Boolean(b) => Value::Bool(*b),
            FieldValue::Integer(i) => Value::Int(*i),
            FieldValue::Double(d) => Value::Float(*d),
            FieldValue::Timestamp(ts) => Value::Timestamp(*ts),
            FieldValue::String(s) => Value::Text(s.clone()),
            FieldValue::Reference(r) => Value::Text(r.clone()),
            FieldValue::Bytes(_)
            | FieldValue::GeoPoint { .. }
            | FieldValue::Array(_)
            | FieldValue::Map(_) => match field.to_json() {
                serde_json::Value::String(s) => Value::Text(s),
                other => Value::Text(other.to_string()),
            },
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

/// Ordered destination values, aligned 1:1 with a table's column list
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Row(Vec<Value>);

impl Row {
    pub fn new(values: Vec<Value>) -> Self {
        Self(values)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn values(&self) -> &[Value] {
        &self.0
    }

    pub fn get(&self, index: usize) -> Option<&Value> {
        self.0.get(index)
    }

    pub fn into_values(self) -> Vec<Value> {
        self.0
    }
}

impl From<Vec<Value>> for Row {
    fn from(values: Vec<Value>) -> Self {
        Self(values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn test_absent_field_is_null() {
        assert_eq!(Value::from_field(None), Value::Null);
    }

    #[test]
    fn test_scalar_conversions() {
        assert_eq!(Value::from(&FieldValue::Integer(7)), Value::Int(7));
        assert_eq!(Value::from(&FieldValue::Boolean(false)), Value::Bool(false));
        assert_eq!(
            Value::from(&FieldValue::Reference("projects/p/x".into())),
            Value::text("projects/p/x")
        );
    }

    #[test]
    fn test_map_becomes_json_text() {
        let mut fields = BTreeMap::new();
        fields.insert("zip".to_string(), FieldValue::String("02139".into()));
        let value = Value::from(&FieldValue::Map(fields));
        assert_eq!(value, Value::text(r#"{"zip":"02139"}"#));
    }

    #[test]
    fn test_bytes_become_base64_text() {
        let value = Value::from(&FieldValue::Bytes(b"hi".to_vec()));
        assert_eq!(value, Value::text("aGk="));
    }
}
