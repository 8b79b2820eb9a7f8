use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

/// A value held by a source document field
///
/// Mirrors the value kinds a Firestore document can hold.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Null,
    Boolean(bool),
    Integer(i64),
    Double(f64),
    Timestamp(DateTime<Utc>),
    String(String),
    Bytes(Vec<u8>),
    /// Full resource name of another document
    Reference(String),
    GeoPoint {
        latitude: f64,
        longitude: f64,
    },
    Array(Vec<FieldValue>),
    Map(BTreeMap<String, FieldValue>),
}

impl FieldValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }

    /// JSON rendering used when a composite value lands in a text column
    pub fn to_json(&self) -> serde_json::Value {
        use base64::Engine;
        use serde_json::{json, Value};

        match self {
            FieldValue::Null => Value::Null,
            FieldValue::Boolean(b) => Value::Bool(*b),
            FieldValue::Integer(i) => json!(i),
            FieldValue::Double(d) => json!(d),
            FieldValue::Timestamp(ts) => Value::String(ts.to_rfc3339()),
            FieldValue::String(s) => Value::String(s.clone()),
            FieldValue::Bytes(b) => {
                Value::String(base64::engine::general_purpose::STANDARD.encode(b))
            }
            FieldValue::Reference(r) => Value::String(r.clone()),
            FieldValue::GeoPoint {
                latitude,
                longitude,
            } => json!({ "latitude": latitude, "longitude": longitude }),
            FieldValue::Array(items) => Value::Array(items.iter().map(Self::to_json).collect()),
            FieldValue::Map(fields) => Value::Object(
                fields
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
        }
    }
}

/// A read-only source document
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    /// Stable identifier, unique within its collection
    pub id: String,
    pub fields: BTreeMap<String, FieldValue>,
    pub create_time: Option<DateTime<Utc>>,
    pub update_time: Option<DateTime<Utc>>,
}

impl Document {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            fields: BTreeMap::new(),
            create_time: None,
            update_time: None,
        }
    }

    /// Builder-style field setter, mostly for fixtures
    pub fn with_field(mut self, name: impl Into<String>, value: FieldValue) -> Self {
        self.fields.insert(name.into(), value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }
}
