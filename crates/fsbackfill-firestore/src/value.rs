//! Firestore REST wire format
//!
//! Documents arrive as `{"name": ..., "fields": {...}}` where every field is
//! a single-key object naming its kind (`{"integerValue": "42"}`).

use crate::errors::{FirestoreError, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::{DateTime, Utc};
use fsbackfill_core::{Document, FieldValue};
use serde::de::IgnoredAny;
use serde::Deserialize;
use std::collections::BTreeMap;

/// One page of `documents.list`
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListDocumentsResponse {
    #[serde(default)]
    pub documents: Vec<RestDocument>,
    pub next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RestDocument {
    pub name: String,
    #[serde(default)]
    pub fields: BTreeMap<String, RestValue>,
    pub create_time: Option<String>,
    pub update_time: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RestValue {
    NullValue(IgnoredAny),
    BooleanValue(bool),
    /// int64 is sent as a JSON string
    IntegerValue(serde_json::Value),
    /// A number, or one of `"NaN"`, `"Infinity"`, `"-Infinity"`
    DoubleValue(serde_json::Value),
    TimestampValue(String),
    StringValue(String),
    BytesValue(String),
    ReferenceValue(String),
    GeoPointValue(RestGeoPoint),
    ArrayValue(RestArray),
    MapValue(RestMap),
}

/// Zero coordinates are omitted on the wire
#[derive(Debug, Default, Deserialize)]
pub struct RestGeoPoint {
    #[serde(default)]
    pub latitude: f64,
    #[serde(default)]
    pub longitude: f64,
}

#[derive(Debug, Default, Deserialize)]
pub struct RestArray {
    #[serde(default)]
    pub values: Vec<RestValue>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RestMap {
    #[serde(default)]
    pub fields: BTreeMap<String, RestValue>,
}

/// Parse a raw `documents.list` body
pub fn parse_page(body: &str, collection: &str) -> Result<ListDocumentsResponse> {
    serde_json::from_str(body).map_err(|e| FirestoreError::Decode {
        document: format!("{collection} (page)"),
        reason: e.to_string(),
    })
}

impl RestDocument {
    /// The document id is the last segment of the resource name
    pub fn id(&self) -> &str {
        self.name.rsplit('/').next().unwrap_or(&self.name)
    }

    pub fn into_document(self) -> Result<Document> {
        let id = self.id().to_string();
        if id.is_empty() {
            return Err(decode_error(&self.name, "empty document id"));
        }

        let name = self.name;
        let create_time = self
            .create_time
            .as_deref()
            .map(|t| parse_timestamp(&name, t))
            .transpose()?;
        let update_time = self
            .update_time
            .as_deref()
            .map(|t| parse_timestamp(&name, t))
            .transpose()?;
        let fields = decode_fields(&name, self.fields)?;

        Ok(Document {
            id,
            fields,
            create_time,
            update_time,
        })
    }
}

fn decode_fields(
    document: &str,
    fields: BTreeMap<String, RestValue>,
) -> Result<BTreeMap<String, FieldValue>> {
    fields
        .into_iter()
        .map(|(k, v)| Ok((k, decode_value(document, v)?)))
        .collect()
}

fn decode_value(document: &str, value: RestValue) -> Result<FieldValue> {
    Ok(match value {
        RestValue::NullValue(_) => FieldValue::Null,
        RestValue::BooleanValue(b) => FieldValue::Boolean(b),
        RestValue::IntegerValue(raw) => FieldValue::Integer(parse_integer(document, &raw)?),
        RestValue::DoubleValue(raw) => FieldValue::Double(parse_double(document, &raw)?),
        RestValue::TimestampValue(ts) => FieldValue::Timestamp(parse_timestamp(document, &ts)?),
        RestValue::StringValue(s) => FieldValue::String(s),
        RestValue::BytesValue(b64) => FieldValue::Bytes(
            STANDARD
                .decode(b64)
                .map_err(|e| decode_error(document, format!("bytesValue: {e}")))?,
        ),
        RestValue::ReferenceValue(r) => FieldValue::Reference(r),
        RestValue::GeoPointValue(p) => FieldValue::GeoPoint {
            latitude: p.latitude,
            longitude: p.longitude,
        },
        RestValue::ArrayValue(a) => FieldValue::Array(
            a.values
                .into_iter()
                .map(|v| decode_value(document, v))
                .collect::<Result<_>>()?,
        ),
        RestValue::MapValue(m) => FieldValue::Map(decode_fields(document, m.fields)?),
    })
}

fn parse_integer(document: &str, raw: &serde_json::Value) -> Result<i64> {
    let parsed = match raw {
        serde_json::Value::String(s) => s.parse().ok(),
        serde_json::Value::Number(n) => n.as_i64(),
        _ => None,
    };
    parsed.ok_or_else(|| decode_error(document, format!("integerValue {raw}")))
}

fn parse_double(document: &str, raw: &serde_json::Value) -> Result<f64> {
    let parsed = match raw {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => match s.as_str() {
            "NaN" => Some(f64::NAN),
            "Infinity" => Some(f64::INFINITY),
            "-Infinity" => Some(f64::NEG_INFINITY),
            other => other.parse().ok(),
        },
        _ => None,
    };
    parsed.ok_or_else(|| decode_error(document, format!("doubleValue {raw}")))
}

fn parse_timestamp(document: &str, raw: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| decode_error(document, format!("timestamp {raw:?}: {e}")))
}

fn decode_error(document: &str, reason: impl Into<String>) -> FirestoreError {
    FirestoreError::Decode {
        document: document.to_string(),
        reason: reason.into(),
    }
}
