//! Column-type coercion
//!
//! Both sinks run every row through [`coerce_row`] before storing it, so a
//! dry run rejects the same values the database would.

use super::row::{Row, Value};
use super::table::{Column, SqlType, TableSpec};
use crate::errors::CoerceError;
use chrono::{DateTime, Utc};

/// A value converted to its column's declared type; nulls keep the type
#[derive(Debug, Clone, PartialEq)]
pub enum TypedValue {
    Text(Option<String>),
    Bool(Option<bool>),
    BigInt(Option<i64>),
    Double(Option<f64>),
    Timestamptz(Option<DateTime<Utc>>),
}

impl TypedValue {
    pub fn null(ty: SqlType) -> Self {
        match ty {
            SqlType::Text => TypedValue::Text(None),
            SqlType::Boolean => TypedValue::Bool(None),
            SqlType::BigInt => TypedValue::BigInt(None),
            SqlType::Double => TypedValue::Double(None),
            SqlType::Timestamptz => TypedValue::Timestamptz(None),
        }
    }
}

/// Coerce a whole row against the table's columns
pub fn coerce_row(table: &TableSpec, row: &Row) -> Result<Vec<TypedValue>, CoerceError> {
    if row.len() != table.columns.len() {
        return Err(CoerceError::Arity {
            table: table.name.clone(),
            expected: table.columns.len(),
            actual: row.len(),
        });
    }
    table
        .columns
        .iter()
        .zip(row.values())
        .map(|(column, value)| coerce(column, value))
        .collect()
}

pub fn coerce(column: &Column, value: &Value) -> Result<TypedValue, CoerceError> {
    if value.is_null() {
        return Ok(TypedValue::null(column.ty));
    }

    let typed = match (column.ty, value) {
        (SqlType::Text, v) => Some(TypedValue::Text(Some(render_text(v)))),

        (SqlType::Boolean, Value::Bool(b)) => Some(TypedValue::Bool(Some(*b))),

        (SqlType::BigInt, Value::Int(i)) => Some(TypedValue::BigInt(Some(*i))),
        (SqlType::BigInt, Value::Text(s)) => {
            s.trim().parse().ok().map(|i| TypedValue::BigInt(Some(i)))
        }

        (SqlType::Double, Value::Float(f)) => Some(TypedValue::Double(Some(*f))),
        (SqlType::Double, Value::Int(i)) => Some(TypedValue::Double(Some(*i as f64))),
        (SqlType::Double, Value::Text(s)) => {
            s.trim().parse().ok().map(|f| TypedValue::Double(Some(f)))
        }

        (SqlType::Timestamptz, Value::Timestamp(ts)) => Some(TypedValue::Timestamptz(Some(*ts))),
        (SqlType::Timestamptz, Value::Text(s)) => DateTime::parse_from_rfc3339(s.trim())
            .ok()
            .map(|ts| TypedValue::Timestamptz(Some(ts.with_timezone(&Utc)))),

        _ => None,
    };

    typed.ok_or_else(|| CoerceError::Mismatch {
        column: column.name.clone(),
        expected: column.ty,
        actual: value.type_name(),
        value: format!("{value:?}"),
    })
}

fn render_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Int(i) => i.to_string(),
        Value::Float(f) => f.to_string(),
        Value::Text(s) => s.clone(),
        Value::Timestamp(ts) => ts.to_rfc3339(),
    }
}
