//! Data model: source documents, destination rows, table metadata

pub mod coerce;
pub mod document;
pub mod row;
pub mod table;

pub use coerce::{coerce, coerce_row, TypedValue};
pub use document::{Document, FieldValue};
pub use row::{Row, Value};
pub use table::{Column, SqlType, TableSpec};
