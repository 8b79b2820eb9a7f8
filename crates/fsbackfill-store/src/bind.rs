//! Parameter binding
//!
//! Every parameter is bound with the Rust type matching its column's
//! declared `SqlType`, nulls included. Binding a null as an untyped text
//! parameter makes PostgreSQL reject it for boolean or timestamptz columns.

use fsbackfill_core::TypedValue;
use sqlx::postgres::PgArguments;
use sqlx::query::Query;
use sqlx::Postgres;

pub fn bind_all<'q>(
    mut query: Query<'q, Postgres, PgArguments>,
    values: Vec<TypedValue>,
) -> Query<'q, Postgres, PgArguments> {
    for value in values {
        query = match value {
            TypedValue::Text(v) => query.bind(v),
            TypedValue::Bool(v) => query.bind(v),
            TypedValue::BigInt(v) => query.bind(v),
            TypedValue::Double(v) => query.bind(v),
            TypedValue::Timestamptz(v) => query.bind(v),
        };
    }
    query
}
