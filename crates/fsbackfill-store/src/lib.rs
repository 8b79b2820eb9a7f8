//! PostgreSQL sink
//!
//! One `INSERT ... ON CONFLICT DO NOTHING` per row, parameters typed by the
//! destination column.

pub mod bind;
pub mod errors;
pub mod sink;
pub mod sql;

pub use errors::StoreError;
pub use sink::{parse_ssl_mode, PgSink, SinkSettings, DEFAULT_MAX_CONNECTIONS};
pub use sqlx::postgres::PgSslMode;
