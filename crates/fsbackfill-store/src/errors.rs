//! PostgreSQL sink errors and their classification

use fsbackfill_core::{BfError, BfErrorKind, CoerceError};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("cannot connect to PostgreSQL at {host}:{port}/{database}: {source}")]
    Connect {
        host: String,
        port: u16,
        database: String,
        #[source]
        source: sqlx::Error,
    },

    #[error("insert into {table} failed: {source}")]
    Query {
        table: String,
        #[source]
        source: sqlx::Error,
    },

    #[error(transparent)]
    Coerce(#[from] CoerceError),

    #[error("insert into {table} affected {rows} rows")]
    UnexpectedRowCount { table: String, rows: u64 },

    #[error("unknown SSL mode {0:?}")]
    InvalidSslMode(String),
}

impl StoreError {
    pub fn kind(&self) -> BfErrorKind {
        match self {
            StoreError::Connect { .. } => BfErrorKind::SinkUnavailable,
            StoreError::Query { source, .. } => classify(source),
            StoreError::Coerce(CoerceError::Mismatch { .. }) => BfErrorKind::TypeMismatch,
            StoreError::Coerce(CoerceError::Arity { .. }) => BfErrorKind::ColumnMismatch,
            StoreError::UnexpectedRowCount { .. } => BfErrorKind::Internal,
            StoreError::InvalidSslMode(_) => BfErrorKind::InvalidConfig,
        }
    }
}

impl From<StoreError> for BfError {
    fn from(err: StoreError) -> Self {
        BfError::new(err.kind())
            .with_op("pg_sink")
            .with_message(err.to_string())
    }
}

/// Map a driver error onto the error taxonomy
pub fn classify(err: &sqlx::Error) -> BfErrorKind {
    match err {
        sqlx::Error::Database(db) => db
            .code()
            .map_or(BfErrorKind::Persistence, |code| classify_sqlstate(&code)),
        sqlx::Error::Io(_)
        | sqlx::Error::Tls(_)
        | sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed
        | sqlx::Error::WorkerCrashed => BfErrorKind::SinkUnavailable,
        _ => BfErrorKind::Persistence,
    }
}

/// Classify by SQLSTATE class (the first two characters)
pub fn classify_sqlstate(code: &str) -> BfErrorKind {
    match code.get(..2) {
        Some("23") => BfErrorKind::ConstraintViolation,
        Some("22") => BfErrorKind::TypeMismatch,
        Some("42") => BfErrorKind::Schema,
        Some("08") => BfErrorKind::SinkUnavailable,
        _ => BfErrorKind::Persistence,
    }
}
