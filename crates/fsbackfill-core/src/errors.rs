use crate::model::SqlType;
use thiserror::Error;

/// Result type alias using BfError
pub type Result<T> = std::result::Result<T, BfError>;

// ========== Error Facility ==========

/// Canonical error kind taxonomy
///
/// Each kind maps to a stable code that shows up in log lines and in the
/// run report, so an operator can grep a failed run for one class of problem.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BfErrorKind {
    // Configuration
    InvalidConfig,
    MissingMapping,
    DuplicateMapping,

    // Row shape
    ColumnMismatch,
    MissingIdentity,
    TypeMismatch,

    // Sink statement failures
    ConstraintViolation,
    Schema,

    // Connectivity
    Auth,
    SourceUnavailable,
    SinkUnavailable,

    // Integration/IO
    Persistence,
    Serialization,
    Io,

    // Internal
    Internal,
}

impl BfErrorKind {
    /// Get the stable error code for this kind
    pub fn code(&self) -> &'static str {
        match self {
            BfErrorKind::InvalidConfig => "ERR_INVALID_CONFIG",
            BfErrorKind::MissingMapping => "ERR_MISSING_MAPPING",
            BfErrorKind::DuplicateMapping => "ERR_DUPLICATE_MAPPING",
            BfErrorKind::ColumnMismatch => "ERR_COLUMN_MISMATCH",
            BfErrorKind::MissingIdentity => "ERR_MISSING_IDENTITY",
            BfErrorKind::TypeMismatch => "ERR_TYPE_MISMATCH",
            BfErrorKind::ConstraintViolation => "ERR_CONSTRAINT_VIOLATION",
            BfErrorKind::Schema => "ERR_SCHEMA",
            BfErrorKind::Auth => "ERR_AUTH",
            BfErrorKind::SourceUnavailable => "ERR_SOURCE_UNAVAILABLE",
            BfErrorKind::SinkUnavailable => "ERR_SINK_UNAVAILABLE",
            BfErrorKind::Persistence => "ERR_PERSISTENCE",
            BfErrorKind::Serialization => "ERR_SERIALIZATION",
            BfErrorKind::Io => "ERR_IO",
            BfErrorKind::Internal => "ERR_INTERNAL",
        }
    }
}

/// Canonical structured error type
///
/// Carries a classification plus the backfill context (operation,
/// collection, document id) needed to retry a failed row by hand.
#[derive(Debug, Clone)]
pub struct BfError {
    kind: BfErrorKind,
    op: Option<String>,
    collection: Option<String>,
    doc_id: Option<String>,
    message: String,
}

impl BfError {
    /// Create a new error with the specified kind
    pub fn new(kind: BfErrorKind) -> Self {
        Self {
            kind,
            op: None,
            collection: None,
            doc_id: None,
            message: String::new(),
        }
    }

    /// Add operation context
    pub fn with_op(mut self, op: impl Into<String>) -> Self {
        self.op = Some(op.into());
        self
    }

    /// Add collection context
    pub fn with_collection(mut self, collection: impl Into<String>) -> Self {
        self.collection = Some(collection.into());
        self
    }

    /// Add source document context
    pub fn with_doc_id(mut self, doc_id: impl Into<String>) -> Self {
        self.doc_id = Some(doc_id.into());
        self
    }

    /// Add custom message
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    pub fn kind(&self) -> BfErrorKind {
        self.kind
    }

    /// Get the stable error code
    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    pub fn op(&self) -> Option<&str> {
        self.op.as_deref()
    }

    pub fn collection(&self) -> Option<&str> {
        self.collection.as_deref()
    }

    pub fn doc_id(&self) -> Option<&str> {
        self.doc_id.as_deref()
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl std::fmt::Display for BfError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]", self.code())?;
        if let Some(op) = &self.op {
            write!(f, " in operation '{}'", op)?;
        }
        if !self.message.is_empty() {
            write!(f, ": {}", self.message)?;
        }
        if let Some(collection) = &self.collection {
            write!(f, " (collection: {})", collection)?;
        }
        if let Some(doc_id) = &self.doc_id {
            write!(f, " (doc_id: {})", doc_id)?;
        }
        Ok(())
    }
}

impl std::error::Error for BfError {}

// ========== End Error Facility ==========

/// Failures detected while turning a document into a row
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MappingError {
    /// Mapper produced a row whose width differs from the table's column list
    #[error("row has {actual} values but table {table} declares {expected} columns")]
    ColumnCountMismatch {
        table: String,
        expected: usize,
        actual: usize,
    },

    /// The conflict column is null, so the row has no stable identity
    #[error("conflict column {column} of table {table} is null")]
    MissingIdentity { table: String, column: String },

    /// Conflict column named in table metadata is not in its column list
    #[error("conflict column {column} is not declared by table {table}")]
    UnknownConflictColumn { table: String, column: String },

    /// Two mappings registered for the same collection
    #[error("collection {collection} is registered more than once")]
    DuplicateCollection { collection: String },
}

impl From<MappingError> for BfError {
    fn from(err: MappingError) -> Self {
        let message = err.to_string();
        match err {
            MappingError::ColumnCountMismatch { .. } => {
                BfError::new(BfErrorKind::ColumnMismatch).with_op("map_row")
            }
            MappingError::MissingIdentity { .. } => {
                BfError::new(BfErrorKind::MissingIdentity).with_op("map_row")
            }
            MappingError::UnknownConflictColumn { .. } => {
                BfError::new(BfErrorKind::InvalidConfig).with_op("register_mapping")
            }
            MappingError::DuplicateCollection { collection } => {
                BfError::new(BfErrorKind::DuplicateMapping)
                    .with_op("register_mapping")
                    .with_collection(collection)
            }
        }
        .with_message(message)
    }
}

/// A row value that does not fit its destination column
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoerceError {
    #[error("column {column} ({expected}) cannot hold {actual} value {value}")]
    Mismatch {
        column: String,
        expected: SqlType,
        actual: &'static str,
        value: String,
    },

    #[error("{table} has {expected} columns but the row has {actual} values")]
    Arity {
        table: String,
        expected: usize,
        actual: usize,
    },
}

impl From<CoerceError> for BfError {
    fn from(err: CoerceError) -> Self {
        let kind = match err {
            CoerceError::Mismatch { .. } => BfErrorKind::TypeMismatch,
            CoerceError::Arity { .. } => BfErrorKind::ColumnMismatch,
        };
        BfError::new(kind)
            .with_op("coerce_row")
            .with_message(err.to_string())
    }
}

impl From<serde_json::Error> for BfError {
    fn from(err: serde_json::Error) -> Self {
        BfError::new(BfErrorKind::Serialization).with_message(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_unique() {
        let kinds = [
            BfErrorKind::InvalidConfig,
            BfErrorKind::MissingMapping,
            BfErrorKind::DuplicateMapping,
            BfErrorKind::ColumnMismatch,
            BfErrorKind::MissingIdentity,
            BfErrorKind::TypeMismatch,
            BfErrorKind::ConstraintViolation,
            BfErrorKind::Schema,
            BfErrorKind::Auth,
            BfErrorKind::SourceUnavailable,
            BfErrorKind::SinkUnavailable,
            BfErrorKind::Persistence,
            BfErrorKind::Serialization,
            BfErrorKind::Io,
            BfErrorKind::Internal,
        ];
        let mut codes: Vec<_> = kinds.iter().map(|k| k.code()).collect();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), kinds.len());
    }

    #[test]
    fn test_display_includes_context() {
        let err = BfError::new(BfErrorKind::ConstraintViolation)
            .with_op("upsert")
            .with_collection("Users")
            .with_doc_id("u1")
            .with_message("duplicate key");

        let rendered = err.to_string();
        assert_eq!(
            rendered,
            "[ERR_CONSTRAINT_VIOLATION] in operation 'upsert': duplicate key (collection: Users) (doc_id: u1)"
        );
    }

    #[test]
    fn test_mapping_error_conversion() {
        let err: BfError = MappingError::ColumnCountMismatch {
            table: "users".into(),
            expected: 3,
            actual: 2,
        }
        .into();
        assert_eq!(err.kind(), BfErrorKind::ColumnMismatch);
        assert_eq!(err.op(), Some("map_row"));
        assert!(err.message().contains("declares 3 columns"));
    }
}
