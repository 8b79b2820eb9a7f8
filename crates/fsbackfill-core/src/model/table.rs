use crate::errors::MappingError;
use std::fmt;

/// Declared PostgreSQL type of a destination column
///
/// Drives how a value (and in particular a null) is bound as a parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqlType {
    Text,
    Boolean,
    BigInt,
    Double,
    Timestamptz,
}

impl fmt::Display for SqlType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SqlType::Text => "text",
            SqlType::Boolean => "boolean",
            SqlType::BigInt => "bigint",
            SqlType::Double => "double precision",
            SqlType::Timestamptz => "timestamptz",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub name: String,
    pub ty: SqlType,
}

impl Column {
    pub fn new(name: impl Into<String>, ty: SqlType) -> Self {
        Self {
            name: name.into(),
            ty,
        }
    }

    pub fn text(name: impl Into<String>) -> Self {
        Self::new(name, SqlType::Text)
    }

    pub fn boolean(name: impl Into<String>) -> Self {
        Self::new(name, SqlType::Boolean)
    }

    pub fn timestamptz(name: impl Into<String>) -> Self {
        Self::new(name, SqlType::Timestamptz)
    }
}

/// Destination table metadata
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSpec {
    pub name: String,
    pub columns: Vec<Column>,
    /// Column whose uniqueness constraint governs the upsert
    pub conflict_column: String,
}

impl TableSpec {
    pub fn new(
        name: impl Into<String>,
        conflict_column: impl Into<String>,
        columns: Vec<Column>,
    ) -> Self {
        Self {
            name: name.into(),
            columns,
            conflict_column: conflict_column.into(),
        }
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    /// Checks that the conflict column is one of the declared columns
    pub fn conflict_index(&self) -> Result<usize, MappingError> {
        self.column_index(&self.conflict_column)
            .ok_or_else(|| MappingError::UnknownConflictColumn {
                table: self.name.clone(),
                column: self.conflict_column.clone(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> TableSpec {
        TableSpec::new(
            "accounts",
            "id",
            vec![Column::text("id"), Column::boolean("enabled")],
        )
    }

    #[test]
    fn test_column_lookup() {
        let t = table();
        assert_eq!(t.column_index("enabled"), Some(1));
        assert_eq!(t.column_index("missing"), None);
        assert_eq!(t.column_names().collect::<Vec<_>>(), vec!["id", "enabled"]);
    }

    #[test]
    fn test_conflict_index() {
        assert_eq!(table().conflict_index(), Ok(0));

        let mut bad = table();
        bad.conflict_column = "uid".into();
        assert!(matches!(
            bad.conflict_index(),
            Err(MappingError::UnknownConflictColumn { .. })
        ));
    }
}
