//! Static per-collection registry
//!
//! A `CollectionMapping` keeps the mapper and the destination table
//! metadata in one record, so a collection can never be registered with one
//! and not the other. The `Registry` is built once at startup and only read
//! afterwards.

use crate::errors::MappingError;
use crate::mappers;
use crate::model::{Document, Row, TableSpec};
use std::collections::BTreeMap;

/// Pure mapping function from a source document to a destination row
pub type MapFn = fn(&Document) -> Row;

#[derive(Debug, Clone)]
pub struct CollectionMapping {
    collection: String,
    table: TableSpec,
    map: MapFn,
}

impl CollectionMapping {
    pub fn new(collection: impl Into<String>, table: TableSpec, map: MapFn) -> Self {
        Self {
            collection: collection.into(),
            table,
            map,
        }
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    pub fn table(&self) -> &TableSpec {
        &self.table
    }

    /// Run the mapper without any checks
    pub fn map_document(&self, doc: &Document) -> Row {
        (self.map)(doc)
    }

    /// Run the mapper and verify the row against the table metadata
    ///
    /// The row must have exactly one value per declared column and a
    /// non-null conflict column value.
    pub fn map_checked(&self, doc: &Document) -> Result<Row, MappingError> {
        let row = self.map_document(doc);

        let expected = self.table.columns.len();
        if row.len() != expected {
            return Err(MappingError::ColumnCountMismatch {
                table: self.table.name.clone(),
                expected,
                actual: row.len(),
            });
        }

        let conflict = self.table.conflict_index()?;
        if row.get(conflict).map_or(true, |v| v.is_null()) {
            return Err(MappingError::MissingIdentity {
                table: self.table.name.clone(),
                column: self.table.conflict_column.clone(),
            });
        }

        Ok(row)
    }
}

/// Immutable lookup from collection name to its mapping
#[derive(Debug, Clone, Default)]
pub struct Registry {
    mappings: BTreeMap<String, CollectionMapping>,
}

impl Registry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    /// The registry of every mapping shipped with this tool
    pub fn standard() -> Result<Self, MappingError> {
        Self::builder().register(mappers::users::mapping()).build()
    }

    pub fn get(&self, collection: &str) -> Option<&CollectionMapping> {
        self.mappings.get(collection)
    }

    pub fn iter(&self) -> impl Iterator<Item = &CollectionMapping> {
        self.mappings.values()
    }

    pub fn len(&self) -> usize {
        self.mappings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }
}

#[derive(Debug, Default)]
pub struct RegistryBuilder {
    mappings: Vec<CollectionMapping>,
}

impl RegistryBuilder {
    pub fn register(mut self, mapping: CollectionMapping) -> Self {
        self.mappings.push(mapping);
        self
    }

    /// Freeze the registry
    ///
    /// Fails on a collection registered twice or on table metadata whose
    /// conflict column is not among its columns.
    pub fn build(self) -> Result<Registry, MappingError> {
        let mut mappings = BTreeMap::new();
        for mapping in self.mappings {
            mapping.table.conflict_index()?;
            let name = mapping.collection.clone();
            if mappings.insert(name.clone(), mapping).is_some() {
                return Err(MappingError::DuplicateCollection { collection: name });
            }
        }
        Ok(Registry { mappings })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Column, Value};

    fn table() -> TableSpec {
        TableSpec::new("posts", "id", vec![Column::text("id"), Column::text("body")])
    }

    fn good(doc: &Document) -> Row {
        Row::new(vec![
            Value::text(doc.id.clone()),
            Value::from_field(doc.get("body")),
        ])
    }

    fn short(doc: &Document) -> Row {
        Row::new(vec![Value::text(doc.id.clone())])
    }

    fn no_identity(_doc: &Document) -> Row {
        Row::new(vec![Value::Null, Value::Null])
    }

    #[test]
    fn test_map_checked_accepts_aligned_row() {
        let mapping = CollectionMapping::new("posts", table(), good);
        let row = mapping.map_checked(&Document::new("p1")).unwrap();
        assert_eq!(row.values(), &[Value::text("p1"), Value::Null]);
    }

    #[test]
    fn test_map_checked_rejects_short_row() {
        let mapping = CollectionMapping::new("posts", table(), short);
        let err = mapping.map_checked(&Document::new("p1")).unwrap_err();
        assert_eq!(
            err,
            MappingError::ColumnCountMismatch {
                table: "posts".into(),
                expected: 2,
                actual: 1
            }
        );
    }

    #[test]
    fn test_map_checked_rejects_null_identity() {
        let mapping = CollectionMapping::new("posts", table(), no_identity);
        let err = mapping.map_checked(&Document::new("p1")).unwrap_err();
        assert!(matches!(err, MappingError::MissingIdentity { .. }));
    }

    #[test]
    fn test_duplicate_registration_rejected() {
        let err = Registry::builder()
            .register(CollectionMapping::new("posts", table(), good))
            .register(CollectionMapping::new("posts", table(), short))
            .build()
            .unwrap_err();
        assert_eq!(
            err,
            MappingError::DuplicateCollection {
                collection: "posts".into()
            }
        );
    }

    #[test]
    fn test_unknown_conflict_column_rejected() {
        let mut t = table();
        t.conflict_column = "slug".into();
        let err = Registry::builder()
            .register(CollectionMapping::new("posts", t, good))
            .build()
            .unwrap_err();
        assert!(matches!(err, MappingError::UnknownConflictColumn { .. }));
    }

    #[test]
    fn test_standard_registry_has_users() {
        let registry = Registry::standard().unwrap();
        assert_eq!(registry.len(), 1);
        let users = registry.get("Users").unwrap();
        assert_eq!(users.table().name, "users");
        assert!(registry.get("posts").is_none());
    }
}
