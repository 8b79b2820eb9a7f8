//! In-memory source and sink
//!
//! `MemorySink` backs `--dry-run` and both types back the runner tests. The
//! sink follows the same first-write-wins rule as the PostgreSQL sink and
//! coerces every row against the column types first, so a value PostgreSQL
//! would refuse fails here with `ERR_TYPE_MISMATCH` too.

use crate::errors::{BfError, BfErrorKind, Result};
use crate::model::{coerce_row, Document, Row, TableSpec, Value};
use crate::runner::{Fetched, RowFailure, Sink, Source, WriteOutcome};
use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Fixed set of documents per collection
#[derive(Debug, Default)]
pub struct MemorySource {
    collections: BTreeMap<String, Vec<Document>>,
    undecodable: BTreeMap<String, Vec<RowFailure>>,
    unavailable: BTreeSet<String>,
    fetches: Mutex<Vec<String>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_collection(mut self, name: impl Into<String>, docs: Vec<Document>) -> Self {
        self.collections.insert(name.into(), docs);
        self
    }

    /// List a document in `name` whose payload cannot be decoded
    pub fn with_undecodable(
        mut self,
        name: impl Into<String>,
        doc_id: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        self.undecodable
            .entry(name.into())
            .or_default()
            .push(RowFailure {
                doc_id: doc_id.into(),
                error: BfError::new(BfErrorKind::Serialization)
                    .with_op("decode_document")
                    .with_message(reason),
            });
        self
    }

    /// Make fetches of `name` fail as if the source were unreachable
    pub fn with_unavailable(mut self, name: impl Into<String>) -> Self {
        self.unavailable.insert(name.into());
        self
    }

    /// Collection names in the order they were fetched
    pub fn fetches(&self) -> Vec<String> {
        lock(&self.fetches).clone()
    }
}

#[async_trait]
impl Source for MemorySource {
    async fn fetch_all(&self, collection: &str) -> Result<Fetched> {
        lock(&self.fetches).push(collection.to_string());

        if self.unavailable.contains(collection) {
            return Err(BfError::new(BfErrorKind::SourceUnavailable)
                .with_op("fetch_all")
                .with_message("source unavailable"));
        }

        Ok(Fetched {
            documents: self.collections.get(collection).cloned().unwrap_or_default(),
            undecodable: self.undecodable.get(collection).cloned().unwrap_or_default(),
        })
    }
}

/// Tables held as conflict-key → row maps
#[derive(Debug, Default)]
pub struct MemorySink {
    tables: Mutex<BTreeMap<String, BTreeMap<String, Row>>>,
    rejected_keys: BTreeSet<String>,
    attempts: AtomicUsize,
    closes: AtomicUsize,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject any row whose conflict value renders as `key`, the way a
    /// database would reject a row violating some other constraint
    pub fn rejecting(mut self, key: impl Into<String>) -> Self {
        self.rejected_keys.insert(key.into());
        self
    }

    /// Rows currently stored in `table`, ordered by conflict key
    pub fn rows(&self, table: &str) -> Vec<Row> {
        lock(&self.tables)
            .get(table)
            .map(|rows| rows.values().cloned().collect())
            .unwrap_or_default()
    }

    pub fn row_count(&self, table: &str) -> usize {
        lock(&self.tables).get(table).map_or(0, BTreeMap::len)
    }

    /// Number of `upsert` calls, successful or not
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    /// Number of `close` calls
    pub fn closes(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }
}

fn conflict_key(value: &Value) -> String {
    match value {
        Value::Text(s) => s.clone(),
        other => format!("{:?}", other),
    }
}

#[async_trait]
impl Sink for MemorySink {
    async fn upsert(&self, table: &TableSpec, row: &Row) -> Result<WriteOutcome> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        coerce_row(table, row)?;

        let key = table
            .conflict_index()
            .ok()
            .and_then(|idx| row.get(idx))
            .map(conflict_key)
            .ok_or_else(|| {
                BfError::new(BfErrorKind::MissingIdentity)
                    .with_op("upsert")
                    .with_message(format!("row has no {} value", table.conflict_column))
            })?;

        if self.rejected_keys.contains(&key) {
            return Err(BfError::new(BfErrorKind::ConstraintViolation)
                .with_op("upsert")
                .with_message(format!("row {key} rejected by constraint")));
        }

        let mut tables = lock(&self.tables);
        let rows = tables.entry(table.name.clone()).or_default();
        if rows.contains_key(&key) {
            return Ok(WriteOutcome::Skipped);
        }
        rows.insert(key, row.clone());
        Ok(WriteOutcome::Inserted)
    }

    async fn close(&self) {
        self.closes.fetch_add(1, Ordering::SeqCst);
    }
}
