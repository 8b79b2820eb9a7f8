//! Backfill runner
//!
//! `INIT → (per collection: FETCH → MAP-EACH → WRITE-EACH) → SHUTDOWN`
//!
//! INIT happens at the edge (the CLI builds the source and sink). This
//! module drives the per-collection loop and owns the SHUTDOWN path through
//! [`run_scoped`]. Processing is strictly sequential: one document is fully
//! mapped and written before the next one is looked at.

use crate::errors::{BfError, BfErrorKind, Result};
use crate::model::{Document, Row, TableSpec};
use crate::registry::{CollectionMapping, Registry};
use crate::types::schema::{
    EVENT_EMPTY_COLLECTION, EVENT_ROW_FAILED, EVENT_ROW_WRITTEN, EVENT_UNREGISTERED_COLLECTION,
    OUTCOME_INSERTED, OUTCOME_SKIPPED,
};
use crate::types::RunId;
use crate::{log_op_end, log_op_error, log_op_start};
use async_trait::async_trait;
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::time::Instant;
use tracing::Instrument;

/// Read side: lists every document of a collection
#[async_trait]
pub trait Source: Send + Sync {
    /// Fetch the complete current document set of `collection`
    ///
    /// An empty collection is an empty [`Fetched`]. A listed document that
    /// cannot be decoded is returned in [`Fetched::undecodable`]; errors
    /// mean the source itself is unreachable or refused us and abort the
    /// whole run.
    async fn fetch_all(&self, collection: &str) -> Result<Fetched>;
}

/// Everything one listing of a collection produced
#[derive(Debug, Clone, Default)]
pub struct Fetched {
    pub documents: Vec<Document>,
    /// Listed documents whose payload could not be decoded
    pub undecodable: Vec<RowFailure>,
}

impl Fetched {
    pub fn len(&self) -> usize {
        self.documents.len() + self.undecodable.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl From<Vec<Document>> for Fetched {
    fn from(documents: Vec<Document>) -> Self {
        Self {
            documents,
            undecodable: Vec::new(),
        }
    }
}

/// Result of a single idempotent insert
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// A new row was written
    Inserted,
    /// A row with the same conflict value already existed and was left alone
    Skipped,
}

/// Write side: idempotent insert of one row
#[async_trait]
pub trait Sink: Send + Sync {
    /// Insert `row` into `table`, doing nothing if the conflict column
    /// value is already present
    async fn upsert(&self, table: &TableSpec, row: &Row) -> Result<WriteOutcome>;

    /// Release the underlying connections. Called exactly once, at shutdown.
    async fn close(&self);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectionStatus {
    /// Every document was attempted (some may have failed)
    Completed,
    /// The collection had no documents
    Empty,
    /// No mapping is registered for the collection name
    Unregistered,
}

/// A document that could not be mapped or written
#[derive(Debug, Clone)]
pub struct RowFailure {
    pub doc_id: String,
    pub error: BfError,
}

#[derive(Debug, Clone)]
pub struct CollectionReport {
    pub collection: String,
    pub status: CollectionStatus,
    pub fetched: usize,
    pub inserted: usize,
    pub skipped: usize,
    pub failures: Vec<RowFailure>,
}

impl CollectionReport {
    fn new(collection: &str, status: CollectionStatus) -> Self {
        Self {
            collection: collection.to_string(),
            status,
            fetched: 0,
            inserted: 0,
            skipped: 0,
            failures: Vec::new(),
        }
    }

    /// Number of documents for which a write was attempted or mapping failed
    pub fn attempted(&self) -> usize {
        self.inserted + self.skipped + self.failures.len()
    }
}

#[derive(Debug, Clone)]
pub struct RunSummary {
    pub run_id: RunId,
    pub collections: Vec<CollectionReport>,
}

impl RunSummary {
    pub fn total_inserted(&self) -> usize {
        self.collections.iter().map(|c| c.inserted).sum()
    }

    pub fn total_skipped(&self) -> usize {
        self.collections.iter().map(|c| c.skipped).sum()
    }

    pub fn total_failed(&self) -> usize {
        self.collections.iter().map(|c| c.failures.len()).sum()
    }

    pub fn has_row_failures(&self) -> bool {
        self.total_failed() > 0
    }

    pub fn collection(&self, name: &str) -> Option<&CollectionReport> {
        self.collections.iter().find(|c| c.collection == name)
    }
}

fn elapsed_ms(started: Instant) -> u64 {
    started.elapsed().as_millis() as u64
}

/// Run the backfill and release the sink on every exit path
///
/// Takes ownership of the sink: `close()` runs after the last collection,
/// after a fatal source error, and after a panic (which is then resumed).
pub async fn run_scoped<S, K>(
    registry: &Registry,
    collections: &[String],
    source: &S,
    sink: K,
) -> Result<RunSummary>
where
    S: Source + ?Sized,
    K: Sink,
{
    let outcome = AssertUnwindSafe(run_backfill(registry, collections, source, &sink))
        .catch_unwind()
        .await;

    sink.close().await;
    tracing::info!(component = module_path!(), op = "shutdown", "Sink released");

    match outcome {
        Ok(result) => result,
        Err(panic) => std::panic::resume_unwind(panic),
    }
}

/// Backfill each named collection in order
///
/// Returns `Err` only when the source fails; per-document failures and
/// unregistered collections are recorded in the summary.
pub async fn run_backfill<S, K>(
    registry: &Registry,
    collections: &[String],
    source: &S,
    sink: &K,
) -> Result<RunSummary>
where
    S: Source + ?Sized,
    K: Sink + ?Sized,
{
    let run_id = RunId::new();
    let span = tracing::info_span!("backfill", run_id = %run_id);

    async move {
        log_op_start!("backfill", collections = collections.len());
        let started = Instant::now();

        let mut reports = Vec::with_capacity(collections.len());
        for name in collections {
            match backfill_collection(registry, name, source, sink).await {
                Ok(report) => reports.push(report),
                Err(err) => {
                    log_op_error!("backfill", err, duration_ms = elapsed_ms(started));
                    return Err(err);
                }
            }
        }

        let summary = RunSummary {
            run_id,
            collections: reports,
        };

        log_op_end!(
            "backfill",
            duration_ms = elapsed_ms(started),
            inserted = summary.total_inserted(),
            skipped = summary.total_skipped(),
            failed = summary.total_failed(),
        );
        Ok(summary)
    }
    .instrument(span)
    .await
}

async fn backfill_collection<S, K>(
    registry: &Registry,
    name: &str,
    source: &S,
    sink: &K,
) -> Result<CollectionReport>
where
    S: Source + ?Sized,
    K: Sink + ?Sized,
{
    let Some(mapping) = registry.get(name) else {
        let err = BfError::new(BfErrorKind::MissingMapping)
            .with_op("backfill_collection")
            .with_collection(name)
            .with_message("no mapper or table metadata registered");
        tracing::error!(
            component = module_path!(),
            op = "backfill_collection",
            event = EVENT_UNREGISTERED_COLLECTION,
            collection = name,
            err_code = err.code(),
            error = %err,
            "No mapper or table info for collection: {name}"
        );
        return Ok(CollectionReport::new(name, CollectionStatus::Unregistered));
    };

    log_op_start!(
        "backfill_collection",
        collection = name,
        table = mapping.table().name.as_str(),
    );
    let started = Instant::now();

    let fetched = match source.fetch_all(name).await {
        Ok(fetched) => fetched,
        Err(err) => {
            let err = err.with_collection(name);
            log_op_error!(
                "backfill_collection",
                err,
                duration_ms = elapsed_ms(started),
                collection = name,
            );
            return Err(err);
        }
    };

    let mut report = CollectionReport::new(name, CollectionStatus::Completed);
    report.fetched = fetched.len();

    if fetched.is_empty() {
        report.status = CollectionStatus::Empty;
        tracing::info!(
            component = module_path!(),
            op = "backfill_collection",
            event = EVENT_EMPTY_COLLECTION,
            collection = name,
            "No documents found in collection: {name}"
        );
    }

    for failure in fetched.undecodable {
        record_failure(
            "decode_document",
            name,
            failure.doc_id,
            failure.error,
            &mut report,
        );
    }
    for doc in &fetched.documents {
        write_document(mapping, doc, sink, &mut report).await;
    }

    log_op_end!(
        "backfill_collection",
        duration_ms = elapsed_ms(started),
        collection = name,
        fetched = report.fetched,
        inserted = report.inserted,
        skipped = report.skipped,
        failed = report.failures.len(),
    );
    Ok(report)
}

async fn write_document<K>(
    mapping: &CollectionMapping,
    doc: &Document,
    sink: &K,
    report: &mut CollectionReport,
) where
    K: Sink + ?Sized,
{
    let collection = mapping.collection();

    let written = match mapping.map_checked(doc) {
        Ok(row) => sink.upsert(mapping.table(), &row).await,
        Err(err) => Err(BfError::from(err)),
    };

    match written {
        Ok(outcome) => {
            let label = match outcome {
                WriteOutcome::Inserted => {
                    report.inserted += 1;
                    OUTCOME_INSERTED
                }
                WriteOutcome::Skipped => {
                    report.skipped += 1;
                    OUTCOME_SKIPPED
                }
            };
            tracing::info!(
                component = module_path!(),
                op = "write_row",
                event = EVENT_ROW_WRITTEN,
                collection,
                doc_id = doc.id.as_str(),
                outcome = label,
            );
        }
        Err(err) => record_failure("write_row", collection, doc.id.clone(), err, report),
    }
}

/// Log a per-document failure and add it to the report
fn record_failure(
    op: &'static str,
    collection: &str,
    doc_id: String,
    err: BfError,
    report: &mut CollectionReport,
) {
    let err = err.with_collection(collection).with_doc_id(doc_id.clone());
    tracing::error!(
        component = module_path!(),
        op,
        event = EVENT_ROW_FAILED,
        collection,
        doc_id = doc_id.as_str(),
        err_kind = ?err.kind(),
        err_code = err.code(),
        error = %err,
        "Error inserting {collection} doc {doc_id}"
    );
    report.failures.push(RowFailure { doc_id, error: err });
}
