//! fsbackfill core - the backfill procedure independent of either datastore
//!
//! - Source documents, destination rows and table metadata
//! - The static collection registry and the hand-written mappers
//! - The sequential runner with its `Source` / `Sink` seams
//! - Structured errors and the logging facility

pub mod errors;
pub mod logging_facility;
pub mod mappers;
pub mod memory;
pub mod model;
pub mod registry;
pub mod runner;

pub use fsbackfill_core_types as types;

// Re-export commonly used types
pub use errors::{BfError, BfErrorKind, CoerceError, MappingError, Result};
pub use model::{
    coerce_row, Column, Document, FieldValue, Row, SqlType, TableSpec, TypedValue, Value,
};
pub use registry::{CollectionMapping, Registry};
pub use runner::{
    run_backfill, run_scoped, CollectionReport, CollectionStatus, Fetched, RowFailure, RunSummary,
    Sink, Source, WriteOutcome,
};
