//! Core types shared across the fsbackfill crates
//!
//! - **Correlation**: `RunId` tagging every event of a single backfill run
//! - **Sensitive data**: `Sensitive<T>` marker for automatic redaction
//! - **Schema constants**: canonical field keys and event names for logging

pub mod correlation;
pub mod schema;
pub mod sensitive;

pub use correlation::RunId;
pub use sensitive::Sensitive;
