//! Start/end/error events for backfill operations
//!
//! Used at the boundaries that bracket work: the whole `backfill` run, each
//! `backfill_collection`, the sink's `pg_connect`, and the CLI's INIT steps
//! (`load_config`, `registry`, `connect_source`, `connect_sink`), which
//! only log `end_error`. Every event carries `component`, `op` and an
//! `event` of `start`, `end` or `end_error`; `end` and `end_error` add
//! `duration_ms`.
//!
//! Per-document events (`row_written`, `row_failed`) and the collection
//! notices (`empty_collection`, `unregistered_collection`) are logged
//! directly by the runner.

/// Log the start of an operation
///
/// # Example
///
/// ```
/// # use fsbackfill_core::log_op_start;
/// log_op_start!("backfill_collection");
/// log_op_start!("backfill_collection", collection = "Users");
/// ```
#[macro_export]
macro_rules! log_op_start {
    ($op:expr) => {
        tracing::info!(
            component = module_path!(),
            op = $op,
            event = $crate::types::schema::EVENT_START,
        );
    };
    ($op:expr, $($field:tt)*) => {
        tracing::info!(
            component = module_path!(),
            op = $op,
            event = $crate::types::schema::EVENT_START,
            $($field)*
        );
    };
}

/// Log the successful end of an operation
///
/// # Example
///
/// ```
/// # use fsbackfill_core::log_op_end;
/// log_op_end!("backfill_collection", duration_ms = 42);
/// ```
#[macro_export]
macro_rules! log_op_end {
    ($op:expr, duration_ms = $duration:expr) => {
        tracing::info!(
            component = module_path!(),
            op = $op,
            event = $crate::types::schema::EVENT_END,
            duration_ms = $duration,
        );
    };
    ($op:expr, duration_ms = $duration:expr, $($field:tt)*) => {
        tracing::info!(
            component = module_path!(),
            op = $op,
            event = $crate::types::schema::EVENT_END,
            duration_ms = $duration,
            $($field)*
        );
    };
}

/// Log an operation error
///
/// # Example
///
/// ```
/// # use fsbackfill_core::{log_op_error, errors::{BfError, BfErrorKind}};
/// let err = BfError::new(BfErrorKind::SourceUnavailable);
/// log_op_error!("fetch_collection", err, duration_ms = 10);
/// ```
#[macro_export]
macro_rules! log_op_error {
    ($op:expr, $err:expr, duration_ms = $duration:expr) => {{
        let bf_err: &$crate::errors::BfError = &$err;
        tracing::error!(
            component = module_path!(),
            op = $op,
            event = $crate::types::schema::EVENT_END_ERROR,
            duration_ms = $duration,
            err_kind = ?bf_err.kind(),
            err_code = bf_err.code(),
            error = %bf_err,
        );
    }};
    ($op:expr, $err:expr, duration_ms = $duration:expr, $($field:tt)*) => {{
        let bf_err: &$crate::errors::BfError = &$err;
        tracing::error!(
            component = module_path!(),
            op = $op,
            event = $crate::types::schema::EVENT_END_ERROR,
            duration_ms = $duration,
            err_kind = ?bf_err.kind(),
            err_code = bf_err.code(),
            error = %bf_err,
            $($field)*
        );
    }};
}
