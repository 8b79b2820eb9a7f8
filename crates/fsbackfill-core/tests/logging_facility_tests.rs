#![allow(clippy::unwrap_used, clippy::expect_used)]

use fsbackfill_core::errors::{BfError, BfErrorKind};
use fsbackfill_core::logging_facility::test_capture::init_test_capture;
use fsbackfill_core::types::schema::{EVENT_END, EVENT_END_ERROR, EVENT_START};
use fsbackfill_core::{log_op_end, log_op_error, log_op_start};

#[test]
fn test_log_op_start_macro() {
    let capture = init_test_capture();
    let op_name = "test_log_op_start_unique_1";

    log_op_start!(op_name, collection = "Users");

    capture.assert_event_exists(op_name, EVENT_START);
    let start = capture
        .events()
        .into_iter()
        .find(|e| e.op.as_deref() == Some(op_name))
        .unwrap();
    assert_eq!(start.field("collection"), Some("Users"));
    assert!(start.field("component").is_some());
}

#[test]
fn test_log_op_end_macro() {
    let capture = init_test_capture();
    let op_name = "test_log_op_end_unique_2";

    log_op_end!(op_name, duration_ms = 42, inserted = 3usize);

    let end_events: Vec<_> = capture
        .events()
        .into_iter()
        .filter(|e| e.op.as_deref() == Some(op_name) && e.event.as_deref() == Some(EVENT_END))
        .collect();

    assert_eq!(end_events.len(), 1, "Should have exactly one end event");
    assert_eq!(end_events[0].field("duration_ms"), Some("42"));
    assert_eq!(end_events[0].field("inserted"), Some("3"));
}

#[test]
fn test_log_op_error_includes_kind_and_code() {
    let capture = init_test_capture();
    let op_name = "test_log_op_error_unique_3";

    let err = BfError::new(BfErrorKind::SinkUnavailable).with_message("connection refused");
    log_op_error!(op_name, err, duration_ms = 10);

    let error_events: Vec<_> = capture
        .events()
        .into_iter()
        .filter(|e| e.op.as_deref() == Some(op_name) && e.event.as_deref() == Some(EVENT_END_ERROR))
        .collect();

    assert_eq!(error_events.len(), 1);
    let event = &error_events[0];
    assert_eq!(event.level, tracing::Level::ERROR);
    assert_eq!(event.field("err_code"), Some("ERR_SINK_UNAVAILABLE"));
    assert_eq!(event.field("err_kind"), Some("SinkUnavailable"));
    assert!(event.field("error").unwrap().contains("connection refused"));
}
