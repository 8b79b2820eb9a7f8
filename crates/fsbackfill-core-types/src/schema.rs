//! Canonical schema constants for structured logging
//!
//! These constants keep field names consistent between the runner, the
//! store adapters and the test capture layer.

// Canonical field keys for structured logging
pub const FIELD_COMPONENT: &str = "component";
pub const FIELD_OP: &str = "op";
pub const FIELD_EVENT: &str = "event";
pub const FIELD_DURATION_MS: &str = "duration_ms";
pub const FIELD_RUN_ID: &str = "run_id";

// Backfill identifiers
pub const FIELD_COLLECTION: &str = "collection";
pub const FIELD_TABLE: &str = "table";
pub const FIELD_DOC_ID: &str = "doc_id";
pub const FIELD_OUTCOME: &str = "outcome";

// Counters
pub const FIELD_FETCHED: &str = "fetched";
pub const FIELD_INSERTED: &str = "inserted";
pub const FIELD_SKIPPED: &str = "skipped";
pub const FIELD_FAILED: &str = "failed";

// Error fields
pub const FIELD_ERR_KIND: &str = "err_kind";
pub const FIELD_ERR_CODE: &str = "err_code";

// Canonical event names
pub const EVENT_START: &str = "start";
pub const EVENT_END: &str = "end";
pub const EVENT_END_ERROR: &str = "end_error";
pub const EVENT_ROW_WRITTEN: &str = "row_written";
pub const EVENT_ROW_FAILED: &str = "row_failed";
pub const EVENT_EMPTY_COLLECTION: &str = "empty_collection";
pub const EVENT_UNREGISTERED_COLLECTION: &str = "unregistered_collection";

// Row outcomes
pub const OUTCOME_INSERTED: &str = "inserted";
pub const OUTCOME_SKIPPED: &str = "skipped";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constants_accessibility() {
        assert!(!FIELD_COMPONENT.is_empty());
        assert!(!FIELD_OP.is_empty());
        assert!(!FIELD_COLLECTION.is_empty());
        assert!(!EVENT_START.is_empty());
        assert!(!EVENT_END.is_empty());
        assert!(!EVENT_END_ERROR.is_empty());
    }

    #[test]
    fn test_event_names_are_distinct() {
        let events = [
            EVENT_START,
            EVENT_END,
            EVENT_END_ERROR,
            EVENT_ROW_WRITTEN,
            EVENT_ROW_FAILED,
            EVENT_EMPTY_COLLECTION,
            EVENT_UNREGISTERED_COLLECTION,
        ];
        for (i, a) in events.iter().enumerate() {
            for b in &events[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }
}
