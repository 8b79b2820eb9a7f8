#![allow(clippy::unwrap_used, clippy::expect_used)]

use fsbackfill_core::{BfError, BfErrorKind, FieldValue, Source};
use fsbackfill_firestore::value::{parse_page, ListDocumentsResponse};
use fsbackfill_firestore::{
    collect_pages, Credentials, FirestoreError, FirestoreSettings, FirestoreSource, ServiceAccount,
};
use std::cell::RefCell;
use std::path::PathBuf;

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn page_fixture() -> String {
    std::fs::read_to_string(fixture("list_users_page.json")).unwrap()
}

#[test]
fn test_reads_service_account_fixture() {
    let account = ServiceAccount::from_file(&fixture("service_account.json")).unwrap();
    assert_eq!(
        account.client_email(),
        "backfill@fsbackfill-test.iam.gserviceaccount.com"
    );
    assert_eq!(account.project_id(), Some("fsbackfill-test"));
    assert!(!format!("{account:?}").contains("PRIVATE KEY"));
}

#[test]
fn test_service_account_file_that_is_not_a_key() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sa.json");
    std::fs::write(&path, "not json").unwrap();

    let err = ServiceAccount::from_file(&path).unwrap_err();
    assert!(matches!(err, FirestoreError::ParseCredentials(_)));
    assert_eq!(BfError::from(err).kind(), BfErrorKind::InvalidConfig);
}

#[test]
fn test_missing_service_account_file() {
    let dir = tempfile::tempdir().unwrap();
    let err = ServiceAccount::from_file(&dir.path().join("absent.json")).unwrap_err();
    assert!(matches!(err, FirestoreError::ReadCredentials { .. }));
}

#[test]
fn test_page_decodes_every_value_kind() {
    let page = parse_page(&page_fixture(), "Users").unwrap();
    assert_eq!(page.next_page_token.as_deref(), Some("page-2"));

    let docs: Vec<_> = page
        .documents
        .into_iter()
        .map(|d| d.into_document().unwrap())
        .collect();
    assert_eq!(docs.len(), 2);

    let alice = &docs[0];
    assert_eq!(alice.id, "alice");
    assert_eq!(alice.get("firstName").and_then(FieldValue::as_str), Some("Alice"));
    assert_eq!(alice.get("phone"), Some(&FieldValue::Integer(5_550_100)));
    assert_eq!(alice.get("middleName"), Some(&FieldValue::Null));
    assert_eq!(alice.get("verified"), Some(&FieldValue::Boolean(true)));
    assert_eq!(alice.get("score"), Some(&FieldValue::Double(4.5)));
    assert_eq!(alice.get("avatar"), Some(&FieldValue::Bytes(b"hi".to_vec())));
    assert_eq!(alice.get("empty"), Some(&FieldValue::Array(vec![])));
    assert_eq!(
        alice.get("tags"),
        Some(&FieldValue::Array(vec![
            FieldValue::String("a".into()),
            FieldValue::Integer(2),
        ]))
    );
    match alice.get("joined") {
        Some(FieldValue::Timestamp(ts)) => {
            assert_eq!(ts.to_rfc3339(), "2021-03-04T05:06:07.123456+00:00")
        }
        other => panic!("expected timestamp, got {other:?}"),
    }
    match alice.get("prefs") {
        Some(FieldValue::Map(fields)) => {
            assert_eq!(fields.get("theme").and_then(FieldValue::as_str), Some("dark"))
        }
        other => panic!("expected map, got {other:?}"),
    }
    assert!(alice.create_time.is_some());

    let bob = &docs[1];
    assert_eq!(bob.id, "bob");
    assert!(bob.fields.is_empty());
}

#[tokio::test]
async fn test_collect_pages_follows_tokens_until_exhausted() {
    let requested = RefCell::new(Vec::new());
    let body = page_fixture();

    let docs = collect_pages(|token: Option<String>| {
        requested.borrow_mut().push(token.clone());
        let page = match token.as_deref() {
            None => parse_page(&body, "Users"),
            Some("page-2") => parse_page(
                r#"{"documents": [{"name": "projects/p/databases/(default)/documents/Users/carol"}], "nextPageToken": ""}"#,
                "Users",
            ),
            Some(other) => panic!("unexpected token {other}"),
        };
        async move { page }
    })
    .await
    .unwrap();

    let ids: Vec<_> = docs.documents.iter().map(|d| d.id.as_str()).collect();
    assert_eq!(ids, vec!["alice", "bob", "carol"]);
    assert!(docs.undecodable.is_empty());
    assert_eq!(
        requested.into_inner(),
        vec![None, Some("page-2".to_string())]
    );
}

#[tokio::test]
async fn test_collect_pages_empty_collection() {
    let docs = collect_pages(|_| async { Ok(ListDocumentsResponse::default()) })
        .await
        .unwrap();
    assert!(docs.is_empty());
}

#[tokio::test]
async fn test_undecodable_document_does_not_drop_its_siblings() {
    let fetched = collect_pages(|_| async {
        parse_page(
            r#"{"documents": [
                {"name": "p/Users/good", "fields": {"firstName": {"stringValue": "Gail"}}},
                {"name": "p/Users/bad", "fields": {"joined": {"timestampValue": "2024-13-45T99:00:00Z"}}}
            ]}"#,
            "Users",
        )
    })
    .await
    .unwrap();

    let ids: Vec<_> = fetched.documents.iter().map(|d| d.id.as_str()).collect();
    assert_eq!(ids, vec!["good"]);
    assert_eq!(fetched.len(), 2);

    assert_eq!(fetched.undecodable.len(), 1);
    let failure = &fetched.undecodable[0];
    assert_eq!(failure.doc_id, "bad");
    assert_eq!(failure.error.kind(), BfErrorKind::Serialization);
    assert_eq!(failure.error.op(), Some("decode_document"));
    assert!(failure.error.message().contains("p/Users/bad"));
}

#[tokio::test]
async fn test_collect_pages_fails_on_page_that_is_not_json() {
    let err = collect_pages(|_| async { parse_page("<html>502 Bad Gateway</html>", "Users") })
        .await
        .unwrap_err();

    assert!(matches!(err, FirestoreError::Decode { .. }));
    assert_eq!(BfError::from(err).kind(), BfErrorKind::Serialization);
}

#[tokio::test]
async fn test_unreachable_emulator_is_source_unavailable() {
    // Nothing listens on port 9 of localhost; the emulator token needs no I/O
    let source = FirestoreSource::connect(FirestoreSettings {
        project_id: "fsbackfill-test".into(),
        credentials: Credentials::Emulator {
            host: "127.0.0.1:9".into(),
        },
    })
    .await
    .unwrap();

    let err = source.fetch_all("Users").await.unwrap_err();
    assert_eq!(err.kind(), BfErrorKind::SourceUnavailable);
    assert_eq!(err.op(), Some("fetch_all"));
}
