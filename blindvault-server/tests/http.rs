//! End-to-end tests of the HTTP endpoint against an in-memory store.

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use blindvault::prelude::*;
use blindvault_server::{router, AppState};
use serde_json::{json, Value};
use tower::ServiceExt;

fn payload() -> Payload {
    json!({ "customer_name": "John Doe", "account_id": "ACC-001", "balance": 42 })
        .as_object()
        .cloned()
        .expect("payload is an object")
}

fn indexer() -> BlindIndexer {
    BlindIndexer::new(IndexKey::from_bytes(vec![0x01; 32]).unwrap())
}

fn vault() -> Vault {
    Vault::new(MasterKey::from_bytes(vec![0x02; 32]).unwrap())
}

fn app_with(record: VaultRecord) -> Router {
    let store = MemoryStore::new();
    store.insert(&record).unwrap();
    router(AppState::new(SearchEngine::new(indexer(), vault(), store)))
}

fn app() -> Router {
    let record = VaultRecord::ingest(&indexer(), &vault(), "john doe", "ACC-001", &payload())
        .expect("ingest");
    app_with(record)
}

async fn post(app: Router, body: &str) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri("/secure-search")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn test_account_id_admin_gets_data() {
    let (status, body) =
        post(app(), r#"{"field": "account_id", "value": "ACC-001", "role": "admin"}"#).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({ "status": "ok", "message": "Search successful", "data": Value::Object(payload()) })
    );
}

#[tokio::test]
async fn test_account_id_user_gets_no_data() {
    let (status, body) = post(app(), r#"{"field": "account_id", "value": "ACC-001"}"#).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "status": "ok", "message": "Search successful" }));
    assert!(body.get("data").is_none());
}

#[tokio::test]
async fn test_name_normalization_and_role_variants() {
    let (status, body) = post(
        app(),
        r#"{"field": "customer_name", "value": "  JOHN   Doe", "role": " Admin "}"#,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["balance"], 42);
}

#[tokio::test]
async fn test_unsupported_field() {
    let (status, body) = post(app(), r#"{"field": "ssn", "value": "123-45-6789"}"#).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "error": "Invalid search field" }));
}

#[tokio::test]
async fn test_missing_value() {
    let (status, body) = post(app(), r#"{"field": "name"}"#).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "error": "Missing field or value" }));
}

#[tokio::test]
async fn test_empty_and_invalid_bodies() {
    let (status, body) = post(app(), "").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "error": "No data provided" }));

    let (status, body) = post(app(), "{}").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "error": "No data provided" }));

    let (status, body) = post(app(), "{not json").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "error": "Invalid request body" }));
}

#[tokio::test]
async fn test_not_found() {
    let (status, body) = post(app(), r#"{"field": "account_id", "value": "ACC-999"}"#).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({ "status": "not_found", "message": "Data not found" }));
}

#[tokio::test]
async fn test_corrupted_tag() {
    let mut record =
        VaultRecord::ingest(&indexer(), &vault(), "john doe", "ACC-001", &payload()).unwrap();
    record.sealed.tag[15] ^= 0xff;

    let (status, body) =
        post(app_with(record), r#"{"field": "account_id", "value": "ACC-001", "role": "admin"}"#)
            .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({ "error": "Decryption failed" }));
}

#[tokio::test]
async fn test_health() {
    let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let response = app().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(serde_json::from_slice::<Value>(&bytes).unwrap(), json!({ "status": "ok" }));
}

#[tokio::test]
async fn test_non_string_role_is_redacted() {
    let (status, body) =
        post(app(), r#"{"field": "account_id", "value": "ACC-001", "role": 1}"#).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "status": "ok", "message": "Search successful" }));
}

#[tokio::test]
async fn test_falsy_bodies_are_empty() {
    for raw in ["[]", "null", "0", "false", "\"\""] {
        let (status, body) = post(app(), raw).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{raw}");
        assert_eq!(body, json!({ "error": "No data provided" }), "{raw}");
    }
}

#[tokio::test]
async fn test_panicking_lookup_is_internal_error() {
    struct PanickingStore;

    impl RecordStore for PanickingStore {
        fn find_by_index(
            &self,
            _column: IndexColumn,
            _token: &BlindIndex,
        ) -> Result<Option<SealedRecord>, StorageError> {
            panic!("lookup blew up");
        }

        fn insert(&self, _record: &VaultRecord) -> Result<(), StorageError> {
            Ok(())
        }
    }

    let app = router(AppState::new(SearchEngine::new(indexer(), vault(), PanickingStore)));
    let (status, body) = post(app, r#"{"field": "name", "value": "x"}"#).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({ "error": "Internal server error" }));
}
