//! HTTP transport for `BlindVault` searches.
//!
//! Routes:
//! - `POST /secure-search`: JSON body `{field, value, role?}`
//! - `GET /health`: liveness probe

#![warn(clippy::pedantic, clippy::nursery)]

pub mod config;
pub mod response;

use axum::body::Bytes;
use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use blindvault::search::{
    InternalError, SearchEngine, SearchOutcome, SearchRequest, ValidationError,
};
use serde_json::{json, Value};
use std::num::FpCategory;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::error;

pub use response::SearchResponse;

/// Shared server state.
#[derive(Debug, Clone)]
pub struct AppState {
    engine: Arc<SearchEngine>,
}

impl AppState {
    /// Wraps a search engine for sharing across requests.
    #[must_use]
    pub fn new(engine: SearchEngine) -> Self {
        Self { engine: Arc::new(engine) }
    }
}

/// Builds the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/secure-search", post(secure_search))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Parses a request body into a [`SearchRequest`].
///
/// # Errors
///
/// - `ValidationError::EmptyBody` for an empty body or a falsy JSON document
///   (`null`, `false`, `0`, `""`, `[]`, `{}`)
/// - `ValidationError::InvalidBody` for anything else that is not a JSON
///   object with string-typed `field` and `value`
pub fn parse_request(body: &[u8]) -> Result<SearchRequest, ValidationError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(ValidationError::EmptyBody);
    }
    let value: Value = serde_json::from_slice(body).map_err(|_| ValidationError::InvalidBody)?;
    if is_falsy(&value) {
        return Err(ValidationError::EmptyBody);
    }
    if !value.is_object() {
        return Err(ValidationError::InvalidBody);
    }
    serde_json::from_value(value).map_err(|_| ValidationError::InvalidBody)
}

fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f.classify() == FpCategory::Zero),
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
    }
}

async fn secure_search(State(state): State<AppState>, body: Bytes) -> Response {
    let request = match parse_request(&body) {
        Ok(request) => request,
        Err(reason) => return SearchResponse(SearchOutcome::Rejected(reason)).into_response(),
    };

    // Lookup and decryption block; keep them off the async workers
    let engine = Arc::clone(&state.engine);
    let outcome = match tokio::task::spawn_blocking(move || engine.search(request)).await {
        Ok(outcome) => outcome,
        Err(err) => {
            error!(error = %err, "search task aborted");
            SearchOutcome::Failed(InternalError::Unhandled)
        }
    };
    SearchResponse(outcome).into_response()
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_request_empty_bodies() {
        for body in [&b""[..], b"  \n", b"null", b"{}", b"[]", b"\"\"", b"0", b"false"] {
            assert_eq!(parse_request(body).unwrap_err(), ValidationError::EmptyBody);
        }
    }

    #[test]
    fn test_parse_request_invalid_bodies() {
        let bodies =
            [&b"{"[..], b"[1,2]", b"\"text\"", b"7", b"true", br#"{"field": 5, "value": "x"}"#];
        for body in bodies {
            assert_eq!(parse_request(body).unwrap_err(), ValidationError::InvalidBody);
        }
    }

    #[test]
    fn test_parse_request_fields() {
        let request =
            parse_request(br#"{"field": "name", "value": "John", "role": "admin"}"#).unwrap();
        assert_eq!(request.field.as_deref(), Some("name"));
        assert_eq!(request.value.as_deref(), Some("John"));
        assert_eq!(request.role.as_deref(), Some("admin"));

        let request = parse_request(br#"{"field": "name"}"#).unwrap();
        assert_eq!(request.value, None);
        assert_eq!(request.role, None);
    }

    #[test]
    fn test_parse_request_non_string_role_is_not_admin() {
        for (body, role) in [
            (&br#"{"field": "name", "value": "x", "role": 1}"#[..], Some("1")),
            (br#"{"field": "name", "value": "x", "role": true}"#, Some("true")),
            (br#"{"field": "name", "value": "x", "role": ["admin"]}"#, Some("[\"admin\"]")),
            (br#"{"field": "name", "value": "x", "role": null}"#, None),
        ] {
            let request = parse_request(body).unwrap();
            assert_eq!(request.role.as_deref(), role);
            assert_eq!(request.validate().unwrap().role, blindvault::search::Role::User);
        }
    }
}
