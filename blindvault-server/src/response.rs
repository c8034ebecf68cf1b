//! Wire rendering of search outcomes.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use blindvault::search::{Disclosure, SearchOutcome};
use serde_json::{json, Value};

/// Message sent with every successful search.
pub const SUCCESS_MESSAGE: &str = "Search successful";

/// Message sent when no record matches.
pub const NOT_FOUND_MESSAGE: &str = "Data not found";

/// HTTP rendering of a [`SearchOutcome`].
#[derive(Debug)]
pub struct SearchResponse(pub SearchOutcome);

impl SearchResponse {
    /// Status code for the wrapped outcome.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match &self.0 {
            SearchOutcome::Found(_) => StatusCode::OK,
            SearchOutcome::NotFound => StatusCode::NOT_FOUND,
            SearchOutcome::Rejected(_) => StatusCode::BAD_REQUEST,
            SearchOutcome::Failed(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Status code and JSON body sent for the wrapped outcome.
    ///
    /// `data` is present only when the payload is disclosed.
    #[must_use]
    pub fn into_parts(self) -> (StatusCode, Value) {
        let status = self.status();
        let body = match self.0 {
            SearchOutcome::Found(Disclosure::Full(data)) => {
                json!({ "status": "ok", "message": SUCCESS_MESSAGE, "data": data })
            }
            SearchOutcome::Found(Disclosure::Redacted) => {
                json!({ "status": "ok", "message": SUCCESS_MESSAGE })
            }
            SearchOutcome::NotFound => {
                json!({ "status": "not_found", "message": NOT_FOUND_MESSAGE })
            }
            SearchOutcome::Rejected(reason) => json!({ "error": reason.to_string() }),
            SearchOutcome::Failed(kind) => json!({ "error": kind.message() }),
        };
        (status, body)
    }
}

impl IntoResponse for SearchResponse {
    fn into_response(self) -> Response {
        let (status, body) = self.into_parts();
        (status, Json(body)).into_response()
    }
}
