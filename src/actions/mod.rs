pub mod flights;

pub use flights::*;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde_json::json;
use tracing::error;

/// JSON error body in the `{ "message": ... }` shape used by the 400/404
/// responses.
pub fn json_error(status: StatusCode, message: &str) -> impl IntoResponse {
    (status, Json(json!({ "message": message })))
}

/// Generic upstream-failure response. The error chain goes to the log; the
/// client gets a fixed body with no upstream detail.
pub fn fetch_failed(err: anyhow::Error) -> Response {
    error!("Failed to fetch flights data: {err:#}");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": "Failed to fetch flights data" })),
    )
        .into_response()
}
