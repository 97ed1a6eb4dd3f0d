// ABOUTME: API module containing all HTTP handler functions for the darkroom REST API.
// ABOUTME: Organized into sub-modules for shoot CRUD, frame/snapshot mutation, images, and generation.

pub mod frames;
pub mod generate;
pub mod images;
pub mod shoots;

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use darkroom_store::StoreError;
use ulid::Ulid;

/// Map a store error onto the HTTP surface: the not-found family becomes
/// 404, rejected payloads 400, corrupt documents a distinct 500 message,
/// and everything else an opaque 500 (logged, not leaked).
pub(crate) fn store_error_response(err: StoreError) -> Response {
    let (status, message) = if err.is_not_found() {
        (StatusCode::NOT_FOUND, err.to_string())
    } else {
        match &err {
            StoreError::InvalidPayload { .. } => (StatusCode::BAD_REQUEST, err.to_string()),
            StoreError::CorruptDocument(_) => (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()),
            _ => {
                tracing::error!("store operation failed: {}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "storage operation failed".to_string(),
                )
            }
        }
    };

    (status, Json(serde_json::json!({ "error": message }))).into_response()
}

/// Parse a path segment as a ULID or answer 400.
pub(crate) fn parse_id(raw: &str) -> Result<Ulid, Response> {
    raw.parse::<Ulid>().map_err(|_| {
        (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({ "error": format!("invalid id: {}", raw) })),
        )
            .into_response()
    })
}
