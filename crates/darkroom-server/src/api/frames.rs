// ABOUTME: Frame and snapshot mutation handlers — add/delete frames, upload/delete snapshots.
// ABOUTME: Snapshot uploads arrive base64-encoded in JSON and are validated by the store before any write.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::api::{parse_id, store_error_response};
use crate::app_state::SharedState;

/// Request body for adding a frame. The params bag is passed through to
/// the store opaquely.
#[derive(Debug, Deserialize)]
pub struct AddFrameRequest {
    #[serde(default)]
    pub params: Map<String, Value>,
}

/// Request body for uploading a snapshot image.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddSnapshotRequest {
    pub image_base64: String,
    #[serde(default)]
    pub meta: Map<String, Value>,
}

/// POST /api/shoots/{id}/frames - Add a frame to a shoot.
pub async fn add_frame(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    Json(req): Json<AddFrameRequest>,
) -> impl IntoResponse {
    let shoot_id = match parse_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    match state.store.add_frame(shoot_id, req.params).await {
        Ok(frame) => (StatusCode::CREATED, Json(frame)).into_response(),
        Err(e) => store_error_response(e),
    }
}

/// DELETE /api/shoots/{id}/frames/{frame_id} - Delete a frame and its snapshots.
pub async fn delete_frame(
    State(state): State<SharedState>,
    Path((id, frame_id)): Path<(String, String)>,
) -> impl IntoResponse {
    let (shoot_id, frame_id) = match (parse_id(&id), parse_id(&frame_id)) {
        (Ok(a), Ok(b)) => (a, b),
        (Err(resp), _) | (_, Err(resp)) => return resp,
    };

    match state.store.delete_frame(shoot_id, frame_id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => store_error_response(e),
    }
}

/// POST /api/shoots/{id}/frames/{frame_id}/snapshots - Upload an image as
/// a new snapshot.
pub async fn add_snapshot(
    State(state): State<SharedState>,
    Path((id, frame_id)): Path<(String, String)>,
    Json(req): Json<AddSnapshotRequest>,
) -> impl IntoResponse {
    let (shoot_id, frame_id) = match (parse_id(&id), parse_id(&frame_id)) {
        (Ok(a), Ok(b)) => (a, b),
        (Err(resp), _) | (_, Err(resp)) => return resp,
    };

    let bytes = match BASE64.decode(&req.image_base64) {
        Ok(bytes) => bytes,
        Err(e) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(serde_json::json!({ "error": format!("invalid base64 image: {}", e) })),
            )
                .into_response();
        }
    };

    match state
        .store
        .add_snapshot(shoot_id, frame_id, bytes, req.meta)
        .await
    {
        Ok(snapshot) => (StatusCode::CREATED, Json(snapshot)).into_response(),
        Err(e) => store_error_response(e),
    }
}

/// DELETE /api/shoots/{id}/frames/{frame_id}/snapshots/{snapshot_id} -
/// Delete a single snapshot and its blob.
pub async fn delete_snapshot(
    State(state): State<SharedState>,
    Path((id, frame_id, snapshot_id)): Path<(String, String, String)>,
) -> impl IntoResponse {
    let (shoot_id, frame_id, snapshot_id) =
        match (parse_id(&id), parse_id(&frame_id), parse_id(&snapshot_id)) {
            (Ok(a), Ok(b), Ok(c)) => (a, b, c),
            (Err(resp), _, _) | (_, Err(resp), _) | (_, _, Err(resp)) => return resp,
        };

    match state
        .store
        .delete_snapshot(shoot_id, frame_id, snapshot_id)
        .await
    {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => store_error_response(e),
    }
}
