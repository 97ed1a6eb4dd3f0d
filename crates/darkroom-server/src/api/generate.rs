// ABOUTME: Generation handler composing the prompt builder, the provider, and the store.
// ABOUTME: Builds prompt text from a frame's params, calls the provider, and persists the result.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::{Map, json};

use crate::api::{parse_id, store_error_response};
use crate::app_state::SharedState;

/// POST /api/shoots/{id}/frames/{frame_id}/generate - Generate a new
/// snapshot for a frame. The frame's existing snapshots are passed to the
/// provider as reference images so variants can build on earlier takes.
pub async fn generate_snapshot(
    State(state): State<SharedState>,
    Path((id, frame_id)): Path<(String, String)>,
) -> impl IntoResponse {
    let Some(provider) = state.provider.clone() else {
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "error": "no generation provider configured" })),
        )
            .into_response();
    };

    let (shoot_id, frame_id) = match (parse_id(&id), parse_id(&frame_id)) {
        (Ok(a), Ok(b)) => (a, b),
        (Err(resp), _) | (_, Err(resp)) => return resp,
    };

    let shoot = match state.store.get_shoot(shoot_id).await {
        Ok(shoot) => shoot,
        Err(e) => return store_error_response(e),
    };
    let Some(frame) = shoot.frame(frame_id) else {
        return (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": format!("frame not found: {}", frame_id) })),
        )
            .into_response();
    };

    let prompt = state.prompt_builder.build(&frame.params);
    if prompt.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "frame has no generation parameters" })),
        )
            .into_response();
    }

    let mut reference_images = Vec::new();
    for snapshot in &frame.snapshots {
        match state.store.get_blob(shoot_id, snapshot.id).await {
            Ok((bytes, _)) => reference_images.push(bytes),
            Err(e) => return store_error_response(e),
        }
    }

    let image = match provider.generate(&prompt, &reference_images).await {
        Ok(image) => image,
        Err(e) => {
            tracing::error!("generation failed for frame {}: {}", frame_id, e);
            return (
                StatusCode::BAD_GATEWAY,
                Json(json!({ "error": format!("generation failed: {}", e) })),
            )
                .into_response();
        }
    };

    let mut meta = Map::new();
    meta.insert("prompt".to_string(), json!(prompt));
    meta.insert("source".to_string(), json!("generated"));

    match state
        .store
        .add_snapshot(shoot_id, frame_id, image, meta)
        .await
    {
        Ok(snapshot) => (StatusCode::CREATED, Json(snapshot)).into_response(),
        Err(e) => store_error_response(e),
    }
}
